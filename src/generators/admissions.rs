//! ICU admissions (OMOP `visit_occurrence`), one per patient.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

use super::{BatchLoader, GenerationContext, GenerationError, IdSequence, RecordSink};
use crate::models::{DischargeDisposition, Episode, Person};
use crate::resolver::VocabularySource;

/// Admissions fall on midnight of a day up to this many days after 2024-01-01.
pub const WINDOW_DAYS: i64 = 365;
pub const MEAN_STAY_DAYS: f64 = 5.0;
pub const MAX_STAY_DAYS: u32 = 21;
pub const ALIVE_PROBABILITY: f64 = 0.9;

fn window_start() -> Result<NaiveDateTime, GenerationError> {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| GenerationError::InvalidTimestamp("admission window start".into()))
}

/// floor(Exp(mean)) + 1, capped at [`MAX_STAY_DAYS`].
pub(crate) fn sample_stay_days<R: Rng>(rng: &mut R) -> u32 {
    // Inverse CDF; `gen` yields [0, 1) so the logarithm stays finite.
    let u: f64 = rng.gen();
    let draw = -MEAN_STAY_DAYS * (1.0 - u).ln();
    let days = draw.floor().min(f64::from(MAX_STAY_DAYS)) as u32 + 1;
    days.min(MAX_STAY_DAYS)
}

/// Emit one episode per patient. The returned list feeds every later phase.
pub fn generate_admissions<V, S>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    persons: &[Person],
    mut loader: BatchLoader<Episode, S>,
) -> Result<Vec<Episode>, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<Episode>,
{
    let base = window_start()?;
    let mut episodes = Vec::with_capacity(persons.len());

    for person in persons {
        let start = base + Duration::days(ctx.rng.gen_range(0..=WINDOW_DAYS));
        let los_days = sample_stay_days(&mut ctx.rng);
        let end = start + Duration::days(i64::from(los_days));
        let disposition = if ctx.rng.gen_bool(ALIVE_PROBABILITY) {
            DischargeDisposition::Alive
        } else {
            DischargeDisposition::Deceased
        };

        let episode = Episode {
            visit_occurrence_id: ids.next_id(),
            person_id: person.person_id,
            start,
            end,
            los_days,
            disposition,
        };
        loader.push(episode.clone())?;
        episodes.push(episode);
    }

    let written = loader.finish()?;
    let deceased = episodes
        .iter()
        .filter(|e| e.disposition == DischargeDisposition::Deceased)
        .count();
    tracing::info!(written, deceased, "Created ICU admissions");
    Ok(episodes)
}
