//! Vital signs, laboratory results and ventilator settings (OMOP `measurement`).
//!
//! All three categories share one generator driven by a [`MeasurementPanel`];
//! only the schedule and the set of episodes differ.

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use super::panels::{MeasurementPanel, Schedule};
use super::{round2, BatchLoader, GenerationContext, GenerationError, IdSequence, RecordSink};
use crate::models::{ConceptDomain, Episode, Measurement};
use crate::resolver::VocabularySource;

/// Reading times for `episode` under `schedule`, all inside the episode window.
pub fn reading_times(episode: &Episode, schedule: Schedule) -> Vec<NaiveDateTime> {
    match schedule {
        Schedule::Hourly => (0..episode.duration_hours())
            .map(|hour| episode.start + Duration::hours(hour))
            .collect(),
        Schedule::DailyAt { hour_offset } => (0..i64::from(episode.los_days))
            .map(|day| episode.start + Duration::days(day) + Duration::hours(hour_offset))
            .filter(|at| episode.contains(*at))
            .collect(),
    }
}

/// Exactly `round(len * fraction)` episodes, sampled without replacement.
pub fn select_ventilated<'e, R: Rng>(
    rng: &mut R,
    episodes: &'e [Episode],
    fraction: f64,
) -> Vec<&'e Episode> {
    let count = ((episodes.len() as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
    episodes
        .choose_multiple(rng, count.min(episodes.len()))
        .collect()
}

/// Generate one panel's readings for each episode in `episodes`.
///
/// Every value is uniform in the entry's `[low, high]` range, rounded to two
/// decimals. Entries whose concept did not resolve produce nothing.
pub fn generate_measurements<'e, V, S, I>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    panel: &MeasurementPanel,
    episodes: I,
    mut loader: BatchLoader<Measurement, S>,
) -> Result<usize, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<Measurement>,
    I: IntoIterator<Item = &'e Episode>,
{
    let entries = ctx.resolve_panel(panel.entries, ConceptDomain::Measurement, |m| m.search_term)?;
    let resolved: Vec<_> = entries
        .into_iter()
        .filter(|(id, _)| id.is_resolved())
        .collect();

    let mut episode_count = 0usize;
    for episode in episodes {
        episode_count += 1;
        for at in reading_times(episode, panel.schedule) {
            for &(concept_id, spec) in &resolved {
                let value = round2(ctx.rng.gen_range(spec.low..=spec.high));
                loader.push(Measurement {
                    measurement_id: ids.next_id(),
                    person_id: episode.person_id,
                    visit_occurrence_id: episode.visit_occurrence_id,
                    concept_id,
                    measured_at: at,
                    value,
                    unit_concept_id: spec.unit_concept_id,
                    unit: spec.unit.to_string(),
                    source_value: spec.display_name.to_string(),
                })?;
            }
        }
    }

    let written = loader.finish()?;
    tracing::info!(
        category = panel.category.as_str(),
        episodes = episode_count,
        written,
        "Created {}",
        panel.category.label()
    );
    Ok(written)
}
