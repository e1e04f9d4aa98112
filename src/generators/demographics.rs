//! Patient demographics (OMOP `person`).

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use rand::Rng;

use super::{BatchLoader, GenerationContext, GenerationError, IdSequence, RecordSink};
use crate::models::concept::well_known;
use crate::models::{ConceptId, Person, Sex};
use crate::resolver::VocabularySource;

pub const BIRTH_YEARS: RangeInclusive<i32> = 1940..=2005;
/// Days stop at 28 so every month is valid; later days are never drawn.
pub const BIRTH_DAYS: RangeInclusive<u32> = 1..=28;
pub const WHITE_RACE_PROBABILITY: f64 = 0.7;

/// Emit `count` patients, written with a single bulk insert.
///
/// Fails with [`GenerationError::IncompleteVocabulary`] when either gender
/// code is missing from the vocabulary.
pub fn generate_patients<V, S>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    count: usize,
    mut loader: BatchLoader<Person, S>,
) -> Result<Vec<Person>, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<Person>,
{
    let male = required_gender(ctx, Sex::Male)?;
    let female = required_gender(ctx, Sex::Female)?;

    let mut persons = Vec::with_capacity(count);
    for _ in 0..count {
        let sex = Sex::ALL[ctx.rng.gen_range(0..Sex::ALL.len())];
        let year = ctx.rng.gen_range(BIRTH_YEARS);
        let month = ctx.rng.gen_range(1..=12);
        let day = ctx.rng.gen_range(BIRTH_DAYS);
        let birth_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            GenerationError::InvalidTimestamp(format!("birth date {year}-{month}-{day}"))
        })?;
        let race_concept_id = if ctx.rng.gen_bool(WHITE_RACE_PROBABILITY) {
            well_known::RACE_WHITE
        } else {
            well_known::RACE_UNKNOWN
        };

        let person = Person {
            person_id: ids.next_id(),
            sex,
            gender_concept_id: match sex {
                Sex::Male => male,
                Sex::Female => female,
            },
            birth_date,
            race_concept_id,
            ethnicity_concept_id: well_known::ETHNICITY_UNKNOWN,
        };
        loader.push(person.clone())?;
        persons.push(person);
    }

    let written = loader.finish()?;
    tracing::info!(written, "Created patients");
    Ok(persons)
}

fn required_gender<V: VocabularySource>(
    ctx: &mut GenerationContext<V>,
    sex: Sex,
) -> Result<ConceptId, GenerationError> {
    let id = ctx.resolver.resolve_by_code(sex.as_str(), Sex::VOCABULARY)?;
    id.resolved()
        .ok_or_else(|| GenerationError::IncompleteVocabulary {
            code: sex.as_str().into(),
            vocabulary: Sex::VOCABULARY.into(),
        })
}
