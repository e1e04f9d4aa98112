//! Medications (OMOP `drug_exposure`) and procedures (OMOP `procedure_occurrence`).

use std::ops::Range;

use chrono::Duration;
use rand::Rng;

use super::panels::{MEDICATIONS, PROCEDURES};
use super::{BatchLoader, GenerationContext, GenerationError, IdSequence, RecordSink};
use crate::models::{ConceptDomain, DrugExposure, Episode, ProcedureOccurrence};
use crate::resolver::VocabularySource;

/// Hours after admission a drug may start.
pub const DRUG_START_OFFSET_HOURS: Range<i64> = 0..12;
pub const MIN_DRUG_DURATION_HOURS: i64 = 24;
/// Hours after admission a procedure may be performed.
pub const PROCEDURE_OFFSET_HOURS: Range<i64> = 0..24;

/// Include each drug per episode with its own probability.
///
/// Duration is drawn from `[24, episode hours]` and the interval is clipped to
/// the discharge time.
pub fn generate_medications<V, S>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    episodes: &[Episode],
    mut loader: BatchLoader<DrugExposure, S>,
) -> Result<usize, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<DrugExposure>,
{
    let panel = ctx.resolve_panel(MEDICATIONS, ConceptDomain::Drug, |d| d.search_term)?;

    for episode in episodes {
        let longest = episode.duration_hours().max(MIN_DRUG_DURATION_HOURS);
        for &(concept_id, spec) in &panel {
            if !concept_id.is_resolved() || !ctx.rng.gen_bool(spec.probability) {
                continue;
            }
            let start = episode.start + Duration::hours(ctx.rng.gen_range(DRUG_START_OFFSET_HOURS));
            let duration = Duration::hours(ctx.rng.gen_range(MIN_DRUG_DURATION_HOURS..=longest));
            let end = (start + duration).min(episode.end);

            loader.push(DrugExposure {
                drug_exposure_id: ids.next_id(),
                person_id: episode.person_id,
                visit_occurrence_id: episode.visit_occurrence_id,
                concept_id,
                start,
                end,
                source_value: spec.display_name.to_string(),
            })?;
        }
    }

    let written = loader.finish()?;
    tracing::info!(written, "Created medication exposures");
    Ok(written)
}

/// Include each procedure per episode with its own probability, at a single
/// time within the first day.
pub fn generate_procedures<V, S>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    episodes: &[Episode],
    mut loader: BatchLoader<ProcedureOccurrence, S>,
) -> Result<usize, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<ProcedureOccurrence>,
{
    let panel = ctx.resolve_panel(PROCEDURES, ConceptDomain::Procedure, |p| p.search_term)?;

    for episode in episodes {
        for &(concept_id, spec) in &panel {
            if !concept_id.is_resolved() || !ctx.rng.gen_bool(spec.probability) {
                continue;
            }
            let performed_at =
                episode.start + Duration::hours(ctx.rng.gen_range(PROCEDURE_OFFSET_HOURS));

            loader.push(ProcedureOccurrence {
                procedure_occurrence_id: ids.next_id(),
                person_id: episode.person_id,
                visit_occurrence_id: episode.visit_occurrence_id,
                concept_id,
                performed_at,
                source_value: spec.display_name.to_string(),
            })?;
        }
    }

    let written = loader.finish()?;
    tracing::info!(written, "Created procedures");
    Ok(written)
}
