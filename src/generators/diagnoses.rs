//! Episode diagnoses (OMOP `condition_occurrence`).

use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;

use super::panels::{InclusionSpec, CONDITIONS};
use super::{BatchLoader, GenerationContext, GenerationError, IdSequence, RecordSink};
use crate::models::{ConceptDomain, ConceptId, ConditionOccurrence, Episode};
use crate::resolver::VocabularySource;

/// How many diagnoses an episode wants before the inclusion filter.
pub const DESIRED_PER_EPISODE: RangeInclusive<usize> = 1..=3;

/// Attach a random subset of [`CONDITIONS`] to every episode.
///
/// Each condition passes an independent inclusion draw; up to the desired count
/// are then sampled without replacement. Onset is always the admission time.
pub fn generate_diagnoses<V, S>(
    ctx: &mut GenerationContext<V>,
    ids: &mut IdSequence,
    episodes: &[Episode],
    mut loader: BatchLoader<ConditionOccurrence, S>,
) -> Result<usize, GenerationError>
where
    V: VocabularySource,
    S: RecordSink<ConditionOccurrence>,
{
    let panel = ctx.resolve_panel(CONDITIONS, ConceptDomain::Condition, |c| c.search_term)?;

    for episode in episodes {
        let desired = ctx.rng.gen_range(DESIRED_PER_EPISODE);
        let eligible: Vec<&(ConceptId, &InclusionSpec)> = panel
            .iter()
            .filter(|(_, spec)| ctx.rng.gen_bool(spec.probability))
            .collect();
        if eligible.is_empty() {
            continue;
        }

        let take = desired.min(eligible.len());
        let chosen: Vec<_> = eligible
            .choose_multiple(&mut ctx.rng, take)
            .copied()
            .collect();
        for &(concept_id, spec) in chosen {
            if !concept_id.is_resolved() {
                continue;
            }
            loader.push(ConditionOccurrence {
                condition_occurrence_id: ids.next_id(),
                person_id: episode.person_id,
                visit_occurrence_id: episode.visit_occurrence_id,
                concept_id,
                onset: episode.start,
                source_value: spec.display_name.to_string(),
            })?;
        }
    }

    let written = loader.finish()?;
    tracing::info!(written, "Created diagnoses");
    Ok(written)
}
