//! Table-population routines, one module per clinical domain.
//!
//! Phases run strictly in order (demographics, admissions, then every
//! episode-scoped generator) and share one seeded RNG and one concept
//! resolver through [`GenerationContext`].

pub mod admissions;
pub mod demographics;
pub mod diagnoses;
pub mod error;
pub mod loader;
pub mod measurements;
pub mod panels;
pub mod treatments;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::models::{ConceptDomain, ConceptId};
use crate::resolver::{ConceptResolver, VocabularySource};

pub use error::GenerationError;
pub use loader::{BatchLoader, RecordSink, SqliteSink};

/// State shared by every phase of one run.
pub struct GenerationContext<V> {
    pub rng: ChaCha8Rng,
    pub resolver: ConceptResolver<V>,
}

impl<V: VocabularySource> GenerationContext<V> {
    pub fn new(seed: u64, source: V) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            resolver: ConceptResolver::new(source),
        }
    }

    /// Resolve each entry's search term within `domain`, keeping panel order.
    /// Unresolved entries carry [`ConceptId::UNRESOLVED`] and are skipped by callers.
    pub(crate) fn resolve_panel<'p, E>(
        &mut self,
        entries: &'p [E],
        domain: ConceptDomain,
        search_term: impl Fn(&E) -> &str,
    ) -> Result<Vec<(ConceptId, &'p E)>, GenerationError> {
        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = self.resolver.resolve_by_name(search_term(entry), Some(domain))?;
            resolved.push((id, entry));
        }
        Ok(resolved)
    }
}

/// Monotonic identifier source for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    next: i64,
}

impl IdSequence {
    /// Sequence whose first id follows `last`, the current stored maximum.
    pub fn after(last: i64) -> Self {
        Self { next: last + 1 }
    }

    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Id the next call to [`next_id`](Self::next_id) will hand out.
    #[cfg(test)]
    pub(crate) fn peek(&self) -> i64 {
        self.next
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
