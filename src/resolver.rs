//! Concept resolution: human-readable clinical terms to vocabulary ids.
//!
//! The resolver owns its cache, so every generator in a run shares one
//! instance and tests can swap in a fake [`VocabularySource`].

use std::collections::HashMap;

use crate::db::DatabaseError;
use crate::models::{ConceptDomain, ConceptId};

/// Lookups against a standardized vocabulary.
///
/// Both methods return `Ok(None)` for "no such concept"; `Err` is reserved for
/// storage failures.
pub trait VocabularySource {
    /// Exact code lookup, non-deprecated entries only.
    fn find_by_code(&self, code: &str, vocabulary: &str)
        -> Result<Option<ConceptId>, DatabaseError>;

    /// Case-insensitive substring search over standard, valid concepts.
    fn search_by_name(
        &self,
        term: &str,
        domain: Option<ConceptDomain>,
    ) -> Result<Option<ConceptId>, DatabaseError>;
}

/// Caching front for a [`VocabularySource`].
///
/// Hits are cached for the resolver's lifetime. Misses are not, so a term that
/// failed once is looked up (and warned about) again.
pub struct ConceptResolver<V> {
    source: V,
    by_code: HashMap<(String, String), ConceptId>,
    by_name: HashMap<(String, Option<ConceptDomain>), ConceptId>,
}

impl<V: VocabularySource> ConceptResolver<V> {
    pub fn new(source: V) -> Self {
        Self {
            source,
            by_code: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Resolve an exact `(vocabulary, code)` pair.
    ///
    /// Returns [`ConceptId::UNRESOLVED`] when nothing matches.
    pub fn resolve_by_code(
        &mut self,
        code: &str,
        vocabulary: &str,
    ) -> Result<ConceptId, DatabaseError> {
        let key = (vocabulary.to_string(), code.to_string());
        if let Some(id) = self.by_code.get(&key) {
            return Ok(*id);
        }

        match self.source.find_by_code(code, vocabulary)? {
            Some(id) => {
                self.by_code.insert(key, id);
                Ok(id)
            }
            None => {
                tracing::warn!(code, vocabulary, "Concept not found");
                Ok(ConceptId::UNRESOLVED)
            }
        }
    }

    /// Resolve the first standard concept whose name contains `term`.
    ///
    /// Returns [`ConceptId::UNRESOLVED`] when nothing matches.
    pub fn resolve_by_name(
        &mut self,
        term: &str,
        domain: Option<ConceptDomain>,
    ) -> Result<ConceptId, DatabaseError> {
        let key = (term.to_lowercase(), domain);
        if let Some(id) = self.by_name.get(&key) {
            return Ok(*id);
        }

        match self.source.search_by_name(term, domain)? {
            Some(id) => {
                self.by_name.insert(key, id);
                Ok(id)
            }
            None => {
                tracing::warn!(
                    term,
                    domain = domain.map(|d| d.as_str()),
                    "No concept matches search term"
                );
                Ok(ConceptId::UNRESOLVED)
            }
        }
    }

    /// Number of cached resolutions.
    pub fn cached(&self) -> usize {
        self.by_code.len() + self.by_name.len()
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &V {
        &self.source
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;

    /// In-memory vocabulary that counts how often it is queried.
    #[derive(Default)]
    pub(crate) struct FakeVocabulary {
        pub codes: HashMap<(String, String), i64>,
        pub names: Vec<(String, ConceptDomain, i64)>,
        pub queries: Cell<usize>,
    }

    impl FakeVocabulary {
        pub(crate) fn with_code(mut self, vocabulary: &str, code: &str, id: i64) -> Self {
            self.codes.insert((vocabulary.into(), code.into()), id);
            self
        }

        pub(crate) fn with_name(mut self, name: &str, domain: ConceptDomain, id: i64) -> Self {
            self.names.push((name.into(), domain, id));
            self
        }
    }

    impl VocabularySource for FakeVocabulary {
        fn find_by_code(
            &self,
            code: &str,
            vocabulary: &str,
        ) -> Result<Option<ConceptId>, DatabaseError> {
            self.queries.set(self.queries.get() + 1);
            Ok(self
                .codes
                .get(&(vocabulary.to_string(), code.to_string()))
                .map(|id| ConceptId(*id)))
        }

        fn search_by_name(
            &self,
            term: &str,
            domain: Option<ConceptDomain>,
        ) -> Result<Option<ConceptId>, DatabaseError> {
            self.queries.set(self.queries.get() + 1);
            let term = term.to_lowercase();
            Ok(self
                .names
                .iter()
                .find(|(name, d, _)| {
                    name.to_lowercase().contains(&term) && domain.map_or(true, |want| want == *d)
                })
                .map(|(_, _, id)| ConceptId(*id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::FakeVocabulary;
    use super::*;

    #[test]
    fn known_code_is_stable_and_cached() {
        let mut resolver = ConceptResolver::new(FakeVocabulary::default().with_code("Gender", "M", 8507));

        let first = resolver.resolve_by_code("M", "Gender").unwrap();
        let second = resolver.resolve_by_code("M", "Gender").unwrap();

        assert_eq!(first, ConceptId(8507));
        assert_eq!(first, second);
        assert_eq!(resolver.source().queries.get(), 1);
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn unknown_code_returns_sentinel_every_time() {
        let mut resolver = ConceptResolver::new(FakeVocabulary::default());

        assert_eq!(resolver.resolve_by_code("X", "Gender").unwrap(), ConceptId::UNRESOLVED);
        assert_eq!(resolver.resolve_by_code("X", "Gender").unwrap(), ConceptId::UNRESOLVED);
        assert_eq!(resolver.source().queries.get(), 2);
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn code_cache_is_keyed_by_vocabulary() {
        let mut resolver = ConceptResolver::new(
            FakeVocabulary::default()
                .with_code("Gender", "M", 8507)
                .with_code("Other", "M", 99),
        );
        assert_eq!(resolver.resolve_by_code("M", "Gender").unwrap(), ConceptId(8507));
        assert_eq!(resolver.resolve_by_code("M", "Other").unwrap(), ConceptId(99));
    }

    #[test]
    fn name_lookup_is_cached_case_insensitively() {
        let mut resolver = ConceptResolver::new(
            FakeVocabulary::default().with_name("Heart rate", ConceptDomain::Measurement, 3027018),
        );

        let a = resolver
            .resolve_by_name("heart rate", Some(ConceptDomain::Measurement))
            .unwrap();
        let b = resolver
            .resolve_by_name("HEART RATE", Some(ConceptDomain::Measurement))
            .unwrap();

        assert_eq!(a, ConceptId(3027018));
        assert_eq!(a, b);
        assert_eq!(resolver.source().queries.get(), 1);
    }

    #[test]
    fn name_lookup_honours_domain() {
        let mut resolver = ConceptResolver::new(
            FakeVocabulary::default().with_name("Mechanical ventilation", ConceptDomain::Procedure, 4230167),
        );
        assert_eq!(
            resolver
                .resolve_by_name("mechanical ventilation", Some(ConceptDomain::Measurement))
                .unwrap(),
            ConceptId::UNRESOLVED
        );
        assert_eq!(
            resolver.resolve_by_name("mechanical ventilation", None).unwrap(),
            ConceptId(4230167)
        );
    }
}
