use rusqlite::types::{ToSql, ToSqlOutput};
use serde::{Deserialize, Serialize};

/// Identifier of a standardized vocabulary entry.
///
/// Zero is reserved: it is what the resolver hands back when a term cannot be
/// matched, and it must never be written as a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(pub i64);

impl ConceptId {
    pub const UNRESOLVED: ConceptId = ConceptId(0);

    pub fn is_resolved(self) -> bool {
        self != Self::UNRESOLVED
    }

    /// `None` for the sentinel, the id otherwise.
    pub fn resolved(self) -> Option<ConceptId> {
        self.is_resolved().then_some(self)
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for ConceptId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

/// Fixed OMOP concept ids written without a vocabulary lookup.
pub mod well_known {
    use super::ConceptId;

    pub const INPATIENT_VISIT: ConceptId = ConceptId(9201);
    pub const EHR_RECORD: ConceptId = ConceptId(32817);
    pub const DISCHARGED_ALIVE: ConceptId = ConceptId(32826);
    pub const PATIENT_DIED: ConceptId = ConceptId(32767);
    pub const RACE_WHITE: ConceptId = ConceptId(8527);
    pub const RACE_UNKNOWN: ConceptId = ConceptId(8552);
    /// OMOP "No matching concept", used for unrecorded ethnicity.
    pub const ETHNICITY_UNKNOWN: ConceptId = ConceptId(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_not_resolved() {
        assert!(!ConceptId::UNRESOLVED.is_resolved());
        assert_eq!(ConceptId::UNRESOLVED.resolved(), None);
    }

    #[test]
    fn real_id_is_resolved() {
        assert!(ConceptId(8507).is_resolved());
        assert_eq!(ConceptId(8507).resolved(), Some(ConceptId(8507)));
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&ConceptId(3027018)).unwrap(), "3027018");
    }
}
