use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::concept::ConceptId;
use super::enums::Sex;

/// One synthetic ICU patient (OMOP `person`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub person_id: i64,
    pub sex: Sex,
    pub gender_concept_id: ConceptId,
    pub birth_date: NaiveDate,
    pub race_concept_id: ConceptId,
    pub ethnicity_concept_id: ConceptId,
}

impl Person {
    /// Stable source identifier, e.g. `P00042`.
    pub fn source_value(&self) -> String {
        format!("P{:05}", self.person_id)
    }

    pub fn year_of_birth(&self) -> i32 {
        self.birth_date.year()
    }

    pub fn month_of_birth(&self) -> u32 {
        self.birth_date.month()
    }

    pub fn day_of_birth(&self) -> u32 {
        self.birth_date.day()
    }
}
