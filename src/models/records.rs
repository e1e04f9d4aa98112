use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::concept::ConceptId;

/// A diagnosis attached to an episode (OMOP `condition_occurrence`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionOccurrence {
    pub condition_occurrence_id: i64,
    pub person_id: i64,
    pub visit_occurrence_id: i64,
    pub concept_id: ConceptId,
    pub onset: NaiveDateTime,
    pub source_value: String,
}

/// A single timestamped reading: vital sign, lab result or ventilator setting
/// (OMOP `measurement`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub measurement_id: i64,
    pub person_id: i64,
    pub visit_occurrence_id: i64,
    pub concept_id: ConceptId,
    pub measured_at: NaiveDateTime,
    pub value: f64,
    pub unit_concept_id: ConceptId,
    pub unit: String,
    pub source_value: String,
}

/// A drug administration interval (OMOP `drug_exposure`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugExposure {
    pub drug_exposure_id: i64,
    pub person_id: i64,
    pub visit_occurrence_id: i64,
    pub concept_id: ConceptId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub source_value: String,
}

/// A point-in-time procedure (OMOP `procedure_occurrence`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureOccurrence {
    pub procedure_occurrence_id: i64,
    pub person_id: i64,
    pub visit_occurrence_id: i64,
    pub concept_id: ConceptId,
    pub performed_at: NaiveDateTime,
    pub source_value: String,
}
