use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::DischargeDisposition;

/// One inpatient ICU admission (OMOP `visit_occurrence`).
///
/// Every record generated for an episode is timestamped inside `[start, end]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub visit_occurrence_id: i64,
    pub person_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub los_days: u32,
    pub disposition: DischargeDisposition,
}

impl Episode {
    pub fn source_value(&self) -> String {
        format!("ICU-{}", self.visit_occurrence_id)
    }

    /// Whole hours between admission and discharge.
    pub fn duration_hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}
