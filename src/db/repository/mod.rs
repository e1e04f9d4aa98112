//! Repository layer: table-scoped database operations.
//!
//! Every insert function writes its whole slice inside one transaction, so a
//! call is one flush of the batch loader.

mod condition;
mod drug_exposure;
mod measurement;
mod person;
mod procedure;
mod summary;
mod visit;

use rusqlite::Connection;

use super::DatabaseError;

pub use condition::*;
pub use drug_exposure::*;
pub use measurement::*;
pub use person::*;
pub use procedure::*;
pub use summary::*;
pub use visit::*;

/// Writable OMOP tables populated by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicalTable {
    Person,
    VisitOccurrence,
    ConditionOccurrence,
    Measurement,
    DrugExposure,
    ProcedureOccurrence,
}

impl ClinicalTable {
    /// Parents first: the order rows are generated in.
    pub const ALL: [ClinicalTable; 6] = [
        ClinicalTable::Person,
        ClinicalTable::VisitOccurrence,
        ClinicalTable::ConditionOccurrence,
        ClinicalTable::Measurement,
        ClinicalTable::DrugExposure,
        ClinicalTable::ProcedureOccurrence,
    ];

    /// Children first: the order rows are cleared in.
    pub const CLEAR_ORDER: [ClinicalTable; 6] = [
        ClinicalTable::DrugExposure,
        ClinicalTable::ProcedureOccurrence,
        ClinicalTable::Measurement,
        ClinicalTable::ConditionOccurrence,
        ClinicalTable::VisitOccurrence,
        ClinicalTable::Person,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            ClinicalTable::Person => "person",
            ClinicalTable::VisitOccurrence => "visit_occurrence",
            ClinicalTable::ConditionOccurrence => "condition_occurrence",
            ClinicalTable::Measurement => "measurement",
            ClinicalTable::DrugExposure => "drug_exposure",
            ClinicalTable::ProcedureOccurrence => "procedure_occurrence",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            ClinicalTable::Person => "person_id",
            ClinicalTable::VisitOccurrence => "visit_occurrence_id",
            ClinicalTable::ConditionOccurrence => "condition_occurrence_id",
            ClinicalTable::Measurement => "measurement_id",
            ClinicalTable::DrugExposure => "drug_exposure_id",
            ClinicalTable::ProcedureOccurrence => "procedure_occurrence_id",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ClinicalTable::Person => "patient demographics",
            ClinicalTable::VisitOccurrence => "ICU admissions",
            ClinicalTable::ConditionOccurrence => "diagnoses",
            ClinicalTable::Measurement => "vital signs + labs + ventilation",
            ClinicalTable::DrugExposure => "medications",
            ClinicalTable::ProcedureOccurrence => "procedures",
        }
    }
}

/// Count all rows of a table.
///
/// `table` must be a schema-defined name, never user input.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(count)
}

/// Highest stored identifier of a clinical table, 0 when empty.
pub fn max_id(conn: &Connection, table: ClinicalTable) -> Result<i64, DatabaseError> {
    let max = conn.query_row(
        &format!(
            "SELECT COALESCE(MAX({}), 0) FROM {}",
            table.id_column(),
            table.table_name()
        ),
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(max)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, NaiveDate};
    use rusqlite::Connection;

    use super::{insert_episodes, insert_persons};
    use crate::models::concept::well_known;
    use crate::models::*;

    /// Episode `id` for person `id`, `days` long, starting 2024-06-01 00:00.
    pub(crate) fn episode_at(id: i64, days: u32) -> Episode {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Episode {
            visit_occurrence_id: id,
            person_id: id,
            start,
            end: start + Duration::days(days as i64),
            los_days: days,
            disposition: DischargeDisposition::Alive,
        }
    }

    /// Insert one patient with one episode of `days` days starting 2024-06-01.
    pub(crate) fn seed_episode(conn: &Connection, id: i64, days: u32) -> Episode {
        insert_persons(
            conn,
            &[Person {
                person_id: id,
                sex: Sex::Male,
                gender_concept_id: ConceptId(8507),
                birth_date: NaiveDate::from_ymd_opt(1955, 2, 14).unwrap(),
                race_concept_id: well_known::RACE_WHITE,
                ethnicity_concept_id: well_known::ETHNICITY_UNKNOWN,
            }],
        )
        .unwrap();
        let episode = episode_at(id, days);
        insert_episodes(conn, std::slice::from_ref(&episode)).unwrap();
        episode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn max_id_of_empty_table_is_zero() {
        let conn = open_memory_database().unwrap();
        for table in ClinicalTable::ALL {
            assert_eq!(max_id(&conn, table).unwrap(), 0, "{}", table.table_name());
        }
    }

    #[test]
    fn max_id_tracks_highest_row() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO person (person_id, gender_concept_id, year_of_birth,
                                 race_concept_id, ethnicity_concept_id)
             VALUES (3, 8507, 1970, 8527, 0), (11, 8532, 1980, 8552, 0);",
        )
        .unwrap();
        assert_eq!(max_id(&conn, ClinicalTable::Person).unwrap(), 11);
        assert_eq!(count_rows(&conn, "person").unwrap(), 2);
    }

    #[test]
    fn clear_order_is_reverse_of_generation_order_for_parents() {
        assert_eq!(ClinicalTable::ALL[0], ClinicalTable::Person);
        assert_eq!(ClinicalTable::CLEAR_ORDER[5], ClinicalTable::Person);
        assert_eq!(ClinicalTable::CLEAR_ORDER[4], ClinicalTable::VisitOccurrence);
    }
}
