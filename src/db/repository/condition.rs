use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT, DATE_FORMAT};
use crate::models::concept::well_known;
use crate::models::*;

pub fn insert_conditions(
    conn: &Connection,
    conditions: &[ConditionOccurrence],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO condition_occurrence (condition_occurrence_id, person_id,
             condition_concept_id, condition_start_date, condition_start_datetime,
             condition_type_concept_id, visit_occurrence_id, condition_source_value,
             condition_source_concept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
        )?;
        for cond in conditions {
            stmt.execute(params![
                cond.condition_occurrence_id,
                cond.person_id,
                cond.concept_id,
                cond.onset.format(DATE_FORMAT).to_string(),
                cond.onset.format(DATETIME_FORMAT).to_string(),
                well_known::EHR_RECORD,
                cond.visit_occurrence_id,
                cond.source_value,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn get_conditions_for_visit(
    conn: &Connection,
    visit_occurrence_id: i64,
) -> Result<Vec<ConditionOccurrence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT condition_occurrence_id, person_id, visit_occurrence_id, condition_concept_id,
                condition_start_datetime, condition_source_value
         FROM condition_occurrence
         WHERE visit_occurrence_id = ?1
         ORDER BY condition_occurrence_id",
    )?;
    let rows = stmt.query_map(params![visit_occurrence_id], |row| {
        Ok(ConditionOccurrence {
            condition_occurrence_id: row.get(0)?,
            person_id: row.get(1)?,
            visit_occurrence_id: row.get(2)?,
            concept_id: ConceptId(row.get(3)?),
            onset: row.get::<_, chrono::NaiveDateTime>(4)?,
            source_value: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
