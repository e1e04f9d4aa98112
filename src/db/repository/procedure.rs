use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT, DATE_FORMAT};
use crate::models::concept::well_known;
use crate::models::*;

pub fn insert_procedures(
    conn: &Connection,
    procedures: &[ProcedureOccurrence],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO procedure_occurrence (procedure_occurrence_id, person_id,
             procedure_concept_id, procedure_date, procedure_datetime,
             procedure_type_concept_id, visit_occurrence_id, procedure_source_value,
             procedure_source_concept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
        )?;
        for proc in procedures {
            stmt.execute(params![
                proc.procedure_occurrence_id,
                proc.person_id,
                proc.concept_id,
                proc.performed_at.format(DATE_FORMAT).to_string(),
                proc.performed_at.format(DATETIME_FORMAT).to_string(),
                well_known::EHR_RECORD,
                proc.visit_occurrence_id,
                proc.source_value,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn get_procedures_for_visit(
    conn: &Connection,
    visit_occurrence_id: i64,
) -> Result<Vec<ProcedureOccurrence>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT procedure_occurrence_id, person_id, visit_occurrence_id, procedure_concept_id,
                procedure_datetime, procedure_source_value
         FROM procedure_occurrence
         WHERE visit_occurrence_id = ?1
         ORDER BY procedure_occurrence_id",
    )?;
    let rows = stmt.query_map(params![visit_occurrence_id], |row| {
        Ok(ProcedureOccurrence {
            procedure_occurrence_id: row.get(0)?,
            person_id: row.get(1)?,
            visit_occurrence_id: row.get(2)?,
            concept_id: ConceptId(row.get(3)?),
            performed_at: row.get::<_, chrono::NaiveDateTime>(4)?,
            source_value: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
