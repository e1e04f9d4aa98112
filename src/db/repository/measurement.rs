use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT, DATE_FORMAT};
use crate::models::concept::well_known;
use crate::models::*;

/// Insert a batch of measurements in one transaction.
pub fn insert_measurements(
    conn: &Connection,
    measurements: &[Measurement],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO measurement (measurement_id, person_id, measurement_concept_id,
             measurement_date, measurement_datetime, measurement_type_concept_id,
             value_as_number, value_as_concept_id, unit_concept_id, visit_occurrence_id,
             measurement_source_value, measurement_source_concept_id, unit_source_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, 0, ?11)",
        )?;
        for m in measurements {
            stmt.execute(params![
                m.measurement_id,
                m.person_id,
                m.concept_id,
                m.measured_at.format(DATE_FORMAT).to_string(),
                m.measured_at.format(DATETIME_FORMAT).to_string(),
                well_known::EHR_RECORD,
                m.value,
                m.unit_concept_id,
                m.visit_occurrence_id,
                m.source_value,
                m.unit,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Measurements of one episode ordered by id.
#[cfg(test)]
pub(crate) fn get_measurements_for_visit(
    conn: &Connection,
    visit_occurrence_id: i64,
) -> Result<Vec<Measurement>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT measurement_id, person_id, visit_occurrence_id, measurement_concept_id,
                measurement_datetime, value_as_number, unit_concept_id, unit_source_value,
                measurement_source_value
         FROM measurement
         WHERE visit_occurrence_id = ?1
         ORDER BY measurement_id",
    )?;
    let rows = stmt.query_map(params![visit_occurrence_id], |row| {
        Ok(Measurement {
            measurement_id: row.get(0)?,
            person_id: row.get(1)?,
            visit_occurrence_id: row.get(2)?,
            concept_id: ConceptId(row.get(3)?),
            measured_at: row.get::<_, chrono::NaiveDateTime>(4)?,
            value: row.get(5)?,
            unit_concept_id: ConceptId(row.get::<_, Option<i64>>(6)?.unwrap_or(0)),
            unit: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            source_value: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
