use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT, DATE_FORMAT};
use crate::models::concept::well_known;
use crate::models::*;

pub fn insert_drug_exposures(
    conn: &Connection,
    exposures: &[DrugExposure],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO drug_exposure (drug_exposure_id, person_id, drug_concept_id,
             drug_exposure_start_date, drug_exposure_start_datetime, drug_exposure_end_date,
             drug_exposure_end_datetime, drug_type_concept_id, visit_occurrence_id,
             drug_source_value, drug_source_concept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)",
        )?;
        for exp in exposures {
            stmt.execute(params![
                exp.drug_exposure_id,
                exp.person_id,
                exp.concept_id,
                exp.start.format(DATE_FORMAT).to_string(),
                exp.start.format(DATETIME_FORMAT).to_string(),
                exp.end.format(DATE_FORMAT).to_string(),
                exp.end.format(DATETIME_FORMAT).to_string(),
                well_known::EHR_RECORD,
                exp.visit_occurrence_id,
                exp.source_value,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn get_drug_exposures_for_visit(
    conn: &Connection,
    visit_occurrence_id: i64,
) -> Result<Vec<DrugExposure>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT drug_exposure_id, person_id, visit_occurrence_id, drug_concept_id,
                drug_exposure_start_datetime, drug_exposure_end_datetime, drug_source_value
         FROM drug_exposure
         WHERE visit_occurrence_id = ?1
         ORDER BY drug_exposure_id",
    )?;
    let rows = stmt.query_map(params![visit_occurrence_id], |row| {
        Ok(DrugExposure {
            drug_exposure_id: row.get(0)?,
            person_id: row.get(1)?,
            visit_occurrence_id: row.get(2)?,
            concept_id: ConceptId(row.get(3)?),
            start: row.get::<_, chrono::NaiveDateTime>(4)?,
            end: row.get::<_, chrono::NaiveDateTime>(5)?,
            source_value: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::seed_episode;
    use crate::db::sqlite::open_memory_database;
    use chrono::Duration;

    #[test]
    fn insert_and_read_back() {
        let conn = open_memory_database().unwrap();
        let ep = seed_episode(&conn, 1, 4);
        insert_drug_exposures(
            &conn,
            &[DrugExposure {
                drug_exposure_id: 1,
                person_id: ep.person_id,
                visit_occurrence_id: ep.visit_occurrence_id,
                concept_id: ConceptId(753626),
                start: ep.start + Duration::hours(3),
                end: ep.end,
                source_value: "Propofol".into(),
            }],
        )
        .unwrap();

        let rows = get_drug_exposures_for_visit(&conn, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].start, ep.start + Duration::hours(3));
        assert_eq!(rows[0].end, ep.end);
        assert_eq!(rows[0].source_value, "Propofol");
    }
}
