use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT, DATE_FORMAT};
use crate::models::concept::well_known;
use crate::models::*;

/// Insert a batch of ICU episodes in one transaction.
pub fn insert_episodes(conn: &Connection, episodes: &[Episode]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO visit_occurrence (visit_occurrence_id, person_id, visit_concept_id,
             visit_start_date, visit_start_datetime, visit_end_date, visit_end_datetime,
             visit_type_concept_id, visit_source_value, visit_source_concept_id,
             admitted_from_concept_id, discharged_to_concept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 0, ?10)",
        )?;
        for ep in episodes {
            stmt.execute(params![
                ep.visit_occurrence_id,
                ep.person_id,
                well_known::INPATIENT_VISIT,
                ep.start.format(DATE_FORMAT).to_string(),
                ep.start.format(DATETIME_FORMAT).to_string(),
                ep.end.format(DATE_FORMAT).to_string(),
                ep.end.format(DATETIME_FORMAT).to_string(),
                well_known::EHR_RECORD,
                ep.source_value(),
                ep.disposition.concept_id(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// All episodes ordered by id.
#[cfg(test)]
pub(crate) fn get_episodes(conn: &Connection) -> Result<Vec<Episode>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT visit_occurrence_id, person_id, visit_start_datetime, visit_end_datetime,
                discharged_to_concept_id
         FROM visit_occurrence ORDER BY visit_occurrence_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, chrono::NaiveDateTime>(2)?,
            row.get::<_, chrono::NaiveDateTime>(3)?,
            row.get::<_, Option<i64>>(4)?,
        ))
    })?;

    let mut episodes = Vec::new();
    for row in rows {
        let (visit_occurrence_id, person_id, start, end, discharged_to) = row?;
        let disposition = if discharged_to == Some(well_known::PATIENT_DIED.0) {
            DischargeDisposition::Deceased
        } else {
            DischargeDisposition::Alive
        };
        episodes.push(Episode {
            visit_occurrence_id,
            person_id,
            start,
            end,
            los_days: (end - start).num_days().max(0) as u32,
            disposition,
        });
    }
    Ok(episodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_persons;
    use crate::db::sqlite::open_memory_database;
    use chrono::{Duration, NaiveDate};

    fn seed_person(conn: &Connection) {
        insert_persons(
            conn,
            &[Person {
                person_id: 1,
                sex: Sex::Male,
                gender_concept_id: ConceptId(8507),
                birth_date: NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
                race_concept_id: well_known::RACE_UNKNOWN,
                ethnicity_concept_id: well_known::ETHNICITY_UNKNOWN,
            }],
        )
        .unwrap();
    }

    fn make_episode(id: i64, days: u32, disposition: DischargeDisposition) -> Episode {
        let start = NaiveDate::from_ymd_opt(2024, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Episode {
            visit_occurrence_id: id,
            person_id: 1,
            start,
            end: start + Duration::days(days as i64),
            los_days: days,
            disposition,
        }
    }

    #[test]
    fn insert_and_read_back() {
        let conn = open_memory_database().unwrap();
        seed_person(&conn);
        insert_episodes(
            &conn,
            &[
                make_episode(1, 4, DischargeDisposition::Alive),
                make_episode(2, 21, DischargeDisposition::Deceased),
            ],
        )
        .unwrap();

        let episodes = get_episodes(&conn).unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].los_days, 4);
        assert_eq!(episodes[1].los_days, 21);
        assert_eq!(episodes[1].disposition, DischargeDisposition::Deceased);
        assert_eq!(episodes[1].end.date(), NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
    }

    #[test]
    fn episode_without_person_violates_foreign_key() {
        let conn = open_memory_database().unwrap();
        let result = insert_episodes(&conn, &[make_episode(1, 2, DischargeDisposition::Alive)]);
        assert!(result.is_err());
    }

    #[test]
    fn omop_constants_are_written() {
        let conn = open_memory_database().unwrap();
        seed_person(&conn);
        insert_episodes(&conn, &[make_episode(9, 3, DischargeDisposition::Alive)]).unwrap();

        let (visit_concept, type_concept, discharged, source): (i64, i64, i64, String) = conn
            .query_row(
                "SELECT visit_concept_id, visit_type_concept_id, discharged_to_concept_id,
                        visit_source_value
                 FROM visit_occurrence",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(visit_concept, 9201);
        assert_eq!(type_concept, 32817);
        assert_eq!(discharged, 32826);
        assert_eq!(source, "ICU-9");
    }
}
