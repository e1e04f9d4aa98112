use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::DatabaseError;

/// Measurement volume per concept, joined to the vocabulary for its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementConceptCount {
    pub concept_name: String,
    pub domain_id: String,
    pub count: i64,
}

/// One patient joined to one of their episodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientEpisodeRow {
    pub person_id: i64,
    pub year_of_birth: i32,
    pub gender: String,
    pub visit_start: NaiveDate,
    pub visit_end: NaiveDate,
}

/// Most frequent measurement concepts, highest count first.
pub fn top_measurement_concepts(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<MeasurementConceptCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT c.concept_name, c.domain_id, COUNT(*) AS measurement_count
         FROM measurement m
         JOIN concept c ON m.measurement_concept_id = c.concept_id
         GROUP BY c.concept_name, c.domain_id
         ORDER BY measurement_count DESC, c.concept_name ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(MeasurementConceptCount {
            concept_name: row.get(0)?,
            domain_id: row.get(1)?,
            count: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// First `limit` patients with their episodes, ordered by patient then visit.
pub fn sample_patient_episodes(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<PatientEpisodeRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.person_id, p.year_of_birth,
                COALESCE(g.concept_name, p.gender_source_value, 'Unknown'),
                v.visit_start_date, v.visit_end_date
         FROM person p
         JOIN visit_occurrence v ON p.person_id = v.person_id
         LEFT JOIN concept g ON p.gender_concept_id = g.concept_id
         ORDER BY p.person_id, v.visit_occurrence_id
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(PatientEpisodeRow {
            person_id: row.get(0)?,
            year_of_birth: row.get(1)?,
            gender: row.get(2)?,
            visit_start: row.get(3)?,
            visit_end: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::seed_episode;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn top_concepts_ordered_by_count() {
        let conn = open_memory_database().unwrap();
        seed_episode(&conn, 1, 1);
        conn.execute_batch(
            "INSERT INTO concept (concept_id, concept_name, domain_id, vocabulary_id,
                                  concept_class_id, standard_concept, concept_code)
             VALUES (10, 'Heart rate', 'Measurement', 'LOINC', 'Clinical Observation', 'S', '8867-4'),
                    (11, 'Lactate', 'Measurement', 'LOINC', 'Lab Test', 'S', '2524-7');
             INSERT INTO measurement (measurement_id, person_id, measurement_concept_id,
                                      measurement_date, measurement_type_concept_id)
             VALUES (1, 1, 10, '2024-06-01', 32817),
                    (2, 1, 10, '2024-06-01', 32817),
                    (3, 1, 11, '2024-06-01', 32817);",
        )
        .unwrap();

        let top = top_measurement_concepts(&conn, 15).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].concept_name, "Heart rate");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].domain_id, "Measurement");

        assert_eq!(top_measurement_concepts(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn sample_falls_back_to_source_gender() {
        let conn = open_memory_database().unwrap();
        let ep = seed_episode(&conn, 1, 3);

        let rows = sample_patient_episodes(&conn, 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gender, "M");
        assert_eq!(rows[0].year_of_birth, 1955);
        assert_eq!(rows[0].visit_start, ep.start.date());
        assert_eq!(rows[0].visit_end, ep.end.date());
    }
}
