use rusqlite::{params, Connection};

use crate::db::{DatabaseError, DATETIME_FORMAT};
use crate::models::*;

/// Insert a batch of patients in one transaction.
pub fn insert_persons(conn: &Connection, persons: &[Person]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO person (person_id, gender_concept_id, year_of_birth, month_of_birth,
             day_of_birth, birth_datetime, race_concept_id, ethnicity_concept_id,
             person_source_value, gender_source_value, race_source_concept_id,
             ethnicity_source_concept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, 0)",
        )?;
        for person in persons {
            let birth = person.birth_date.and_hms_opt(0, 0, 0).unwrap_or_default();
            stmt.execute(params![
                person.person_id,
                person.gender_concept_id,
                person.year_of_birth(),
                person.month_of_birth(),
                person.day_of_birth(),
                birth.format(DATETIME_FORMAT).to_string(),
                person.race_concept_id,
                person.ethnicity_concept_id,
                person.source_value(),
                person.sex.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// All patients ordered by id.
#[cfg(test)]
pub(crate) fn get_persons(conn: &Connection) -> Result<Vec<Person>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT person_id, gender_source_value, gender_concept_id, year_of_birth,
                month_of_birth, day_of_birth, race_concept_id, ethnicity_concept_id
         FROM person ORDER BY person_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i32>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, u32>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, i64>(7)?,
        ))
    })?;

    let mut persons = Vec::new();
    for row in rows {
        let (person_id, sex, gender, year, month, day, race, ethnicity) = row?;
        let birth_date = chrono::NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            DatabaseError::InvalidEnum {
                field: "birth_date".into(),
                value: format!("{year}-{month}-{day}"),
            }
        })?;
        persons.push(Person {
            person_id,
            sex: sex.parse()?,
            gender_concept_id: ConceptId(gender),
            birth_date,
            race_concept_id: ConceptId(race),
            ethnicity_concept_id: ConceptId(ethnicity),
        });
    }
    Ok(persons)
}
