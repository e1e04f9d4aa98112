//! Read access to the standardized vocabulary (`concept` table).
//!
//! Generators never write here. The demo installer exists so a fresh database
//! file can be exercised end to end without a licensed vocabulary download.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;
use crate::models::{ConceptDomain, ConceptId};
use crate::resolver::VocabularySource;

/// `concept`-table lookups over a borrowed connection.
pub struct SqliteVocabulary<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteVocabulary<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl VocabularySource for SqliteVocabulary<'_> {
    fn find_by_code(
        &self,
        code: &str,
        vocabulary: &str,
    ) -> Result<Option<ConceptId>, DatabaseError> {
        let id = self
            .conn
            .query_row(
                "SELECT concept_id
                 FROM concept
                 WHERE concept_code = ?1
                   AND vocabulary_id = ?2
                   AND invalid_reason IS NULL
                 LIMIT 1",
                params![code, vocabulary],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(ConceptId))
    }

    fn search_by_name(
        &self,
        term: &str,
        domain: Option<ConceptDomain>,
    ) -> Result<Option<ConceptId>, DatabaseError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let id = self
            .conn
            .query_row(
                "SELECT concept_id
                 FROM concept
                 WHERE LOWER(concept_name) LIKE ?1
                   AND standard_concept = 'S'
                   AND invalid_reason IS NULL
                   AND (?2 IS NULL OR domain_id = ?2)
                 ORDER BY concept_id
                 LIMIT 1",
                params![pattern, domain.map(|d| d.as_str())],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(ConceptId))
    }
}

/// (concept_id, concept_name, domain_id, vocabulary_id, concept_class_id, concept_code)
type DemoConcept = (i64, &'static str, &'static str, &'static str, &'static str, &'static str);

const DEMO_CONCEPTS: &[DemoConcept] = &[
    (8507, "MALE", "Gender", "Gender", "Gender", "M"),
    (8532, "FEMALE", "Gender", "Gender", "Gender", "F"),
    (8527, "White", "Race", "Race", "Race", "5"),
    (8552, "Unknown", "Race", "Race", "Race", "UNK"),
    (9201, "Inpatient Visit", "Visit", "Visit", "Visit", "IP"),
    // Vital signs
    (3027018, "Heart rate", "Measurement", "LOINC", "Clinical Observation", "8867-4"),
    (3004249, "Systolic blood pressure", "Measurement", "LOINC", "Clinical Observation", "8480-6"),
    (3012888, "Diastolic blood pressure", "Measurement", "LOINC", "Clinical Observation", "8462-4"),
    (40762499, "Oxygen saturation in Arterial blood by Pulse oximetry", "Measurement", "LOINC", "Clinical Observation", "59408-5"),
    (3020891, "Body temperature", "Measurement", "LOINC", "Clinical Observation", "8310-5"),
    (3024171, "Respiratory rate", "Measurement", "LOINC", "Clinical Observation", "9279-1"),
    // Laboratory
    (3047181, "Lactate [Moles/volume] in Blood", "Measurement", "LOINC", "Lab Test", "32693-4"),
    (3016723, "Creatinine [Mass/volume] in Serum or Plasma", "Measurement", "LOINC", "Lab Test", "2160-0"),
    (3000905, "Leukocytes [#/volume] (white blood cell count) in Blood", "Measurement", "LOINC", "Lab Test", "6690-2"),
    (3000963, "Hemoglobin [Mass/volume] in Blood", "Measurement", "LOINC", "Lab Test", "718-7"),
    (3024929, "Platelets [#/volume] in Blood by Automated count", "Measurement", "LOINC", "Lab Test", "777-3"),
    (3019550, "Sodium [Moles/volume] in Serum or Plasma", "Measurement", "LOINC", "Lab Test", "2951-2"),
    (3023103, "Potassium [Moles/volume] in Serum or Plasma", "Measurement", "LOINC", "Lab Test", "2823-3"),
    (3010421, "Arterial pH", "Measurement", "LOINC", "Lab Test", "2744-1"),
    (3027946, "Carbon dioxide [Partial pressure] in Arterial blood (pCO2)", "Measurement", "LOINC", "Lab Test", "2019-8"),
    (3027801, "Oxygen [Partial pressure] in Arterial blood (pO2)", "Measurement", "LOINC", "Lab Test", "2703-7"),
    // Ventilator settings
    (3020716, "Oxygen/Total gas setting [Volume Fraction] Ventilator (FiO2)", "Measurement", "LOINC", "Clinical Observation", "19996-8"),
    (3022875, "Positive end expiratory pressure setting (PEEP) Ventilator", "Measurement", "LOINC", "Clinical Observation", "20077-4"),
    (3012410, "Tidal volume setting Ventilator", "Measurement", "LOINC", "Clinical Observation", "20112-9"),
    (3027315, "Ventilator peak pressure", "Measurement", "LOINC", "Clinical Observation", "76531-3"),
    (3001668, "Plateau pressure Respiratory system airway", "Measurement", "LOINC", "Clinical Observation", "20075-8"),
    // Conditions
    (132797, "Sepsis", "Condition", "SNOMED", "Clinical Finding", "91302008"),
    (319049, "Acute respiratory failure", "Condition", "SNOMED", "Clinical Finding", "65710008"),
    (4195694, "Acute respiratory distress syndrome", "Condition", "SNOMED", "Clinical Finding", "67782005"),
    (255848, "Pneumonia", "Condition", "SNOMED", "Clinical Finding", "233604007"),
    (201965, "Shock", "Condition", "SNOMED", "Clinical Finding", "27942005"),
    // Drugs
    (753626, "propofol", "Drug", "RxNorm", "Ingredient", "8782"),
    (1154029, "fentanyl", "Drug", "RxNorm", "Ingredient", "4337"),
    (1321341, "norepinephrine", "Drug", "RxNorm", "Ingredient", "7512"),
    (708298, "midazolam", "Drug", "RxNorm", "Ingredient", "6960"),
    (1707687, "vancomycin", "Drug", "RxNorm", "Ingredient", "11124"),
    (1746114, "piperacillin / tazobactam", "Drug", "RxNorm", "Clinical Drug Comp", "74169"),
    // Procedures
    (4202832, "Endotracheal intubation", "Procedure", "SNOMED", "Procedure", "112798008"),
    (4230167, "Mechanical ventilation", "Procedure", "SNOMED", "Procedure", "40617009"),
    (4322380, "Insertion of central venous catheter", "Procedure", "SNOMED", "Procedure", "233527006"),
    (4213288, "Insertion of arterial catheter", "Procedure", "SNOMED", "Procedure", "392247006"),
    // Units
    (8541, "per minute", "Unit", "UCUM", "Unit", "/min"),
    (8876, "millimeter mercury column", "Unit", "UCUM", "Unit", "mm[Hg]"),
    (8554, "percent", "Unit", "UCUM", "Unit", "%"),
    (586323, "degree Celsius", "Unit", "UCUM", "Unit", "Cel"),
    (8753, "millimole per liter", "Unit", "UCUM", "Unit", "mmol/L"),
    (8840, "milligram per deciliter", "Unit", "UCUM", "Unit", "mg/dL"),
    (8848, "thousand per microliter", "Unit", "UCUM", "Unit", "10*3/uL"),
    (8713, "gram per deciliter", "Unit", "UCUM", "Unit", "g/dL"),
    (8482, "pH", "Unit", "UCUM", "Unit", "[pH]"),
    (8587, "milliliter", "Unit", "UCUM", "Unit", "mL"),
    (44777590, "centimeter water column", "Unit", "UCUM", "Unit", "cm[H2O]"),
];

/// Install the built-in demo vocabulary. Existing ids are left untouched.
///
/// Returns the number of concepts actually inserted.
pub fn install_demo_vocabulary(conn: &Connection) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO concept (concept_id, concept_name, domain_id, vocabulary_id,
             concept_class_id, standard_concept, concept_code)
             VALUES (?1, ?2, ?3, ?4, ?5, 'S', ?6)",
        )?;
        for (id, name, domain, vocabulary, class, code) in DEMO_CONCEPTS {
            inserted += stmt.execute(params![id, name, domain, vocabulary, class, code])?;
        }
    }
    tx.commit()?;
    tracing::info!(inserted, total = DEMO_CONCEPTS.len(), "Demo vocabulary installed");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::count_rows;
    use crate::db::sqlite::open_memory_database;

    fn demo_db() -> Connection {
        let conn = open_memory_database().unwrap();
        install_demo_vocabulary(&conn).unwrap();
        conn
    }

    #[test]
    fn install_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let first = install_demo_vocabulary(&conn).unwrap();
        let second = install_demo_vocabulary(&conn).unwrap();
        assert_eq!(first, DEMO_CONCEPTS.len());
        assert_eq!(second, 0);
        assert_eq!(count_rows(&conn, "concept").unwrap(), DEMO_CONCEPTS.len() as i64);
    }

    #[test]
    fn finds_gender_by_code() {
        let conn = demo_db();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(vocab.find_by_code("M", "Gender").unwrap(), Some(ConceptId(8507)));
        assert_eq!(vocab.find_by_code("F", "Gender").unwrap(), Some(ConceptId(8532)));
        assert_eq!(vocab.find_by_code("M", "LOINC").unwrap(), None);
    }

    #[test]
    fn code_lookup_skips_invalidated_entries() {
        let conn = demo_db();
        conn.execute(
            "INSERT INTO concept (concept_id, concept_name, domain_id, vocabulary_id,
                                  concept_class_id, standard_concept, concept_code, invalid_reason)
             VALUES (1, 'Old unknown gender', 'Gender', 'Gender', 'Gender', NULL, 'U', 'D')",
            [],
        )
        .unwrap();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(vocab.find_by_code("U", "Gender").unwrap(), None);
    }

    #[test]
    fn name_search_is_case_insensitive_substring() {
        let conn = demo_db();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(
            vocab.search_by_name("FiO2", Some(ConceptDomain::Measurement)).unwrap(),
            Some(ConceptId(3020716))
        );
        assert_eq!(
            vocab.search_by_name("PEEP", Some(ConceptDomain::Measurement)).unwrap(),
            Some(ConceptId(3022875))
        );
        assert_eq!(
            vocab.search_by_name("piperacillin", Some(ConceptDomain::Drug)).unwrap(),
            Some(ConceptId(1746114))
        );
    }

    #[test]
    fn name_search_respects_domain_filter() {
        let conn = demo_db();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(
            vocab.search_by_name("mechanical ventilation", Some(ConceptDomain::Procedure)).unwrap(),
            Some(ConceptId(4230167))
        );
        assert_eq!(
            vocab.search_by_name("mechanical ventilation", Some(ConceptDomain::Drug)).unwrap(),
            None
        );
        assert_eq!(
            vocab.search_by_name("sepsis", None).unwrap(),
            Some(ConceptId(132797))
        );
    }

    #[test]
    fn name_search_ignores_non_standard_concepts() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO concept (concept_id, concept_name, domain_id, vocabulary_id,
                                  concept_class_id, standard_concept, concept_code)
             VALUES (45, 'Septic shock (ICD10)', 'Condition', 'ICD10CM', 'ICD10 code', NULL, 'R65.21')",
            [],
        )
        .unwrap();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(vocab.search_by_name("shock", Some(ConceptDomain::Condition)).unwrap(), None);
    }

    #[test]
    fn partial_pressure_terms_do_not_collide() {
        let conn = demo_db();
        let vocab = SqliteVocabulary::new(&conn);
        assert_eq!(
            vocab.search_by_name("pco2", Some(ConceptDomain::Measurement)).unwrap(),
            Some(ConceptId(3027946))
        );
        assert_eq!(
            vocab.search_by_name("po2", Some(ConceptDomain::Measurement)).unwrap(),
            Some(ConceptId(3027801))
        );
    }
}
