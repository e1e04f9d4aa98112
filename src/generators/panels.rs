//! Fixed concept panels driving every generator.
//!
//! Search terms are matched against standard concept names; display names
//! become the OMOP `*_source_value`.

use crate::models::{ConceptId, MeasurementCategory};

/// One analyte or device parameter with its uniform sampling range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSpec {
    pub search_term: &'static str,
    pub display_name: &'static str,
    pub low: f64,
    pub high: f64,
    pub unit_concept_id: ConceptId,
    pub unit: &'static str,
}

/// When readings of a panel are taken during an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every whole hour from admission, final partial hour excluded.
    Hourly,
    /// Once per inpatient day at a fixed offset from the admission time.
    DailyAt { hour_offset: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct MeasurementPanel {
    pub category: MeasurementCategory,
    pub schedule: Schedule,
    pub entries: &'static [MeasurementSpec],
}

/// A condition, drug or procedure included independently with `probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusionSpec {
    pub search_term: &'static str,
    pub display_name: &'static str,
    pub probability: f64,
}

const PER_MINUTE: ConceptId = ConceptId(8541);
const MM_HG: ConceptId = ConceptId(8876);
const PERCENT: ConceptId = ConceptId(8554);
const CELSIUS: ConceptId = ConceptId(586323);
const MMOL_PER_L: ConceptId = ConceptId(8753);
const MG_PER_DL: ConceptId = ConceptId(8840);
const THOUSAND_PER_UL: ConceptId = ConceptId(8848);
const G_PER_DL: ConceptId = ConceptId(8713);
const PH: ConceptId = ConceptId(8482);
const ML: ConceptId = ConceptId(8587);
const CM_H2O: ConceptId = ConceptId(44777590);

const fn spec(
    search_term: &'static str,
    display_name: &'static str,
    low: f64,
    high: f64,
    unit_concept_id: ConceptId,
    unit: &'static str,
) -> MeasurementSpec {
    MeasurementSpec {
        search_term,
        display_name,
        low,
        high,
        unit_concept_id,
        unit,
    }
}

const fn include(
    search_term: &'static str,
    display_name: &'static str,
    probability: f64,
) -> InclusionSpec {
    InclusionSpec {
        search_term,
        display_name,
        probability,
    }
}

pub const VITAL_SIGNS: MeasurementPanel = MeasurementPanel {
    category: MeasurementCategory::VitalSign,
    schedule: Schedule::Hourly,
    entries: &[
        spec("heart rate", "Heart Rate", 60.0, 120.0, PER_MINUTE, "/min"),
        spec("systolic blood pressure", "Systolic BP", 90.0, 160.0, MM_HG, "mm[Hg]"),
        spec("diastolic blood pressure", "Diastolic BP", 50.0, 90.0, MM_HG, "mm[Hg]"),
        spec("oxygen saturation", "SpO2", 88.0, 100.0, PERCENT, "%"),
        spec("body temperature", "Temperature", 36.0, 39.5, CELSIUS, "Cel"),
        spec("respiratory rate", "Respiratory Rate", 12.0, 30.0, PER_MINUTE, "/min"),
    ],
};

pub const LABORATORY: MeasurementPanel = MeasurementPanel {
    category: MeasurementCategory::Laboratory,
    schedule: Schedule::DailyAt { hour_offset: 6 },
    entries: &[
        spec("lactate", "Lactate", 0.5, 8.0, MMOL_PER_L, "mmol/L"),
        spec("creatinine", "Creatinine", 0.5, 3.5, MG_PER_DL, "mg/dL"),
        spec("white blood cell", "WBC", 4.0, 25.0, THOUSAND_PER_UL, "10*3/uL"),
        spec("hemoglobin", "Hemoglobin", 7.0, 16.0, G_PER_DL, "g/dL"),
        spec("platelets", "Platelets", 50.0, 400.0, THOUSAND_PER_UL, "10*3/uL"),
        spec("sodium", "Sodium", 130.0, 150.0, MMOL_PER_L, "mmol/L"),
        spec("potassium", "Potassium", 3.0, 5.5, MMOL_PER_L, "mmol/L"),
        spec("arterial ph", "pH", 7.20, 7.50, PH, "[pH]"),
        spec("pco2", "PaCO2", 30.0, 60.0, MM_HG, "mm[Hg]"),
        spec("po2", "PaO2", 60.0, 120.0, MM_HG, "mm[Hg]"),
    ],
};

pub const VENTILATION: MeasurementPanel = MeasurementPanel {
    category: MeasurementCategory::Ventilation,
    schedule: Schedule::Hourly,
    entries: &[
        spec("FiO2", "FiO2", 21.0, 100.0, PERCENT, "%"),
        spec("PEEP", "PEEP", 5.0, 15.0, CM_H2O, "cm[H2O]"),
        spec("tidal volume", "Tidal Volume", 300.0, 600.0, ML, "mL"),
        spec("peak pressure", "Peak Pressure", 15.0, 35.0, CM_H2O, "cm[H2O]"),
        spec("plateau pressure", "Plateau Pressure", 15.0, 30.0, CM_H2O, "cm[H2O]"),
    ],
};

pub const CONDITIONS: &[InclusionSpec] = &[
    include("sepsis", "Sepsis", 0.4),
    include("respiratory failure", "Respiratory Failure", 0.6),
    include("acute respiratory distress", "ARDS", 0.2),
    include("pneumonia", "Pneumonia", 0.35),
    include("shock", "Shock", 0.25),
];

pub const MEDICATIONS: &[InclusionSpec] = &[
    include("propofol", "Propofol", 0.7),
    include("fentanyl", "Fentanyl", 0.6),
    include("norepinephrine", "Norepinephrine", 0.4),
    include("midazolam", "Midazolam", 0.5),
    include("vancomycin", "Vancomycin", 0.4),
    include("piperacillin", "Piperacillin-Tazobactam", 0.35),
];

pub const PROCEDURES: &[InclusionSpec] = &[
    include("intubation", "Endotracheal Intubation", 0.6),
    include("mechanical ventilation", "Mechanical Ventilation", 0.6),
    include("central venous catheter", "Central Line Placement", 0.5),
    include("arterial catheter", "Arterial Line Placement", 0.4),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_ranges_are_ordered() {
        for panel in [VITAL_SIGNS, LABORATORY, VENTILATION] {
            for entry in panel.entries {
                assert!(entry.low < entry.high, "{}", entry.display_name);
                assert!(entry.unit_concept_id.is_resolved(), "{}", entry.display_name);
            }
        }
    }

    #[test]
    fn probabilities_are_valid() {
        for entry in CONDITIONS.iter().chain(MEDICATIONS).chain(PROCEDURES) {
            assert!((0.0..=1.0).contains(&entry.probability), "{}", entry.display_name);
        }
    }

    #[test]
    fn panel_sizes() {
        assert_eq!(VITAL_SIGNS.entries.len(), 6);
        assert_eq!(LABORATORY.entries.len(), 10);
        assert_eq!(VENTILATION.entries.len(), 5);
        assert_eq!(CONDITIONS.len(), 5);
    }
}
