use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

use super::concept::{well_known, ConceptId};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Domains searched by name. Values match OMOP `concept.domain_id`.
str_enum!(ConceptDomain {
    Condition => "Condition",
    Measurement => "Measurement",
    Drug => "Drug",
    Procedure => "Procedure",
});

// Values match the OMOP Gender vocabulary codes.
str_enum!(Sex {
    Male => "M",
    Female => "F",
});

str_enum!(DischargeDisposition {
    Alive => "alive",
    Deceased => "deceased",
});

str_enum!(MeasurementCategory {
    VitalSign => "vital_sign",
    Laboratory => "laboratory",
    Ventilation => "ventilation",
});

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Vocabulary the sex code resolves in.
    pub const VOCABULARY: &'static str = "Gender";
}

impl DischargeDisposition {
    pub fn concept_id(self) -> ConceptId {
        match self {
            DischargeDisposition::Alive => well_known::DISCHARGED_ALIVE,
            DischargeDisposition::Deceased => well_known::PATIENT_DIED,
        }
    }
}

impl MeasurementCategory {
    /// Human-readable label used in progress logs.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementCategory::VitalSign => "vital signs",
            MeasurementCategory::Laboratory => "laboratory results",
            MeasurementCategory::Ventilation => "ventilation parameters",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn concept_domain_round_trip() {
        for (variant, s) in [
            (ConceptDomain::Condition, "Condition"),
            (ConceptDomain::Measurement, "Measurement"),
            (ConceptDomain::Drug, "Drug"),
            (ConceptDomain::Procedure, "Procedure"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ConceptDomain::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn only_searched_domains_parse() {
        for s in ["Gender", "Race", "Visit", "Unit"] {
            assert!(ConceptDomain::from_str(s).is_err(), "{s}");
        }
    }

    #[test]
    fn sex_codes_match_gender_vocabulary() {
        assert_eq!(Sex::Male.as_str(), "M");
        assert_eq!(Sex::Female.as_str(), "F");
        assert_eq!(Sex::from_str("F").unwrap(), Sex::Female);
    }

    #[test]
    fn disposition_maps_to_omop_concepts() {
        assert_eq!(DischargeDisposition::Alive.concept_id(), ConceptId(32826));
        assert_eq!(DischargeDisposition::Deceased.concept_id(), ConceptId(32767));
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(ConceptDomain::from_str("condition").is_err());
        assert!(Sex::from_str("X").is_err());
        assert!(matches!(
            MeasurementCategory::from_str(""),
            Err(DatabaseError::InvalidEnum { .. })
        ));
    }
}
