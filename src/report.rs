//! Read-only verification report over a populated database.

use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{
    count_rows, sample_patient_episodes, top_measurement_concepts, ClinicalTable, DatabaseError,
    MeasurementConceptCount,
};

pub const TOP_MEASUREMENT_LIMIT: usize = 15;
pub const SAMPLE_PATIENT_LIMIT: usize = 5;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCount {
    pub table: &'static str,
    pub description: &'static str,
    pub rows: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSample {
    pub person_id: i64,
    /// Years relative to the report's reference year.
    pub age: i32,
    pub gender: String,
    pub visit_start: NaiveDate,
    pub visit_end: NaiveDate,
    pub los_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub reference_year: i32,
    pub tables: Vec<TableCount>,
    pub top_measurements: Vec<MeasurementConceptCount>,
    pub sample_patients: Vec<PatientSample>,
}

impl VerificationReport {
    /// Build the report with ages relative to the current year.
    pub fn collect(conn: &Connection) -> Result<Self, DatabaseError> {
        Self::collect_for_year(conn, Utc::now().year())
    }

    pub fn collect_for_year(conn: &Connection, reference_year: i32) -> Result<Self, DatabaseError> {
        let tables = ClinicalTable::ALL
            .iter()
            .map(|table| {
                Ok(TableCount {
                    table: table.table_name(),
                    description: table.description(),
                    rows: count_rows(conn, table.table_name())?,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        let top_measurements = top_measurement_concepts(conn, TOP_MEASUREMENT_LIMIT)?;

        let sample_patients = sample_patient_episodes(conn, SAMPLE_PATIENT_LIMIT)?
            .into_iter()
            .map(|row| PatientSample {
                person_id: row.person_id,
                age: reference_year - row.year_of_birth,
                gender: row.gender,
                visit_start: row.visit_start,
                visit_end: row.visit_end,
                los_days: (row.visit_end - row.visit_start).num_days(),
            })
            .collect();

        Ok(Self {
            reference_year,
            tables,
            top_measurements,
            sample_patients,
        })
    }

    pub fn total_rows(&self) -> i64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// `1234567` -> `1,234,567`
fn grouped(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f, "{rule}")?;
    writeln!(f, "{title}")?;
    writeln!(f, "{rule}")
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, "DATA GENERATION VERIFICATION REPORT")?;
        for t in &self.tables {
            writeln!(
                f,
                "{:<25} {:>10} rows  ({})",
                t.table,
                grouped(t.rows),
                t.description
            )?;
        }
        writeln!(f, "{:<25} {:>10} rows", "total", grouped(self.total_rows()))?;

        writeln!(f)?;
        heading(f, "MEASUREMENT BREAKDOWN")?;
        for m in &self.top_measurements {
            writeln!(f, "{:<40} {:>10}", m.concept_name, grouped(m.count))?;
        }

        writeln!(f)?;
        heading(f, "SAMPLE PATIENT DATA")?;
        for p in &self.sample_patients {
            writeln!(
                f,
                "Patient {}: {}y {}, ICU {} to {} ({} days)",
                p.person_id, p.age, p.gender, p.visit_start, p.visit_end, p.los_days
            )?;
        }
        write!(f, "{}", "=".repeat(RULE_WIDTH))
    }
}
