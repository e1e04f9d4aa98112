//! End-to-end generation run: clear, then every phase in dependency order.
//!
//! Each phase commits its own writes. A failure aborts the run but leaves
//! previously committed phases in place.

use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::db::{self, ClinicalTable, SqliteVocabulary};
use crate::generators::admissions::generate_admissions;
use crate::generators::demographics::generate_patients;
use crate::generators::diagnoses::generate_diagnoses;
use crate::generators::measurements::{generate_measurements, select_ventilated};
use crate::generators::panels::{LABORATORY, VENTILATION, VITAL_SIGNS};
use crate::generators::treatments::{generate_medications, generate_procedures};
use crate::generators::{BatchLoader, GenerationContext, GenerationError, IdSequence, SqliteSink};

/// Rows written by one run, per table and measurement category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub seed: u64,
    pub persons: usize,
    pub visits: usize,
    pub conditions: usize,
    pub vital_signs: usize,
    pub laboratory: usize,
    pub ventilation: usize,
    pub ventilated_episodes: usize,
    pub drug_exposures: usize,
    pub procedures: usize,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn measurements(&self) -> usize {
        self.vital_signs + self.laboratory + self.ventilation
    }
}

/// Sequence continuing after the highest id currently stored in `table`.
fn next_ids(conn: &Connection, table: ClinicalTable) -> Result<IdSequence, GenerationError> {
    Ok(IdSequence::after(db::max_id(conn, table)?))
}

/// Run `f` as a named phase, logging its duration.
fn phase<T>(
    name: &'static str,
    f: impl FnOnce() -> Result<T, GenerationError>,
) -> Result<T, GenerationError> {
    let start = Instant::now();
    tracing::info!(phase = name, "Phase started");
    let out = f()?;
    tracing::info!(
        phase = name,
        duration_ms = start.elapsed().as_millis() as u64,
        "Phase finished"
    );
    Ok(out)
}

/// Populate every clinical table from `config` using the vocabulary stored in `conn`.
pub fn run_pipeline(
    conn: &Connection,
    config: &GeneratorConfig,
) -> Result<RunSummary, GenerationError> {
    config.validate()?;
    let start = Instant::now();
    let run_id = Uuid::new_v4();
    tracing::info!(
        %run_id,
        seed = config.seed,
        patients = config.patient_count,
        "Generating synthetic ICU data"
    );

    if config.clear_existing {
        phase("clear", || Ok(db::clear_clinical_data(conn)?))?;
    }

    let mut ctx = GenerationContext::new(config.seed, SqliteVocabulary::new(conn));
    let sink = SqliteSink::new(conn);

    let persons = phase("demographics", || {
        let mut ids = next_ids(conn, ClinicalTable::Person)?;
        generate_patients(&mut ctx, &mut ids, config.patient_count, BatchLoader::unbounded(sink))
    })?;

    let episodes = phase("admissions", || {
        let mut ids = next_ids(conn, ClinicalTable::VisitOccurrence)?;
        generate_admissions(&mut ctx, &mut ids, &persons, BatchLoader::unbounded(sink))
    })?;

    let conditions = phase("diagnoses", || {
        let mut ids = next_ids(conn, ClinicalTable::ConditionOccurrence)?;
        generate_diagnoses(&mut ctx, &mut ids, &episodes, BatchLoader::unbounded(sink))
    })?;

    let vital_signs = phase("vital_signs", || {
        let mut ids = next_ids(conn, ClinicalTable::Measurement)?;
        let loader = BatchLoader::new(sink, config.vitals_batch_size);
        generate_measurements(&mut ctx, &mut ids, &VITAL_SIGNS, &episodes, loader)
    })?;

    let laboratory = phase("laboratory", || {
        let mut ids = next_ids(conn, ClinicalTable::Measurement)?;
        let loader = BatchLoader::new(sink, config.labs_batch_size);
        generate_measurements(&mut ctx, &mut ids, &LABORATORY, &episodes, loader)
    })?;

    let (ventilated_episodes, ventilation) = phase("ventilation", || {
        let ventilated = select_ventilated(&mut ctx.rng, &episodes, config.ventilated_fraction);
        tracing::info!(ventilated = ventilated.len(), "Selected ventilated episodes");
        let mut ids = next_ids(conn, ClinicalTable::Measurement)?;
        let loader = BatchLoader::new(sink, config.ventilation_batch_size);
        let written = generate_measurements(
            &mut ctx,
            &mut ids,
            &VENTILATION,
            ventilated.iter().copied(),
            loader,
        )?;
        Ok((ventilated.len(), written))
    })?;

    let drug_exposures = phase("medications", || {
        let mut ids = next_ids(conn, ClinicalTable::DrugExposure)?;
        generate_medications(&mut ctx, &mut ids, &episodes, BatchLoader::unbounded(sink))
    })?;

    let procedures = phase("procedures", || {
        let mut ids = next_ids(conn, ClinicalTable::ProcedureOccurrence)?;
        generate_procedures(&mut ctx, &mut ids, &episodes, BatchLoader::unbounded(sink))
    })?;

    let summary = RunSummary {
        run_id,
        seed: config.seed,
        persons: persons.len(),
        visits: episodes.len(),
        conditions,
        vital_signs,
        laboratory,
        ventilation,
        ventilated_episodes,
        drug_exposures,
        procedures,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!(
        %run_id,
        measurements = summary.measurements(),
        cached_concepts = ctx.resolver.cached(),
        elapsed_ms = summary.elapsed_ms,
        "Synthetic ICU data generation complete"
    );
    Ok(summary)
}
