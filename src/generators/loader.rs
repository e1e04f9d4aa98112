//! Bounded-memory batching between generators and storage.
//!
//! A [`BatchLoader`] buffers records for one table and hands them to its
//! [`RecordSink`] once the buffer reaches the flush threshold. Each flush is a
//! single committed write; a failed flush aborts the owning phase.

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::*;

/// Destination for a batch of records of one type.
pub trait RecordSink<T> {
    /// Write and commit `records` as one unit.
    fn write_batch(&mut self, records: &[T]) -> Result<(), DatabaseError>;
}

/// Sink writing into the OMOP tables of a SQLite connection.
#[derive(Clone, Copy)]
pub struct SqliteSink<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSink<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RecordSink<Person> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[Person]) -> Result<(), DatabaseError> {
        db::insert_persons(self.conn, records)
    }
}

impl RecordSink<Episode> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[Episode]) -> Result<(), DatabaseError> {
        db::insert_episodes(self.conn, records)
    }
}

impl RecordSink<ConditionOccurrence> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[ConditionOccurrence]) -> Result<(), DatabaseError> {
        db::insert_conditions(self.conn, records)
    }
}

impl RecordSink<Measurement> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[Measurement]) -> Result<(), DatabaseError> {
        db::insert_measurements(self.conn, records)
    }
}

impl RecordSink<DrugExposure> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[DrugExposure]) -> Result<(), DatabaseError> {
        db::insert_drug_exposures(self.conn, records)
    }
}

impl RecordSink<ProcedureOccurrence> for SqliteSink<'_> {
    fn write_batch(&mut self, records: &[ProcedureOccurrence]) -> Result<(), DatabaseError> {
        db::insert_procedures(self.conn, records)
    }
}

/// Buffers records and flushes them to a sink in bounded batches.
pub struct BatchLoader<T, S> {
    sink: S,
    buffer: Vec<T>,
    threshold: usize,
    written: usize,
    flushes: usize,
}

impl<T, S: RecordSink<T>> BatchLoader<T, S> {
    /// Loader flushing every `threshold` records. A zero threshold is treated as 1.
    pub fn new(sink: S, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            sink,
            buffer: Vec::with_capacity(threshold.min(16_384)),
            threshold,
            written: 0,
            flushes: 0,
        }
    }

    /// Loader that only writes on [`finish`](Self::finish): one bulk insert
    /// for the whole phase.
    pub fn unbounded(sink: S) -> Self {
        Self::new(sink, usize::MAX)
    }

    pub fn push(&mut self, record: T) -> Result<(), DatabaseError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DatabaseError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sink.write_batch(&self.buffer)?;
        self.written += self.buffer.len();
        self.flushes += 1;
        tracing::debug!(
            batch = self.buffer.len(),
            written = self.written,
            "Flushed batch"
        );
        self.buffer.clear();
        Ok(())
    }

    /// Flush the remainder and return the total number of records written.
    pub fn finish(mut self) -> Result<usize, DatabaseError> {
        self.flush()?;
        Ok(self.written)
    }

    /// Records pushed so far, flushed or not.
    #[cfg(test)]
    pub(crate) fn pushed(&self) -> usize {
        self.written + self.buffer.len()
    }

    #[cfg(test)]
    pub(crate) fn flushes(&self) -> usize {
        self.flushes
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemorySink;
    use super::*;

    struct FailingSink;

    impl RecordSink<u32> for FailingSink {
        fn write_batch(&mut self, _records: &[u32]) -> Result<(), DatabaseError> {
            Err(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        }
    }

    #[test]
    fn flushes_when_threshold_reached() {
        let mut sink = MemorySink::default();
        let mut loader = BatchLoader::new(&mut sink, 3);
        for i in 0..7u32 {
            loader.push(i).unwrap();
        }
        assert_eq!(loader.flushes(), 2);
        assert_eq!(loader.pushed(), 7);
        assert_eq!(loader.finish().unwrap(), 7);

        let sizes: Vec<usize> = sink.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(sink.records().copied().collect::<Vec<_>>(), (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn exact_multiple_leaves_no_empty_tail_batch() {
        let mut sink = MemorySink::default();
        let mut loader = BatchLoader::new(&mut sink, 2);
        for i in 0..4u32 {
            loader.push(i).unwrap();
        }
        assert_eq!(loader.finish().unwrap(), 4);
        assert_eq!(sink.batches.len(), 2);
    }

    #[test]
    fn unbounded_writes_once_on_finish() {
        let mut sink = MemorySink::default();
        let mut loader = BatchLoader::unbounded(&mut sink);
        for i in 0..1000u32 {
            loader.push(i).unwrap();
        }
        assert_eq!(loader.flushes(), 0);
        assert_eq!(loader.finish().unwrap(), 1000);
        assert_eq!(sink.batches.len(), 1);
    }

    #[test]
    fn empty_loader_never_writes() {
        let mut sink: MemorySink<u32> = MemorySink::default();
        let loader = BatchLoader::new(&mut sink, 10);
        assert_eq!(loader.finish().unwrap(), 0);
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn sink_failure_propagates() {
        let mut loader: BatchLoader<u32, _> = BatchLoader::new(FailingSink, 2);
        loader.push(1).unwrap();
        assert!(loader.push(2).is_err());
    }

    #[test]
    fn sqlite_sink_writes_measurements() {
        use crate::db::repository::fixtures::seed_episode;
        use crate::db::{get_measurements_for_visit, open_memory_database};

        let conn = open_memory_database().unwrap();
        let ep = seed_episode(&conn, 1, 1);
        let mut loader = BatchLoader::new(SqliteSink::new(&conn), 2);
        for id in 1..=5 {
            loader
                .push(Measurement {
                    measurement_id: id,
                    person_id: ep.person_id,
                    visit_occurrence_id: ep.visit_occurrence_id,
                    concept_id: ConceptId(3027018),
                    measured_at: ep.start,
                    value: 80.0,
                    unit_concept_id: ConceptId(8541),
                    unit: "/min".into(),
                    source_value: "Heart Rate".into(),
                })
                .unwrap();
        }
        assert_eq!(loader.finish().unwrap(), 5);
        assert_eq!(get_measurements_for_visit(&conn, 1).unwrap().len(), 5);
    }
}
