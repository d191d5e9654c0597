//! Batch execution across many cells
//!
//! A [`BatchRunner`] owns one [`CellEngine`] per cell ID of a matrix and
//! drives them against sparse per-cell rows: flat vectors in the
//! population's union schema, first slot the target cell ID, NaN in every
//! column foreign to that cell.
//!
//! For each row the runner compacts the non-NaN slots into a dense buffer
//! (recovering the cell's own schema), invokes the cell's engine, and
//! scatters the results back into the original positions; NaN holes are
//! preserved exactly. Rows are processed strictly in input order and are
//! fully independent of one another within a call; engine state persists
//! and accumulates across successive `run` calls.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use nalgebra::DVector;

use crate::engine::CellEngine;
use crate::error::{Error, Result};
use crate::matrix::ReactionMatrix;
use crate::CellId;

/// Drives one engine per cell against batches of sparse rows.
pub struct BatchRunner {
    engines: BTreeMap<CellId, CellEngine>,
    buffer: Vec<f64>,
}

impl BatchRunner {
    /// Builds one engine per cell ID present in the matrix.
    pub fn new(matrix: &ReactionMatrix) -> Result<Self> {
        let mut engines = BTreeMap::new();
        for id in matrix.ids() {
            engines.insert(id, CellEngine::new(matrix, id)?);
        }

        let capacity = matrix.column_names(true).len();
        Ok(BatchRunner {
            engines,
            buffer: Vec::with_capacity(capacity),
        })
    }

    /// Number of engines (one per cell).
    pub fn num_engines(&self) -> usize {
        self.engines.len()
    }

    /// Advances every row by `time_step`, in input order.
    ///
    /// A row whose ID has no engine is a caller-input bug: the call fails
    /// with [`Error::UnknownCell`] and stops processing.
    pub fn run(&mut self, rows: &mut [DVector<f64>], time_step: f64) -> Result<()> {
        self.run_ignoring(rows, time_step, &[])
    }

    /// Like [`BatchRunner::run`], but rows whose index appears in
    /// `ignore` are left completely untouched, not even ID-checked.
    pub fn run_ignoring(
        &mut self,
        rows: &mut [DVector<f64>],
        time_step: f64,
        ignore: &[usize],
    ) -> Result<()> {
        let ignored: HashSet<usize> = ignore.iter().copied().collect();
        debug!(
            "running batch of {} rows ({} ignored)",
            rows.len(),
            ignored.len()
        );

        for (index, row) in rows.iter_mut().enumerate() {
            if ignored.contains(&index) {
                continue;
            }

            let id = row_id(row)?;
            let engine = self
                .engines
                .get_mut(&id)
                .ok_or(Error::UnknownCell(id))?;
            process_row(engine, row, &mut self.buffer, time_step)?;
        }

        Ok(())
    }

    /// Advances rows in parallel across engines.
    ///
    /// Rows are bucketed by cell ID; buckets run concurrently while the
    /// rows inside one bucket keep their input order, so results are
    /// identical to the sequential [`BatchRunner::run`]. Unknown IDs fail
    /// the whole call before any row is processed.
    #[cfg(feature = "parallel")]
    pub fn run_parallel(&mut self, rows: &mut [DVector<f64>], time_step: f64) -> Result<()> {
        use rayon::prelude::*;

        let mut buckets: BTreeMap<CellId, Vec<&mut DVector<f64>>> = BTreeMap::new();
        for row in rows.iter_mut() {
            let id = row_id(row)?;
            if !self.engines.contains_key(&id) {
                return Err(Error::UnknownCell(id));
            }
            buckets.entry(id).or_default().push(row);
        }

        let mut work: Vec<(&mut CellEngine, Vec<&mut DVector<f64>>)> = Vec::new();
        for (id, engine) in self.engines.iter_mut() {
            if let Some(bucket) = buckets.remove(id) {
                work.push((engine, bucket));
            }
        }

        work.into_par_iter().try_for_each(|(engine, mut bucket)| {
            let mut buffer = Vec::new();
            for row in bucket.iter_mut() {
                process_row(engine, row, &mut buffer, time_step)?;
            }
            Ok(())
        })
    }
}

/// Reads and validates the leading ID slot of a row.
fn row_id(row: &DVector<f64>) -> Result<CellId> {
    let Some(first) = row.as_slice().first() else {
        return Err(Error::InvalidArgument("empty simulation row".to_string()));
    };
    if !first.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "row ID slot holds a non-finite value ({first})"
        )));
    }
    Ok(*first as CellId)
}

/// Compact -> advance -> scatter for a single row.
fn process_row(
    engine: &mut CellEngine,
    row: &mut DVector<f64>,
    buffer: &mut Vec<f64>,
    time_step: f64,
) -> Result<()> {
    buffer.clear();
    buffer.push(row[0]);
    for j in 1..row.len() {
        let value = row[j];
        if !value.is_nan() {
            buffer.push(value);
        }
    }

    engine.run_cell(buffer, time_step)?;

    let mut compact = 1;
    for j in 1..row.len() {
        if !row[j].is_nan() {
            row[j] = buffer[compact];
            compact += 1;
        }
    }

    Ok(())
}
