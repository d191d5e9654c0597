//! geochem-rs: Batch Interface over a Geochemical Reaction Solver
//!
//! A structured, zero-copy layer that lets a host simulation (typically a
//! reactive-transport code) advance many independent chemical cells, each
//! a solution plus optional exchange, kinetic, equilibrium-phase and
//! surface-complexation reactants, through time steps, exchanging flat
//! numeric vectors instead of driving the solver's script interpreter for
//! every value.
//!
//! # Architecture
//!
//! The crate is built around a dynamic, self-describing schema sitting on
//! top of an opaque numerical solver:
//!
//! 1. **Discovery**: [`matrix::ReactionMatrix::build`] executes the full
//!    reaction-network script once and learns which named quantities
//!    exist per cell and across the population, in a stable,
//!    deterministic union ordering.
//!
//! 2. **Marshaling**: the [`wrapper`] family gives each reactant
//!    category a fixed-size flat `get`/`set` contract against the
//!    solver's live in-memory objects, with exact slot arithmetic per
//!    component and fail-fast name resolution at bind time.
//!
//! 3. **Execution**: one [`engine::CellEngine`] per cell owns a private
//!    solver instance, reconstructed from the cell's dump string; the
//!    [`runner::BatchRunner`] compacts sparse NaN-padded rows into dense
//!    per-cell buffers, dispatches them, and scatters the results back.
//!
//! The solver itself is out of scope: it is consumed through the narrow
//! [`solver::ReactionSolver`] seam, and a deterministic
//! [`solver::ReferenceSolver`] ships for tests, benchmarks and as a
//! template for real backends.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use geochem_rs::prelude::*;
//!
//! // 1. Build the population schema from a database + script pair
//! let factory = Rc::new(ReferenceSolverFactory);
//! let matrix = ReactionMatrix::build(factory, &database, &script, MatrixConfig::default())?;
//!
//! // 2. Export the dense initial table (NaN where a cell lacks a column)
//! let table = matrix.get(ExportLayout::RowMajor, true);
//!
//! // 3. Advance every cell by 100 seconds, in place
//! let mut rows: Vec<_> = (0..table.rows())
//!     .map(|i| nalgebra::DVector::from_row_slice(table.row(i)))
//!     .collect();
//! let mut runner = BatchRunner::new(&matrix)?;
//! runner.run(&mut rows, 100.0)?;
//! ```
//!
//! # Modules
//!
//! - [`chem`]: plain-data reactant state and naming primitives
//! - [`solver`]: the opaque-solver seam, knobs, dump and report parsing
//! - [`wrapper`]: per-category flat get/set marshaling
//! - [`matrix`]: population schema, union ordering, dense export
//! - [`engine`]: one private solver instance per cell
//! - [`runner`]: sparse-row batch dispatch
//! - [`output`]: CSV rendering of dense exports

pub mod chem;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod output;
pub mod runner;
pub mod solver;
pub mod wrapper;

pub use error::{Error, Result};

/// Integer cell identifier, unique within a reaction-network script and
/// assigned by the network definition itself. Negative IDs denote
/// internal solver entities and are excluded from the visible population.
pub type CellId = i32;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use geochem_rs::prelude::*;
    //! ```
    pub use crate::engine::CellEngine;
    pub use crate::matrix::{ExportLayout, FlatExport, MatrixConfig, ReactionMatrix};
    pub use crate::runner::BatchRunner;
    pub use crate::solver::{
        ReactionSolver, ReferenceSolver, ReferenceSolverFactory, SolverFactory, SolverKnobs,
    };
    pub use crate::wrapper::ReactantWrapper;
    pub use crate::{CellId, Error, Result};
}
