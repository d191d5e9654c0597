//! The solver seam
//!
//! The actual chemistry solver (equilibrium speciation, kinetics
//! integration, surface-complexation physics) is an external collaborator.
//! This module defines the narrow interface the rest of the crate consumes:
//!
//! 1. **[`ReactionSolver`]**: one live solver instance. It accepts a
//!    thermodynamic database and a reaction-network script (both opaque
//!    text), advances cells through time steps, snapshots cell state into
//!    the solver's native dump/transfer format, and exposes the live
//!    reactant state of each cell for zero-copy marshaling.
//!
//! 2. **[`SolverFactory`]**: creates fresh, private instances. Every
//!    [`crate::engine::CellEngine`] owns exactly one; instances are never
//!    shared across engines.
//!
//! 3. **[`ReferenceSolver`]**: a deterministic in-memory implementation
//!    used by the test suite and the benchmarks, and as a template for
//!    backends binding a real solver library.
//!
//! Two narrow text-level facilities also live here because they concern the
//! solver's external formats rather than the schema layer:
//!
//! - [`dump::rewrite_cell_number`]: the single regex-level rewrite applied
//!   to a dump string before replaying it into a fresh instance.
//! - [`selected_output`]: locating `SELECTED_OUTPUT` / `USER_PUNCH` blocks
//!   in a script and reading the tab-delimited report the solver emits when
//!   such a block is active.

pub mod dump;
mod interface;
mod knobs;
mod reference;
pub mod selected_output;

pub use interface::{ReactionSolver, SolverFactory};
pub use knobs::SolverKnobs;
pub use reference::{ReferenceSolver, ReferenceSolverFactory};
