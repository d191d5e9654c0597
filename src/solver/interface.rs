//! Traits implemented by solver backends

use crate::chem::{
    EquilibriumState, ExchangeState, KineticsState, MasterTable, SolutionState, SurfaceState,
};
use crate::error::Result;
use crate::solver::SolverKnobs;
use crate::CellId;

/// One live solver instance.
///
/// An instance owns the full reactant state of every cell its script
/// defined. The schema layer never interprets database or script text
/// itself: both pass through verbatim. What this layer *does* rely on is
/// the introspection surface: the per-cell reactant state returned by the
/// accessor methods, against which the wrappers resolve names eagerly and
/// marshal values directly.
///
/// Calls are synchronous and blocking; there is no cancellation. A
/// pathological reaction network can block indefinitely, and that is the
/// caller's problem by design.
///
/// Implementations must be `Send`: an instance is only ever driven by one
/// engine at a time, but independent engines may be advanced from worker
/// threads (see `BatchRunner::run_parallel`).
pub trait ReactionSolver: Send {
    /// Loads a thermodynamic database. Fatal on any reported error.
    fn load_database(&mut self, database: &str) -> Result<()>;

    /// Executes a reaction-network script (or a dump string; the dump
    /// format is a script in the solver's transfer grammar). Fatal on any
    /// reported error; the instance must not be left half-modified.
    fn run_script(&mut self, script: &str) -> Result<()>;

    /// Advances one cell by `time_step` seconds.
    fn advance(&mut self, cell: CellId, time_step: f64) -> Result<()>;

    /// Structural re-initialization hook for a cell's solution, invoked
    /// after new totals have been pushed in and before an advance.
    fn reinitialize_solution(&mut self, cell: CellId) -> Result<()>;

    /// Serializes one cell's full reactant state into the solver's native
    /// textual transfer format.
    fn dump_cell(&self, cell: CellId) -> Result<String>;

    /// Reads the numerical-method control parameters.
    fn knobs(&self) -> SolverKnobs;

    /// Writes the numerical-method control parameters verbatim.
    fn apply_knobs(&mut self, knobs: &SolverKnobs);

    /// All cell IDs defined by the executed script, including negative
    /// (internal) ones. Callers filter those out.
    fn cell_ids(&self) -> Vec<CellId>;

    fn solution(&self, cell: CellId) -> Option<&SolutionState>;
    fn solution_mut(&mut self, cell: CellId) -> Option<&mut SolutionState>;

    fn exchange(&self, cell: CellId) -> Option<&ExchangeState>;
    fn exchange_mut(&mut self, cell: CellId) -> Option<&mut ExchangeState>;

    fn kinetics(&self, cell: CellId) -> Option<&KineticsState>;
    fn kinetics_mut(&mut self, cell: CellId) -> Option<&mut KineticsState>;

    fn equilibrium(&self, cell: CellId) -> Option<&EquilibriumState>;
    fn equilibrium_mut(&mut self, cell: CellId) -> Option<&mut EquilibriumState>;

    fn surface(&self, cell: CellId) -> Option<&SurfaceState>;
    fn surface_mut(&mut self, cell: CellId) -> Option<&mut SurfaceState>;

    /// The loaded database's master-species table, in declaration order.
    fn master_table(&self) -> &MasterTable;

    /// All aqueous species names known to the loaded database. Used to
    /// re-resolve exchanger formulas to full species names by longest
    /// prefix match.
    fn species_names(&self) -> &[String];

    /// The text the solver emitted for its selected-output report, if a
    /// `SELECTED_OUTPUT` block is active.
    fn selected_output_text(&self) -> Option<&str>;
}

/// Creates fresh, private [`ReactionSolver`] instances.
///
/// A matrix holds one factory handle and hands it to every engine it
/// spawns; each `create` call must return an instance with no shared
/// mutable state, so engines can in principle run in parallel.
pub trait SolverFactory {
    fn create(&self) -> Box<dyn ReactionSolver>;
}
