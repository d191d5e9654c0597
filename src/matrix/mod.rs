//! Population-level schema and value store
//!
//! A [`ReactionMatrix`] is built once from a database + script pair and
//! captures, for every cell the script defines:
//!
//! - the per-cell, per-category slot-name lists (the cell's own schema),
//! - a snapshot of the current values behind those names,
//! - the per-cell base reactant names needed to re-bind wrappers later,
//! - population-wide metadata: the union Solution ordering, the fixed
//!   surface-primaries set, the solver knobs and the database text.
//!
//! The build is the expensive step: it executes the script in a fresh
//! solver instance and walks the live reactant state of every cell.
//! Afterwards the matrix answers schema queries, point lookups and dense
//! exports without touching the solver again, except for
//! [`ReactionMatrix::dump_string`], which asks the retained build instance
//! to serialize one cell for engine reconstruction.
//!
//! # Sharing
//!
//! Copies of a matrix (and the matrices returned by `subset`/`erase`)
//! share the build instance and metadata behind an `Rc`. Copies are cheap
//! and read-only with respect to the shared part; they must not be
//! mutated concurrently, which the single-threaded design never does.

mod access;
mod build;
mod export;

pub use build::MatrixConfig;
pub use export::{ExportLayout, FlatExport};

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::chem::ReactantCategory;
use crate::solver::selected_output::SelectedOutputBlock;
use crate::solver::{ReactionSolver, SolverFactory, SolverKnobs};
use crate::CellId;

/// A single named scalar tagged with its owning category; the atomic unit
/// stored per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub category: ReactantCategory,
    pub value: f64,
}

/// The ordered list of elements of one cell. Solution elements always
/// occupy the leading prefix.
pub type CellRecord = Vec<Element>;

/// A per-cell base reactant name (exchanger formula, rate name, phase
/// name, surface component or charge name) as the solver knows it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BaseName {
    pub(crate) category: ReactantCategory,
    pub(crate) name: String,
}

/// Metadata shared by all copies of a matrix.
pub(crate) struct MatrixShared {
    pub(crate) factory: Rc<dyn SolverFactory>,
    /// The retained build instance; queried read-only for dump strings.
    pub(crate) solver: Box<dyn ReactionSolver>,
    pub(crate) database: String,
    pub(crate) knobs: SolverKnobs,
    pub(crate) with_h0_o0: bool,
    pub(crate) with_redox: bool,
    pub(crate) selected_output: Option<SelectedOutputBlock>,
}

/// Population-level mapping from cell IDs to their records and schema.
#[derive(Clone)]
pub struct ReactionMatrix {
    pub(crate) shared: Rc<MatrixShared>,
    pub(crate) records: BTreeMap<CellId, CellRecord>,
    pub(crate) internal_names: BTreeMap<CellId, Vec<BaseName>>,
    pub(crate) surface_primaries: BTreeSet<String>,
}

impl std::fmt::Debug for ReactionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionMatrix")
            .field("ids", &self.records.keys().collect::<Vec<_>>())
            .field("with_redox", &self.shared.with_redox)
            .finish_non_exhaustive()
    }
}

impl ReactionMatrix {
    /// All cell IDs, ascending.
    pub fn ids(&self) -> Vec<CellId> {
        self.records.keys().copied().collect()
    }

    /// Whether a cell with the given ID exists.
    pub fn contains(&self, cell: CellId) -> bool {
        self.records.contains_key(&cell)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// The union Solution slot-name list shared by every cell, starting
    /// with the essential prefix. Empty for an empty matrix.
    pub fn solution_names(&self) -> Vec<String> {
        let Some(first) = self.records.values().next() else {
            return Vec::new();
        };
        first
            .iter()
            .take_while(|element| element.category == ReactantCategory::Solution)
            .map(|element| element.name.clone())
            .collect()
    }

    /// Base exchanger formulas of one cell. Empty if the cell defines no
    /// exchange (or does not exist).
    pub fn exchange_names(&self, cell: CellId) -> Vec<String> {
        self.base_names(cell, ReactantCategory::Exchange)
    }

    /// Base kinetic rate names of one cell.
    pub fn kinetics_names(&self, cell: CellId) -> Vec<String> {
        self.base_names(cell, ReactantCategory::Kinetic)
    }

    /// Base equilibrium-phase names of one cell.
    pub fn equilibrium_names(&self, cell: CellId) -> Vec<String> {
        self.base_names(cell, ReactantCategory::Equilibrium)
    }

    /// Base surface component formulas of one cell.
    pub fn surface_component_names(&self, cell: CellId) -> Vec<String> {
        self.base_names(cell, ReactantCategory::SurfaceComponent)
    }

    /// Base surface charge names of one cell.
    pub fn surface_charge_names(&self, cell: CellId) -> Vec<String> {
        self.base_names(cell, ReactantCategory::SurfaceCharge)
    }

    /// The population-wide primary-element set surface charge planes
    /// track, fixed at first surface discovery.
    pub fn surface_primaries(&self) -> &BTreeSet<String> {
        &self.surface_primaries
    }

    /// The database text the matrix was built from.
    pub fn database(&self) -> &str {
        &self.shared.database
    }

    /// Solver knobs captured at build time.
    pub fn knobs(&self) -> SolverKnobs {
        self.shared.knobs
    }

    /// Whether redox valence states are tracked in Solution slots.
    pub fn with_redox(&self) -> bool {
        self.shared.with_redox
    }

    /// The factory producing private solver instances for engines.
    pub fn factory(&self) -> Rc<dyn SolverFactory> {
        Rc::clone(&self.shared.factory)
    }

    /// The `SELECTED_OUTPUT`/`USER_PUNCH` block found in the script, if
    /// any.
    pub fn selected_output(&self) -> Option<&SelectedOutputBlock> {
        self.shared.selected_output.as_ref()
    }

    fn base_names(&self, cell: CellId, category: ReactantCategory) -> Vec<String> {
        match self.internal_names.get(&cell) {
            Some(names) => names
                .iter()
                .filter(|base| base.category == category)
                .map(|base| base.name.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
