//! Per-cell simulation engine
//!
//! A [`CellEngine`] owns one private solver instance bound to exactly one
//! cell. Construction replays the cell's reaction state, via the matrix's
//! canonical dump string renumbered to cell 1, into a fresh instance,
//! propagates the solver knobs captured at matrix build time, and binds
//! one category wrapper per reactant category the cell defines.
//!
//! [`CellEngine::run_cell`] is the single operation: marshal a flat vector
//! in, advance the solver by one time step, marshal the results back out.
//! The engine is stateful: successive calls accumulate simulated time in
//! the private instance.

use log::debug;

use crate::error::{Error, Result};
use crate::matrix::ReactionMatrix;
use crate::solver::dump::{rewrite_cell_number, ENGINE_CELL};
use crate::solver::ReactionSolver;
use crate::wrapper::{
    EquilibriumWrapper, ExchangeWrapper, KineticsWrapper, ReactantWrapper, SolutionWrapper,
    SurfaceWrapper,
};
use crate::CellId;

/// One cell's private solver instance plus its bound category wrappers.
pub struct CellEngine {
    solver: Box<dyn ReactionSolver>,
    solution: SolutionWrapper,
    exchange: Option<ExchangeWrapper>,
    kinetics: Option<KineticsWrapper>,
    equilibrium: Option<EquilibriumWrapper>,
    surface: Option<SurfaceWrapper>,
    width: usize,
}

impl CellEngine {
    /// Builds an engine for one cell of a matrix.
    ///
    /// Fails with [`Error::InvalidArgument`] when the cell ID is absent
    /// from the matrix; construction either fully succeeds or leaves
    /// nothing behind.
    pub fn new(matrix: &ReactionMatrix, cell: CellId) -> Result<Self> {
        if !matrix.contains(cell) {
            return Err(Error::InvalidArgument(format!(
                "cell {cell} does not exist in the matrix"
            )));
        }

        let mut solver = matrix.factory().create();
        solver.load_database(matrix.database())?;
        solver.apply_knobs(&matrix.knobs());

        let dump = matrix.dump_string(cell)?;
        solver.run_script(&rewrite_cell_number(&dump))?;

        if let Some(block) = matrix.selected_output() {
            solver.run_script(block.text())?;
        }

        debug!("engine for cell {cell}: private instance restored");

        // All wrappers bind against the renumbered cell. Absence of a
        // category in this specific cell is normal and skips the wrapper.
        let solution = SolutionWrapper::bind(
            &*solver,
            ENGINE_CELL,
            &matrix.solution_names(),
            matrix.with_redox(),
        )?;

        let exchange = match solver.exchange(ENGINE_CELL) {
            Some(_) => Some(ExchangeWrapper::bind(
                &*solver,
                ENGINE_CELL,
                &matrix.exchange_names(cell),
            )?),
            None => None,
        };

        let kinetics = match solver.kinetics(ENGINE_CELL) {
            Some(_) => Some(KineticsWrapper::bind(
                &*solver,
                ENGINE_CELL,
                &matrix.kinetics_names(cell),
            )?),
            None => None,
        };

        let equilibrium = match solver.equilibrium(ENGINE_CELL) {
            Some(_) => Some(EquilibriumWrapper::bind(
                &*solver,
                ENGINE_CELL,
                &matrix.equilibrium_names(cell),
            )?),
            None => None,
        };

        let surface = match solver.surface(ENGINE_CELL) {
            Some(_) => Some(SurfaceWrapper::bind(
                &*solver,
                ENGINE_CELL,
                matrix.surface_primaries(),
                &matrix.surface_component_names(cell),
                &matrix.surface_charge_names(cell),
            )?),
            None => None,
        };

        let width = 1
            + solution.len()
            + exchange.as_ref().map_or(0, ReactantWrapper::len)
            + kinetics.as_ref().map_or(0, ReactantWrapper::len)
            + equilibrium.as_ref().map_or(0, ReactantWrapper::len)
            + surface.as_ref().map_or(0, ReactantWrapper::len);

        Ok(CellEngine {
            solver,
            solution,
            exchange,
            kinetics,
            equilibrium,
            surface,
            width,
        })
    }

    /// Slot count of this cell's own dense schema: the leading ID slot
    /// plus every bound wrapper slot.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Advances this cell by one time step.
    ///
    /// `values` is the cell's own dense schema; `values[0]` is the ID
    /// slot, which is ignored and never passed to a wrapper. The
    /// remainder is pushed into the solver, the solution is structurally
    /// re-initialized, the solver advances, and the results overwrite
    /// `values` in place.
    ///
    /// A negative time step or a wrong buffer width is rejected before
    /// anything is mutated.
    pub fn run_cell(&mut self, values: &mut [f64], time_step: f64) -> Result<()> {
        if time_step < 0.0 {
            return Err(Error::InvalidArgument(
                "time step must be non-negative".to_string(),
            ));
        }
        if values.len() != self.width {
            return Err(Error::InvalidArgument(format!(
                "expected {} slots (ID + cell schema), got {}",
                self.width,
                values.len()
            )));
        }

        let data = &mut values[1..];
        self.push_values(data)?;
        self.solver.reinitialize_solution(ENGINE_CELL)?;
        self.solver.advance(ENGINE_CELL, time_step)?;
        self.pull_values(data)?;
        Ok(())
    }

    /// `set` into every bound wrapper, fixed category order.
    fn push_values(&mut self, data: &[f64]) -> Result<()> {
        let Self {
            solver,
            solution,
            exchange,
            kinetics,
            equilibrium,
            surface,
            ..
        } = self;

        let mut offset = 0;
        offset = set_span(solution, solver.as_mut(), data, offset)?;
        if let Some(wrapper) = exchange {
            offset = set_span(wrapper, solver.as_mut(), data, offset)?;
        }
        if let Some(wrapper) = kinetics {
            offset = set_span(wrapper, solver.as_mut(), data, offset)?;
        }
        if let Some(wrapper) = equilibrium {
            offset = set_span(wrapper, solver.as_mut(), data, offset)?;
        }
        if let Some(wrapper) = surface {
            set_span(wrapper, solver.as_mut(), data, offset)?;
        }
        Ok(())
    }

    /// `get` from every bound wrapper, same fixed order.
    fn pull_values(&mut self, data: &mut [f64]) -> Result<()> {
        let Self {
            solver,
            solution,
            exchange,
            kinetics,
            equilibrium,
            surface,
            ..
        } = self;

        let mut offset = 0;
        offset = get_span(solution, solver.as_ref(), data, offset)?;
        if let Some(wrapper) = exchange {
            offset = get_span(wrapper, solver.as_ref(), data, offset)?;
        }
        if let Some(wrapper) = kinetics {
            offset = get_span(wrapper, solver.as_ref(), data, offset)?;
        }
        if let Some(wrapper) = equilibrium {
            offset = get_span(wrapper, solver.as_ref(), data, offset)?;
        }
        if let Some(wrapper) = surface {
            get_span(wrapper, solver.as_ref(), data, offset)?;
        }
        Ok(())
    }
}

fn set_span(
    wrapper: &impl ReactantWrapper,
    solver: &mut dyn ReactionSolver,
    data: &[f64],
    offset: usize,
) -> Result<usize> {
    let end = offset + wrapper.len();
    wrapper.set(solver, &data[offset..end])?;
    Ok(end)
}

fn get_span(
    wrapper: &impl ReactantWrapper,
    solver: &dyn ReactionSolver,
    data: &mut [f64],
    offset: usize,
) -> Result<usize> {
    let end = offset + wrapper.len();
    wrapper.get(solver, &mut data[offset..end])?;
    Ok(end)
}
