//! Matrix construction: discovery of names, values and metadata
//!
//! Building walks every non-negative cell once, resolves the five
//! category name lists against the live solver state and snapshots the
//! current values. Reaction-network errors are never recoverable here:
//! construction either fully succeeds or fails with the solver's
//! diagnosis.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use log::{debug, error, info};

use crate::chem::{ReactantCategory, NUM_ESSENTIALS};
use crate::error::{Error, Result};
use crate::matrix::{BaseName, Element, MatrixShared, ReactionMatrix};
use crate::solver::selected_output::{self, SelectedOutputBlock};
use crate::solver::{ReactionSolver, SolverFactory};
use crate::wrapper::{
    EquilibriumWrapper, ExchangeWrapper, KineticsWrapper, ReactantWrapper, SolutionWrapper,
    SurfaceWrapper,
};
use crate::CellId;

/// Name-expansion switches threaded through every resolution call. No
/// process-wide state is involved: two matrices with different configs
/// can coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixConfig {
    /// Include the `H(0)`/`O(0)` placeholder slots.
    pub with_h0_o0: bool,
    /// Track redox valence sub-states instead of folding them into their
    /// parent elements.
    pub with_redox: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        MatrixConfig {
            with_h0_o0: false,
            with_redox: true,
        }
    }
}

impl ReactionMatrix {
    /// Builds a matrix by executing `script` against a fresh solver
    /// instance loaded with `database`.
    ///
    /// # Errors
    ///
    /// [`Error::Script`] when the solver rejects the database or script;
    /// [`Error::Contract`] when the solver state contradicts its own
    /// contracts (a cell without a solution, an unresolvable master
    /// species); [`Error::SelectedOutput`] for malformed selected-output
    /// arrangements.
    pub fn build(
        factory: Rc<dyn SolverFactory>,
        database: &str,
        script: &str,
        config: MatrixConfig,
    ) -> Result<Self> {
        let mut solver = factory.create();
        solver.load_database(database).inspect_err(|err| {
            error!("database rejected: {err}");
        })?;
        solver.run_script(script).inspect_err(|err| {
            error!("reaction script rejected: {err}");
        })?;

        let selected_output = SelectedOutputBlock::from_script(script)?;
        if selected_output.is_some() {
            if let Some(report) = solver.selected_output_text() {
                let headings = selected_output::parse_headings(report)?;
                let values = selected_output::parse_values(report);
                if headings.len() != values.len() {
                    return Err(Error::SelectedOutput(format!(
                        "{} headings but {} values in selected output",
                        headings.len(),
                        values.len()
                    )));
                }
            }
        }

        let knobs = solver.knobs();
        let cells: Vec<CellId> = solver
            .cell_ids()
            .into_iter()
            .filter(|id| *id >= 0)
            .collect();

        // Surface diffuse-layer state only exists after an advance; a
        // zero-length step materializes it without moving time forward.
        for &cell in &cells {
            if solver.surface(cell).is_some() {
                debug!("materializing surface state of cell {cell}");
                solver.advance(cell, 0.0)?;
            }
        }

        let solution_names = union_solution_names(&*solver, &cells, config)?;

        let mut records = BTreeMap::new();
        let mut internal_names = BTreeMap::new();
        let mut surface_primaries = BTreeSet::new();

        for &cell in &cells {
            let (elements, bases) = snapshot_cell(
                &*solver,
                cell,
                &solution_names,
                config,
                &mut surface_primaries,
            )?;
            records.insert(cell, elements);
            internal_names.insert(cell, bases);
        }

        info!(
            "built reaction matrix: {} cells, {} solution columns",
            records.len(),
            solution_names.len()
        );

        Ok(ReactionMatrix {
            shared: Rc::new(MatrixShared {
                factory,
                solver,
                database: database.to_string(),
                knobs,
                with_h0_o0: config.with_h0_o0,
                with_redox: config.with_redox,
                selected_output,
            }),
            records,
            internal_names,
            surface_primaries,
        })
    }
}

/// Resolves one cell's solution name list, with valence expansion when
/// redox tracking is on.
fn cell_solution_names(
    solver: &dyn ReactionSolver,
    cell: CellId,
    config: MatrixConfig,
) -> Result<Vec<String>> {
    let solution = solver
        .solution(cell)
        .ok_or_else(|| Error::Contract(format!("cell {cell} defines no solution")))?;

    let names = SolutionWrapper::names(solution, config.with_h0_o0, config.with_redox);
    if config.with_redox {
        solver.master_table().expand_valence_states(&names)
    } else {
        Ok(names)
    }
}

/// The union Solution ordering across all cells: the fixed prefix
/// (essentials plus optional placeholders, identical for every cell by
/// construction) followed by the sorted union of the per-cell tails.
fn union_solution_names(
    solver: &dyn ReactionSolver,
    cells: &[CellId],
    config: MatrixConfig,
) -> Result<Vec<String>> {
    let prefix_len = NUM_ESSENTIALS + if config.with_h0_o0 { 2 } else { 0 };

    let mut union: Option<Vec<String>> = None;
    let mut tails = BTreeSet::new();

    for &cell in cells {
        let names = cell_solution_names(solver, cell, config)?;
        tails.extend(names[prefix_len..].iter().cloned());
        if union.is_none() {
            union = Some(names[..prefix_len].to_vec());
        }
    }

    let mut names = union.unwrap_or_default();
    names.extend(tails);
    Ok(names)
}

/// Snapshots one cell: resolves all five category name lists, reads the
/// current values through freshly bound wrappers and records the base
/// reactant names.
fn snapshot_cell(
    solver: &dyn ReactionSolver,
    cell: CellId,
    solution_names: &[String],
    config: MatrixConfig,
    surface_primaries: &mut BTreeSet<String>,
) -> Result<(Vec<Element>, Vec<BaseName>)> {
    let mut elements = Vec::new();
    let mut bases = Vec::new();

    // Solution: every cell is bound against the union ordering, so the
    // solution columns are common to the whole population.
    let wrapper = SolutionWrapper::bind(solver, cell, solution_names, config.with_redox)?;
    snapshot_category(
        solver,
        &wrapper,
        solution_names,
        ReactantCategory::Solution,
        &mut elements,
    )?;

    // Exchange
    let exchange_names = solver.exchange(cell).map(ExchangeWrapper::names);
    let has_exchange = exchange_names.is_some();
    if let Some((slot_names, formulas)) = exchange_names {
        bases.extend(formulas.iter().map(|name| BaseName {
            category: ReactantCategory::Exchange,
            name: name.clone(),
        }));
        let wrapper = ExchangeWrapper::bind(solver, cell, &formulas)?;
        snapshot_category(
            solver,
            &wrapper,
            &slot_names,
            ReactantCategory::Exchange,
            &mut elements,
        )?;
    }

    // Kinetics
    if let Some((slot_names, rate_names)) = solver.kinetics(cell).map(KineticsWrapper::names) {
        bases.extend(rate_names.iter().map(|name| BaseName {
            category: ReactantCategory::Kinetic,
            name: name.clone(),
        }));
        let wrapper = KineticsWrapper::bind(solver, cell, &rate_names)?;
        snapshot_category(
            solver,
            &wrapper,
            &slot_names,
            ReactantCategory::Kinetic,
            &mut elements,
        )?;
    }

    // Equilibrium phases
    if let Some((slot_names, phase_names)) = solver.equilibrium(cell).map(EquilibriumWrapper::names)
    {
        bases.extend(phase_names.iter().map(|name| BaseName {
            category: ReactantCategory::Equilibrium,
            name: name.clone(),
        }));
        let wrapper = EquilibriumWrapper::bind(solver, cell, &phase_names)?;
        snapshot_category(
            solver,
            &wrapper,
            &slot_names,
            ReactantCategory::Equilibrium,
            &mut elements,
        )?;
    }

    // Surface
    if let Some(surface) = solver.surface(cell) {
        // The primaries set is established by the first cell defining a
        // surface and reused verbatim by every later one.
        if surface_primaries.is_empty() {
            *surface_primaries = discover_surface_primaries(solver, solution_names);
        }

        let names = SurfaceWrapper::names(surface, surface_primaries);
        bases.extend(names.component_formulas.iter().map(|name| BaseName {
            category: ReactantCategory::SurfaceComponent,
            name: name.clone(),
        }));
        bases.extend(names.charge_names.iter().map(|name| BaseName {
            category: ReactantCategory::SurfaceCharge,
            name: name.clone(),
        }));

        let wrapper = SurfaceWrapper::bind(
            solver,
            cell,
            surface_primaries,
            &names.component_formulas,
            &names.charge_names,
        )?;

        let mut values = vec![0.0; wrapper.len()];
        wrapper.get(solver, &mut values)?;
        let (comp_values, charge_values) = values.split_at(names.component_slots.len());
        push_elements(
            &names.component_slots,
            comp_values,
            ReactantCategory::SurfaceComponent,
            &mut elements,
        );
        push_elements(
            &names.charge_slots,
            charge_values,
            ReactantCategory::SurfaceCharge,
            &mut elements,
        );
    }

    // Exchanger formulas resolve to their full solver-internal species
    // names by prefix match, to disambiguate redox sub-species.
    if has_exchange {
        for element in elements
            .iter_mut()
            .filter(|e| e.category == ReactantCategory::Exchange)
        {
            if let Some(species) = solver
                .species_names()
                .iter()
                .find(|species| species.starts_with(&element.name))
            {
                element.name = species.clone();
            }
        }
    }

    Ok((elements, bases))
}

/// H and O are fixed primaries; every solution total past the
/// H/O/Charge prefix contributes its primary master element. Names that
/// resolve to no master (the remaining essentials) drop out naturally.
fn discover_surface_primaries(
    solver: &dyn ReactionSolver,
    solution_names: &[String],
) -> BTreeSet<String> {
    let mut primaries = BTreeSet::new();
    primaries.insert("H".to_string());
    primaries.insert("O".to_string());

    for name in solution_names.iter().skip(3) {
        if let Some(primary) = solver.master_table().primary_of(name) {
            primaries.insert(primary.to_string());
        }
    }

    primaries
}

fn snapshot_category(
    solver: &dyn ReactionSolver,
    wrapper: &dyn ReactantWrapper,
    slot_names: &[String],
    category: ReactantCategory,
    elements: &mut Vec<Element>,
) -> Result<()> {
    let mut values = vec![0.0; wrapper.len()];
    wrapper.get(solver, &mut values)?;
    push_elements(slot_names, &values, category, elements);
    Ok(())
}

fn push_elements(
    slot_names: &[String],
    values: &[f64],
    category: ReactantCategory,
    elements: &mut Vec<Element>,
) {
    debug_assert_eq!(slot_names.len(), values.len());
    elements.extend(
        slot_names
            .iter()
            .zip(values)
            .map(|(name, value)| Element {
                name: name.clone(),
                category,
                value: *value,
            }),
    );
}
