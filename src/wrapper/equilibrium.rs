//! Equilibrium-phase wrapper
//!
//! Every equilibrium phase contributes exactly two slots: current moles
//! and saturation index. Marshaling follows the bound name order, not the
//! assemblage's storage order.

use crate::chem::{EquilibriumState, ReactantCategory};
use crate::error::{Error, Result};
use crate::solver::ReactionSolver;
use crate::wrapper::ReactantWrapper;
use crate::CellId;

/// Slots per phase: moles and saturation index.
const SLOTS_PER_PHASE: usize = 2;

/// Flat view of one cell's equilibrium-phase assemblage.
#[derive(Debug, Clone)]
pub struct EquilibriumWrapper {
    cell: CellId,
    /// Phase indices in bound order.
    order: Vec<usize>,
}

impl EquilibriumWrapper {
    /// Binds the named phases, in the given order.
    pub fn bind(solver: &dyn ReactionSolver, cell: CellId, phase_names: &[String]) -> Result<Self> {
        let equilibrium = solver
            .equilibrium(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::Equilibrium,
                name: format!("equilibrium {cell}"),
            })?;

        let order = phase_names
            .iter()
            .map(|name| {
                equilibrium
                    .phases
                    .iter()
                    .position(|phase| &phase.name == name)
                    .ok_or_else(|| Error::ComponentMissing {
                        category: ReactantCategory::Equilibrium,
                        name: name.clone(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(EquilibriumWrapper { cell, order })
    }

    /// Canonical slot names plus the base phase names: `<phase>_eq`
    /// (moles) and `<phase>_si` (saturation index).
    pub fn names(equilibrium: &EquilibriumState) -> (Vec<String>, Vec<String>) {
        let mut slot_names = Vec::with_capacity(equilibrium.phases.len() * SLOTS_PER_PHASE);
        let mut phase_names = Vec::with_capacity(equilibrium.phases.len());

        for phase in &equilibrium.phases {
            phase_names.push(phase.name.clone());
            slot_names.push(format!("{}_eq", phase.name));
            slot_names.push(format!("{}_si", phase.name));
        }

        (slot_names, phase_names)
    }
}

impl ReactantWrapper for EquilibriumWrapper {
    fn len(&self) -> usize {
        self.order.len() * SLOTS_PER_PHASE
    }

    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.len());
        let cell = self.cell;
        let equilibrium = solver
            .equilibrium(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::Equilibrium,
                name: format!("equilibrium {cell}"),
            })?;

        for (i, &index) in self.order.iter().enumerate() {
            let phase = &equilibrium.phases[index];
            out[i * SLOTS_PER_PHASE] = phase.moles;
            out[i * SLOTS_PER_PHASE + 1] = phase.saturation_index;
        }

        Ok(())
    }

    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()> {
        debug_assert_eq!(data.len(), self.len());
        let cell = self.cell;
        let equilibrium = solver
            .equilibrium_mut(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::Equilibrium,
                name: format!("equilibrium {cell}"),
            })?;

        for (i, &index) in self.order.iter().enumerate() {
            let phase = &mut equilibrium.phases[index];
            phase.moles = data[i * SLOTS_PER_PHASE];
            phase.saturation_index = data[i * SLOTS_PER_PHASE + 1];
        }

        Ok(())
    }
}
