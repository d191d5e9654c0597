//! Kinetics wrapper
//!
//! A kinetic reactant contributes one slot for its current moles plus one
//! slot per declared rate-law parameter, suffixed positionally.

use crate::chem::{KineticsState, ReactantCategory};
use crate::error::{Error, Result};
use crate::solver::ReactionSolver;
use crate::wrapper::ReactantWrapper;
use crate::CellId;

#[derive(Debug, Clone)]
struct ComponentSlot {
    index: usize,
    width: usize,
}

/// Flat view of one cell's kinetic assemblage.
#[derive(Debug, Clone)]
pub struct KineticsWrapper {
    cell: CellId,
    slots: Vec<ComponentSlot>,
    len: usize,
}

impl KineticsWrapper {
    /// Binds the named kinetic reactants, in the given order.
    pub fn bind(solver: &dyn ReactionSolver, cell: CellId, rate_names: &[String]) -> Result<Self> {
        let kinetics = solver.kinetics(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::Kinetic,
            name: format!("kinetics {cell}"),
        })?;

        let mut slots = Vec::with_capacity(rate_names.len());
        let mut len = 0;

        for rate_name in rate_names {
            let index = kinetics
                .components
                .iter()
                .position(|comp| &comp.rate_name == rate_name)
                .ok_or_else(|| Error::ComponentMissing {
                    category: ReactantCategory::Kinetic,
                    name: rate_name.clone(),
                })?;

            let width = 1 + kinetics.components[index].parameters.len();
            slots.push(ComponentSlot { index, width });
            len += width;
        }

        Ok(KineticsWrapper { cell, slots, len })
    }

    /// Canonical slot names plus the base rate names: `<rate>_kin`
    /// followed by `<rate>_p1`, `<rate>_p2`, ….
    pub fn names(kinetics: &KineticsState) -> (Vec<String>, Vec<String>) {
        let mut slot_names = Vec::new();
        let mut rate_names = Vec::with_capacity(kinetics.components.len());

        for comp in &kinetics.components {
            rate_names.push(comp.rate_name.clone());
            slot_names.push(format!("{}_kin", comp.rate_name));
            for i in 0..comp.parameters.len() {
                slot_names.push(format!("{}_p{}", comp.rate_name, i + 1));
            }
        }

        (slot_names, rate_names)
    }
}

impl ReactantWrapper for KineticsWrapper {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.len);
        let cell = self.cell;
        let kinetics = solver.kinetics(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::Kinetic,
            name: format!("kinetics {cell}"),
        })?;

        let mut offset = 0;
        for slot in &self.slots {
            let comp = &kinetics.components[slot.index];
            let span = &mut out[offset..offset + slot.width];

            span[0] = comp.moles;
            span[1..].copy_from_slice(&comp.parameters);

            offset += slot.width;
        }

        Ok(())
    }

    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()> {
        debug_assert_eq!(data.len(), self.len);
        let cell = self.cell;
        let kinetics = solver
            .kinetics_mut(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::Kinetic,
                name: format!("kinetics {cell}"),
            })?;

        let mut offset = 0;
        for slot in &self.slots {
            let comp = &mut kinetics.components[slot.index];
            let span = &data[offset..offset + slot.width];

            comp.moles = span[0];
            comp.parameters.copy_from_slice(&span[1..]);

            offset += slot.width;
        }

        Ok(())
    }
}
