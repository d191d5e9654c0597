//! Exchange wrapper
//!
//! Every exchanger species contributes five fixed slots (the formula
//! total, charge balance, log activity, phase proportion, formula charge)
//! plus one slot per non-formula total tracked against it.

use crate::chem::{ExchangeComponent, ExchangeState, ReactantCategory};
use crate::error::{Error, Result};
use crate::solver::ReactionSolver;
use crate::wrapper::ReactantWrapper;
use crate::CellId;

/// Slots preceding the per-species totals.
const NUM_NOT_TOTALS: usize = 5;

#[derive(Debug, Clone)]
struct ComponentSlot {
    /// Index into the assemblage's component list.
    index: usize,
    width: usize,
}

/// Flat view of one cell's exchange assemblage.
#[derive(Debug, Clone)]
pub struct ExchangeWrapper {
    cell: CellId,
    slots: Vec<ComponentSlot>,
    len: usize,
}

impl ExchangeWrapper {
    /// Binds the named exchanger species, in the given order. Every
    /// formula must resolve against the live assemblage.
    pub fn bind(solver: &dyn ReactionSolver, cell: CellId, formulas: &[String]) -> Result<Self> {
        let exchange = solver.exchange(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::Exchange,
            name: format!("exchange {cell}"),
        })?;

        let mut slots = Vec::with_capacity(formulas.len());
        let mut len = 0;

        for formula in formulas {
            let index = exchange
                .components
                .iter()
                .position(|comp| &comp.formula == formula)
                .ok_or_else(|| Error::ComponentMissing {
                    category: ReactantCategory::Exchange,
                    name: formula.clone(),
                })?;

            let comp = &exchange.components[index];
            if !comp.totals.contains(formula) {
                return Err(Error::ComponentMissing {
                    category: ReactantCategory::Exchange,
                    name: formula.clone(),
                });
            }

            let width = NUM_NOT_TOTALS + comp.totals.len() - 1;
            slots.push(ComponentSlot { index, width });
            len += width;
        }

        Ok(ExchangeWrapper { cell, slots, len })
    }

    /// Canonical slot names plus the base formulas used to re-bind the
    /// wrapper later.
    ///
    /// Per species: the formula itself, four derived names, then one
    /// `<total><formula>` name per non-formula total.
    pub fn names(exchange: &ExchangeState) -> (Vec<String>, Vec<String>) {
        let mut slot_names = Vec::new();
        let mut formulas = Vec::with_capacity(exchange.components.len());

        for comp in &exchange.components {
            let formula = &comp.formula;
            formulas.push(formula.clone());

            slot_names.push(formula.clone());
            slot_names.push(format!("{formula}_cb"));
            slot_names.push(format!("{formula}_la"));
            slot_names.push(format!("{formula}_phase_proportion"));
            slot_names.push(format!("{formula}_formular_z"));

            for (total, _) in comp.totals.iter() {
                if total == formula {
                    continue;
                }
                slot_names.push(format!("{total}{formula}"));
            }
        }

        (slot_names, formulas)
    }

    fn resolve<'a>(&self, exchange: &'a ExchangeState, slot: &ComponentSlot) -> &'a ExchangeComponent {
        &exchange.components[slot.index]
    }
}

impl ReactantWrapper for ExchangeWrapper {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.len);
        let cell = self.cell;
        let exchange = solver.exchange(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::Exchange,
            name: format!("exchange {cell}"),
        })?;

        let mut offset = 0;
        for slot in &self.slots {
            let comp = self.resolve(exchange, slot);
            let span = &mut out[offset..offset + slot.width];

            span[0] = comp
                .totals
                .get(&comp.formula)
                .expect("formula total verified at bind time");
            span[1] = comp.charge_balance;
            span[2] = comp.log_activity;
            span[3] = comp.phase_proportion;
            span[4] = comp.formula_charge;

            let mut i = NUM_NOT_TOTALS;
            for (name, value) in comp.totals.iter() {
                if name != comp.formula {
                    span[i] = value;
                    i += 1;
                }
            }

            offset += slot.width;
        }

        Ok(())
    }

    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()> {
        debug_assert_eq!(data.len(), self.len);
        let cell = self.cell;
        let exchange = solver
            .exchange_mut(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::Exchange,
                name: format!("exchange {cell}"),
            })?;

        let mut offset = 0;
        for slot in &self.slots {
            let comp = &mut exchange.components[slot.index];
            let span = &data[offset..offset + slot.width];

            let formula = comp.formula.clone();
            comp.totals.set(&formula, span[0]);
            comp.charge_balance = span[1];
            comp.log_activity = span[2];
            comp.phase_proportion = span[3];
            comp.formula_charge = span[4];

            let mut i = NUM_NOT_TOTALS;
            for (name, value) in comp.totals.iter_mut() {
                if name != formula {
                    *value = span[i];
                    i += 1;
                }
            }

            offset += slot.width;
        }

        Ok(())
    }
}
