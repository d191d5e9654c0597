//! Surface wrapper
//!
//! A surface assemblage marshals in two parts: binding-site components
//! first, charge planes second. Components contribute three fixed slots
//! (moles, log activity, charge balance) plus their totals; charge planes
//! contribute five fixed slots (area, grams, charge balance, water mass,
//! potential log activity) plus one slot per tracked primary element.
//!
//! The primary-element set is fixed population-wide at first surface
//! discovery and must be passed identically to `names` and `bind`.

use std::collections::BTreeSet;

use crate::chem::{ReactantCategory, SurfaceState};
use crate::error::{Error, Result};
use crate::solver::ReactionSolver;
use crate::wrapper::ReactantWrapper;
use crate::CellId;

const COMP_NUM_NOT_TOTALS: usize = 3;
const CHARGE_NUM_NOT_TOTALS: usize = 5;

/// Slot-name lists of one surface assemblage, split the way the schema
/// layer records them.
#[derive(Debug, Clone, Default)]
pub struct SurfaceNames {
    pub component_slots: Vec<String>,
    pub charge_slots: Vec<String>,
    pub component_formulas: Vec<String>,
    pub charge_names: Vec<String>,
}

#[derive(Debug, Clone)]
struct ComponentSlot {
    index: usize,
    /// Total names snapshotted at bind time; `set` re-creates the totals
    /// map from exactly these keys.
    total_names: Vec<String>,
}

#[derive(Debug, Clone)]
struct ChargeSlot {
    index: usize,
}

/// Flat view of one cell's surface assemblage.
#[derive(Debug, Clone)]
pub struct SurfaceWrapper {
    cell: CellId,
    components: Vec<ComponentSlot>,
    charges: Vec<ChargeSlot>,
    /// Sorted primary elements; iteration order defines the diffuse-layer
    /// slot layout of every charge plane.
    primaries: Vec<String>,
    len: usize,
}

impl SurfaceWrapper {
    /// Binds the named components and charge planes, in the given order.
    pub fn bind(
        solver: &dyn ReactionSolver,
        cell: CellId,
        primaries: &BTreeSet<String>,
        component_formulas: &[String],
        charge_names: &[String],
    ) -> Result<Self> {
        let surface = solver.surface(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::SurfaceComponent,
            name: format!("surface {cell}"),
        })?;

        let mut components = Vec::with_capacity(component_formulas.len());
        let mut len = 0;

        for formula in component_formulas {
            let index = surface
                .components
                .iter()
                .position(|comp| &comp.formula == formula)
                .ok_or_else(|| Error::ComponentMissing {
                    category: ReactantCategory::SurfaceComponent,
                    name: formula.clone(),
                })?;

            let total_names: Vec<String> = surface.components[index]
                .totals
                .names()
                .map(String::from)
                .collect();
            len += COMP_NUM_NOT_TOTALS + total_names.len();
            components.push(ComponentSlot { index, total_names });
        }

        let mut charges = Vec::with_capacity(charge_names.len());
        for charge_name in charge_names {
            let index = surface
                .charges
                .iter()
                .position(|charge| &charge.name == charge_name)
                .ok_or_else(|| Error::ComponentMissing {
                    category: ReactantCategory::SurfaceCharge,
                    name: charge_name.clone(),
                })?;

            len += CHARGE_NUM_NOT_TOTALS + primaries.len();
            charges.push(ChargeSlot { index });
        }

        Ok(SurfaceWrapper {
            cell,
            components,
            charges,
            primaries: primaries.iter().cloned().collect(),
            len,
        })
    }

    /// Canonical slot names for a surface assemblage.
    pub fn names(surface: &SurfaceState, primaries: &BTreeSet<String>) -> SurfaceNames {
        let mut names = SurfaceNames::default();

        for comp in &surface.components {
            let formula = &comp.formula;
            names.component_formulas.push(formula.clone());
            names.component_slots.push(format!("{formula}_moles"));
            names.component_slots.push(format!("{formula}_la"));
            names.component_slots.push(format!("{formula}_cb"));
            for (total, _) in comp.totals.iter() {
                names.component_slots.push(format!("{formula}_{total}"));
            }
        }

        for charge in &surface.charges {
            let charge_name = &charge.name;
            names.charge_names.push(charge_name.clone());
            names.charge_slots.push(format!("{charge_name}_area"));
            names.charge_slots.push(format!("{charge_name}_grams"));
            names.charge_slots.push(format!("{charge_name}_cb"));
            names.charge_slots.push(format!("{charge_name}_mw"));
            names.charge_slots.push(format!("{charge_name}_la"));
            for primary in primaries {
                names.charge_slots.push(format!("{charge_name}_tot_{primary}"));
            }
        }

        names
    }
}

impl ReactantWrapper for SurfaceWrapper {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.len);
        let cell = self.cell;
        let surface = solver.surface(cell).ok_or_else(|| Error::ComponentMissing {
            category: ReactantCategory::SurfaceComponent,
            name: format!("surface {cell}"),
        })?;

        let mut offset = 0;

        for slot in &self.components {
            let comp = &surface.components[slot.index];
            let span = &mut out[offset..offset + COMP_NUM_NOT_TOTALS + slot.total_names.len()];

            span[0] = comp.moles;
            span[1] = comp.log_activity;
            span[2] = comp.charge_balance;
            for (i, name) in slot.total_names.iter().enumerate() {
                span[COMP_NUM_NOT_TOTALS + i] = comp.totals.get(name).unwrap_or(0.0);
            }

            offset += span.len();
        }

        for slot in &self.charges {
            let charge = &surface.charges[slot.index];
            let span = &mut out[offset..offset + CHARGE_NUM_NOT_TOTALS + self.primaries.len()];

            span[0] = charge.specific_area;
            span[1] = charge.grams;
            span[2] = charge.charge_balance;
            span[3] = charge.mass_water;
            span[4] = charge.la_psi;
            for (i, primary) in self.primaries.iter().enumerate() {
                span[CHARGE_NUM_NOT_TOTALS + i] =
                    charge.diffuse_layer_totals.get(primary).unwrap_or(0.0);
            }

            offset += span.len();
        }

        Ok(())
    }

    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()> {
        debug_assert_eq!(data.len(), self.len);
        let cell = self.cell;
        let surface = solver
            .surface_mut(cell)
            .ok_or_else(|| Error::ComponentMissing {
                category: ReactantCategory::SurfaceComponent,
                name: format!("surface {cell}"),
            })?;

        let mut offset = 0;

        for slot in &self.components {
            let comp = &mut surface.components[slot.index];
            let span = &data[offset..offset + COMP_NUM_NOT_TOTALS + slot.total_names.len()];

            comp.moles = span[0];
            comp.log_activity = span[1];
            comp.charge_balance = span[2];
            comp.totals.clear();
            for (i, name) in slot.total_names.iter().enumerate() {
                comp.totals.insert(name.clone(), span[COMP_NUM_NOT_TOTALS + i]);
            }

            offset += span.len();
        }

        for slot in &self.charges {
            let charge = &mut surface.charges[slot.index];
            let span = &data[offset..offset + CHARGE_NUM_NOT_TOTALS + self.primaries.len()];

            charge.specific_area = span[0];
            charge.grams = span[1];
            charge.charge_balance = span[2];
            charge.mass_water = span[3];
            charge.la_psi = span[4];

            // Zero means "not in the diffuse layer": such entries are
            // dropped rather than stored.
            charge.diffuse_layer_totals.clear();
            for (i, primary) in self.primaries.iter().enumerate() {
                let value = span[CHARGE_NUM_NOT_TOTALS + i];
                if value == 0.0 {
                    continue;
                }
                charge.diffuse_layer_totals.insert(primary.clone(), value);
            }

            offset += span.len();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ReactionSolver, ReferenceSolver};

    const SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
SURFACE_RAW 1
    -component Hfo_wOH
        -moles 0.0002
        -la -3.5
        -cb 0
        -totals
            Hfo_wOH 0.0002
    -charge Hfo_w
        -area 600
        -grams 1
        -cb 0
        -mass_water 1
        -la_psi 0
        -dl_totals
            H 1e-6
";

    fn primaries() -> BTreeSet<String> {
        ["H", "O", "Ca"].iter().map(|s| s.to_string()).collect()
    }

    fn solver_with_surface() -> ReferenceSolver {
        let mut solver = ReferenceSolver::new();
        solver.run_script(SCRIPT).unwrap();
        solver
    }

    #[test]
    fn names_cover_components_then_charges() {
        let solver = solver_with_surface();
        let names = SurfaceWrapper::names(solver.surface(1).unwrap(), &primaries());

        assert_eq!(names.component_formulas, vec!["Hfo_wOH"]);
        assert_eq!(names.charge_names, vec!["Hfo_w"]);
        assert_eq!(
            names.component_slots,
            vec!["Hfo_wOH_moles", "Hfo_wOH_la", "Hfo_wOH_cb", "Hfo_wOH_Hfo_wOH"]
        );
        assert_eq!(
            names.charge_slots,
            vec![
                "Hfo_w_area",
                "Hfo_w_grams",
                "Hfo_w_cb",
                "Hfo_w_mw",
                "Hfo_w_la",
                "Hfo_w_tot_Ca",
                "Hfo_w_tot_H",
                "Hfo_w_tot_O",
            ]
        );
    }

    #[test]
    fn diffuse_layer_slots_follow_the_sorted_primaries() {
        let mut solver = solver_with_surface();
        let wrapper = SurfaceWrapper::bind(
            &solver,
            1,
            &primaries(),
            &["Hfo_wOH".to_string()],
            &["Hfo_w".to_string()],
        )
        .unwrap();
        // 3 + 1 component slots, 5 + 3 charge slots
        assert_eq!(wrapper.len(), 12);

        let mut buffer = vec![0.0; wrapper.len()];
        wrapper.get(&solver, &mut buffer).unwrap();

        assert_eq!(buffer[0], 0.0002); // component moles
        assert_eq!(buffer[4], 600.0); // charge area
        assert_eq!(buffer[9], 0.0); // Ca absent from the diffuse layer
        assert_eq!(buffer[10], 1e-6); // H
        assert_eq!(buffer[11], 0.0); // O

        buffer[9] = 2e-6; // Ca enters the diffuse layer
        buffer[10] = 0.0; // H leaves it
        wrapper.set(&mut solver, &buffer).unwrap();

        let dl = &solver.surface(1).unwrap().charges[0].diffuse_layer_totals;
        assert_eq!(dl.get("Ca"), Some(2e-6));
        assert_eq!(dl.get("H"), None, "zeroed entries are dropped");
    }

    #[test]
    fn binding_an_unknown_charge_fails_fast() {
        let solver = solver_with_surface();
        let err = SurfaceWrapper::bind(
            &solver,
            1,
            &primaries(),
            &["Hfo_wOH".to_string()],
            &["Hfo_s".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ComponentMissing {
                category: ReactantCategory::SurfaceCharge,
                ..
            }
        ));
    }
}
