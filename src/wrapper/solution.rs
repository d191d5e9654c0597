//! Solution wrapper
//!
//! The Solution slot layout is an eight-slot essential prefix (total H,
//! total O, charge balance, temperature, pressure, solution volume, pH,
//! pe, in that fixed order) followed by one slot per bound total name.
//!
//! Volume, pH and pe are output-only: `get` reports them, `set` ignores
//! them (the solver recomputes all three on the next advance).

use crate::chem::{NameDouble, ReactantCategory, SolutionState, ESSENTIALS, NUM_ESSENTIALS};
use crate::error::{Error, Result};
use crate::solver::ReactionSolver;
use crate::wrapper::ReactantWrapper;
use crate::CellId;

/// Magnitude below which a total is numerical noise rather than a real
/// concentration. `set` drops such values instead of writing them;
/// `get` clamps internal values at or below it to exactly zero.
pub const TOTAL_NOISE_FLOOR: f64 = 1.0e-25;

/// Flat view of one cell's solution.
#[derive(Debug, Clone)]
pub struct SolutionWrapper {
    cell: CellId,
    /// Bound name order past the essential prefix.
    totals_order: Vec<String>,
    with_redox: bool,
}

impl SolutionWrapper {
    /// Binds a solution in the given name order.
    ///
    /// `order` is the full slot-name list including the essential prefix;
    /// it must have been built with the same redox mode, otherwise slot
    /// and name counts disagree; that consistency is the caller's
    /// contract and cannot be verified here.
    pub fn bind(
        solver: &dyn ReactionSolver,
        cell: CellId,
        order: &[String],
        with_redox: bool,
    ) -> Result<Self> {
        if order.len() < NUM_ESSENTIALS {
            return Err(Error::InvalidArgument(format!(
                "solution name order needs at least the {NUM_ESSENTIALS} essential slots"
            )));
        }
        if solver.solution(cell).is_none() {
            return Err(Error::ComponentMissing {
                category: ReactantCategory::Solution,
                name: format!("solution {cell}"),
            });
        }

        Ok(SolutionWrapper {
            cell,
            totals_order: order[NUM_ESSENTIALS..].to_vec(),
            with_redox,
        })
    }

    /// Canonical slot names for a solution: the essential prefix,
    /// optionally the `H(0)`/`O(0)` placeholders, then the sorted set of
    /// total names. `H(0)` and `O(0)` never appear in the sorted tail;
    /// they are handled by the placeholder slots alone.
    ///
    /// When redox tracking is off, the totals are folded into their parent
    /// elements first. Valence expansion of the tail is applied afterwards
    /// by the schema layer (it needs the master table).
    pub fn names(solution: &SolutionState, include_h0_o0: bool, with_redox: bool) -> Vec<String> {
        let mut names: Vec<String> = ESSENTIALS.iter().map(|s| s.to_string()).collect();

        if include_h0_o0 {
            names.push("H(0)".to_string());
            names.push("O(0)".to_string());
        }

        let simplified;
        let totals = if with_redox {
            &solution.totals
        } else {
            simplified = solution.totals.simplify_redox();
            &simplified
        };

        // BTreeMap iteration keeps the tail name-sorted.
        names.extend(
            totals
                .names()
                .filter(|name| *name != "H(0)" && *name != "O(0)")
                .map(String::from),
        );

        names
    }

    fn resolve<'a>(&self, solver: &'a dyn ReactionSolver) -> Result<&'a SolutionState> {
        solver
            .solution(self.cell)
            .ok_or(Error::ComponentMissing {
                category: ReactantCategory::Solution,
                name: format!("solution {}", self.cell),
            })
    }
}

impl ReactantWrapper for SolutionWrapper {
    fn len(&self) -> usize {
        NUM_ESSENTIALS + self.totals_order.len()
    }

    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.len());
        let solution = self.resolve(solver)?;

        out[0] = solution.total_h;
        out[1] = solution.total_o;
        out[2] = solution.charge_balance;
        out[3] = solution.temperature;
        out[4] = solution.pressure;
        out[5] = solution.volume;
        out[6] = solution.ph;
        out[7] = solution.pe;

        let simplified;
        let totals = if self.with_redox {
            &solution.totals
        } else {
            simplified = solution.totals.simplify_redox();
            &simplified
        };

        for (slot, name) in out[NUM_ESSENTIALS..].iter_mut().zip(&self.totals_order) {
            *slot = match totals.get(name) {
                Some(value) if value > TOTAL_NOISE_FLOOR => value,
                _ => 0.0,
            };
        }

        Ok(())
    }

    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()> {
        debug_assert_eq!(data.len(), self.len());

        let mut new_totals = NameDouble::new();
        for (value, name) in data[NUM_ESSENTIALS..].iter().zip(&self.totals_order) {
            if *value < TOTAL_NOISE_FLOOR {
                continue;
            }
            new_totals.insert(name.clone(), *value);
        }
        if !self.with_redox {
            new_totals = new_totals.simplify_redox();
        }

        let cell = self.cell;
        let solution = solver
            .solution_mut(cell)
            .ok_or(Error::ComponentMissing {
                category: ReactantCategory::Solution,
                name: format!("solution {cell}"),
            })?;

        // Slots 5..8 (volume, pH, pe) are deliberately not consumed.
        solution.update(data[0], data[1], data[2], data[3], data[4], new_totals);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ReactionSolver, ReferenceSolver};

    fn solver_with_solution() -> ReferenceSolver {
        let mut solver = ReferenceSolver::new();
        solver
            .run_script(
                "SOLUTION_RAW 1\n    -total_h 110.0\n    -total_o 55.5\n    -cb 1e-9\n    \
                 -temp 25\n    -pressure 1\n    -volume 1\n    -ph 7\n    -pe 4\n    -totals\n        \
                 Ca 0.0012\n        Cl 1e-30\n        Fe(2) 0.001\n        Fe(3) 0.002\n",
            )
            .unwrap();
        solver
    }

    fn order(with_redox: bool) -> Vec<String> {
        SolutionWrapper::names(
            solver_with_solution().solution(1).unwrap(),
            false,
            with_redox,
        )
    }

    #[test]
    fn names_start_with_the_essential_prefix() {
        let names = order(true);
        assert_eq!(&names[..NUM_ESSENTIALS], &ESSENTIALS.map(String::from));
        assert_eq!(&names[NUM_ESSENTIALS..], &["Ca", "Cl", "Fe(2)", "Fe(3)"]);
    }

    #[test]
    fn names_fold_redox_when_disabled() {
        let names = order(false);
        assert_eq!(&names[NUM_ESSENTIALS..], &["Ca", "Cl", "Fe"]);
    }

    #[test]
    fn get_clamps_noise_to_zero_and_missing_to_zero() {
        let solver = solver_with_solution();
        let mut order = order(true);
        order.push("Mg".to_string()); // not tracked by this cell

        let wrapper = SolutionWrapper::bind(&solver, 1, &order, true).unwrap();
        let mut buffer = vec![f64::NAN; wrapper.len()];
        wrapper.get(&solver, &mut buffer).unwrap();

        assert_eq!(buffer[0], 110.0);
        assert_eq!(buffer[6], 7.0);
        assert_eq!(buffer[NUM_ESSENTIALS], 0.0012);
        assert_eq!(buffer[NUM_ESSENTIALS + 1], 0.0, "sub-floor total reads as zero");
        assert_eq!(buffer[NUM_ESSENTIALS + 4], 0.0, "missing total reads as zero");
    }

    #[test]
    fn get_folds_valences_without_redox() {
        let solver = solver_with_solution();
        let order = order(false);
        let wrapper = SolutionWrapper::bind(&solver, 1, &order, false).unwrap();

        let mut buffer = vec![0.0; wrapper.len()];
        wrapper.get(&solver, &mut buffer).unwrap();

        let fe_slot = order.iter().position(|n| n == "Fe").unwrap();
        assert!((buffer[fe_slot] - 0.003).abs() < 1e-15);
    }

    #[test]
    fn set_drops_noise_and_preserves_output_slots() {
        let mut solver = solver_with_solution();
        let order = order(true);
        let wrapper = SolutionWrapper::bind(&solver, 1, &order, true).unwrap();

        let mut buffer = vec![0.0; wrapper.len()];
        wrapper.get(&solver, &mut buffer).unwrap();

        buffer[3] = 35.0; // temperature
        buffer[6] = 9.9; // pH slot: output-only, must be ignored
        buffer[NUM_ESSENTIALS] = 1.0e-30; // Ca collapses below the floor

        wrapper.set(&mut solver, &buffer).unwrap();

        let solution = solver.solution(1).unwrap();
        assert_eq!(solution.temperature, 35.0);
        assert_eq!(solution.ph, 7.0);
        assert_eq!(solution.totals.get("Ca"), None);
        assert_eq!(solution.totals.get("Fe(2)"), Some(0.001));
    }

    #[test]
    fn bind_fails_for_a_cell_without_a_solution() {
        let solver = solver_with_solution();
        let err = SolutionWrapper::bind(&solver, 7, &order(true), true).unwrap_err();
        assert!(matches!(
            err,
            Error::ComponentMissing {
                category: ReactantCategory::Solution,
                ..
            }
        ));
    }
}
