//! Numerical-method control parameters ("knobs")
//!
//! Six scalars read from and written to a solver instance verbatim. This
//! layer gives them no semantic interpretation: they are captured once at
//! matrix build time and replayed into every private engine instance so
//! that all cells integrate under identical settings.

/// Solver control parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverKnobs {
    /// Maximum iterations of the equilibrium solve.
    pub max_iterations: u32,
    /// Convergence tolerance of the equilibrium solve.
    pub convergence_tolerance: f64,
    /// Tolerance of the inequality solver.
    pub inequality_tolerance: f64,
    /// Maximum step size taken by the master-unknown iteration.
    pub step_size: f64,
    /// Maximum step size applied to pe.
    pub pe_step_size: f64,
    /// Whether diagonal scaling is applied to the solve matrix.
    pub diagonal_scaling: bool,
}

impl Default for SolverKnobs {
    fn default() -> Self {
        SolverKnobs {
            max_iterations: 100,
            convergence_tolerance: 1.0e-8,
            inequality_tolerance: 1.0e-15,
            step_size: 100.0,
            pe_step_size: 10.0,
            diagonal_scaling: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_round_numbers() {
        let knobs = SolverKnobs::default();
        assert_eq!(knobs.max_iterations, 100);
        assert!(!knobs.diagonal_scaling);
    }
}
