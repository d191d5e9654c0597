//! Category wrappers: the flat get/set contract
//!
//! Each wrapper binds one reactant category of one specific cell and
//! exposes a fixed-size flat view of it, in a caller-supplied name order:
//!
//! - [`ReactantWrapper::len`]: total scalar slot count
//! - [`ReactantWrapper::get`]: copy current solver-internal values into a
//!   caller buffer, bound order, no other side effects
//! - [`ReactantWrapper::set`]: push buffer values back into the
//!   solver-internal objects, same order
//!
//! The category set is closed: Solution, Exchange, Kinetics, Equilibrium,
//! Surface. Slot shapes are fixed per category: an equilibrium phase
//! contributes exactly two slots (moles, saturation index), a kinetic
//! reactant `1 + n_params`, and so on; the per-component offset arithmetic
//! is what keeps flat buffers and live objects aligned.
//!
//! # Fail-fast binding
//!
//! Constructors resolve every referenced sub-entity against the live
//! solver instance and fail with [`crate::Error::ComponentMissing`] when
//! a name does not resolve. A successfully bound wrapper cannot miss at
//! use time.
//!
//! # Name resolution
//!
//! Each wrapper also owns the naming rules of its category: the
//! associated `names` functions produce the canonical slot-name lists that
//! the schema layer unions across cells (see [`crate::matrix`]).

mod equilibrium;
mod exchange;
mod kinetics;
mod solution;
mod surface;

pub use equilibrium::EquilibriumWrapper;
pub use exchange::ExchangeWrapper;
pub use kinetics::KineticsWrapper;
pub use solution::{SolutionWrapper, TOTAL_NOISE_FLOOR};
pub use surface::{SurfaceNames, SurfaceWrapper};

use crate::error::Result;
use crate::solver::ReactionSolver;

/// The shared flat-marshaling contract of all five category wrappers.
pub trait ReactantWrapper {
    /// Total number of scalar slots this wrapper marshals.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes current solver-internal values into `out[..self.len()]`.
    fn get(&self, solver: &dyn ReactionSolver, out: &mut [f64]) -> Result<()>;

    /// Reads `data[..self.len()]` and pushes the values back into the
    /// bound solver-internal objects.
    fn set(&self, solver: &mut dyn ReactionSolver, data: &[f64]) -> Result<()>;
}
