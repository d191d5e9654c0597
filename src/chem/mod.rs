//! Core chemical data model
//!
//! This module defines the plain-data view of one cell's reactant state as
//! the solver exposes it: a solution with its essential quantities and total
//! concentrations, plus the optional exchange, kinetic, equilibrium-phase
//! and surface-complexation assemblages.
//!
//! Nothing in here computes chemistry. These types are the marshaling
//! surface between the solver's internal state and the flat-vector protocol
//! of [`crate::wrapper`] and [`crate::matrix`].

mod master;
mod state;

pub use master::MasterTable;
pub use state::{
    EquilibriumPhase, EquilibriumState, ExchangeComponent, ExchangeState, KineticsComponent,
    KineticsState, NameDouble, SolutionState, SurfaceCharge, SurfaceComponent, SurfaceState,
};

use std::fmt;

/// The fixed, always-present Solution sub-fields, in their non-negotiable
/// order: total H, total O, charge balance, temperature, pressure, solution
/// volume, pH and pe.
///
/// The last five are output-only quantities: they are read back after an
/// advance but never written into the solver (see
/// [`crate::wrapper::SolutionWrapper`]).
pub const ESSENTIALS: [&str; 8] = ["H", "O", "Charge", "tc", "patm", "SolVol", "pH", "pe"];

/// Number of essential Solution slots.
pub const NUM_ESSENTIALS: usize = ESSENTIALS.len();

/// One class of chemical entity tracked per cell.
///
/// The set is closed and known at design time; every named scalar a cell
/// exports is tagged with exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReactantCategory {
    Solution,
    Exchange,
    Kinetic,
    Equilibrium,
    SurfaceComponent,
    SurfaceCharge,
}

impl ReactantCategory {
    /// The four non-solution groups in the fixed export order. Surface
    /// components and charges form a single export group (see
    /// [`ReactantCategory::export_group`]).
    pub(crate) const EXPORT_GROUPS: [ReactantCategory; 4] = [
        ReactantCategory::Exchange,
        ReactantCategory::Kinetic,
        ReactantCategory::Equilibrium,
        ReactantCategory::SurfaceComponent,
    ];

    /// Collapses the two surface categories into one group for column
    /// layout purposes.
    pub(crate) fn export_group(self) -> ReactantCategory {
        match self {
            ReactantCategory::SurfaceCharge => ReactantCategory::SurfaceComponent,
            other => other,
        }
    }
}

impl fmt::Display for ReactantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReactantCategory::Solution => "solution",
            ReactantCategory::Exchange => "exchange",
            ReactantCategory::Kinetic => "kinetic",
            ReactantCategory::Equilibrium => "equilibrium",
            ReactantCategory::SurfaceComponent => "surface component",
            ReactantCategory::SurfaceCharge => "surface charge",
        };
        f.write_str(name)
    }
}
