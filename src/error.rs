//! Error types for the crate
//!
//! Every failure mode maps to one variant of [`Error`]. There is no
//! transient-failure category anywhere in this domain (no network, no I/O
//! contention), so there is no retry machinery: a returned error reflects
//! either a caller bug (invalid argument, unknown cell), a malformed
//! reaction network (script error), or a broken external-solver contract.
//!
//! Missing values are *not* errors. A quantity absent from a cell is
//! represented as NaN and travels structurally through compaction and
//! scattering (see [`crate::runner`]).

use crate::chem::ReactantCategory;
use crate::CellId;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument is invalid (negative time step, cell ID
    /// absent from a matrix, buffer of the wrong width).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The solver reported an error while interpreting a database or a
    /// reaction-network script. Always fatal at construction: nothing is
    /// left half-built.
    #[error("reaction script error: {0}")]
    Script(String),

    /// A cell ID has no entry in the addressed population.
    #[error("cell {0} does not exist")]
    UnknownCell(CellId),

    /// A point lookup asked for a name the addressed cell does not define.
    #[error("name `{name}` not found in cell {cell}")]
    NameNotFound { cell: CellId, name: String },

    /// A wrapper constructor referenced a sub-entity that is absent from the
    /// live solver instance. Raised eagerly at bind time, never at use time.
    #[error("{category} component `{name}` not found in solver instance")]
    ComponentMissing {
        category: ReactantCategory,
        name: String,
    },

    /// The external solver violated a contract this layer depends on
    /// (e.g. an unsorted master-species table). Not locally recoverable.
    #[error("solver contract violation: {0}")]
    Contract(String),

    /// A malformed SELECTED_OUTPUT / USER_PUNCH arrangement in the script.
    #[error("selected output: {0}")]
    SelectedOutput(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offender() {
        let err = Error::UnknownCell(42);
        assert_eq!(err.to_string(), "cell 42 does not exist");

        let err = Error::NameNotFound {
            cell: 3,
            name: "Calcite_eq".to_string(),
        };
        assert!(err.to_string().contains("Calcite_eq"));
        assert!(err.to_string().contains('3'));

        let err = Error::ComponentMissing {
            category: ReactantCategory::Exchange,
            name: "X".to_string(),
        };
        assert!(err.to_string().contains("exchange"));
    }
}
