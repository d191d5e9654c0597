//! Helper functions for integration tests

use std::rc::Rc;

use nalgebra::DVector;

use geochem_rs::matrix::{FlatExport, MatrixConfig, ReactionMatrix};
use geochem_rs::solver::{ReferenceSolverFactory, SolverFactory};

use crate::common::fixtures::BASE_DATABASE;

/// Initializes test logging once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh factory for reference solver instances.
pub fn reference_factory() -> Rc<dyn SolverFactory> {
    Rc::new(ReferenceSolverFactory)
}

/// Builds a matrix with default expansion settings (no `H(0)`/`O(0)`
/// placeholders, redox tracking on).
pub fn build_matrix(script: &str) -> ReactionMatrix {
    init_logging();
    ReactionMatrix::build(
        reference_factory(),
        BASE_DATABASE,
        script,
        MatrixConfig::default(),
    )
    .expect("matrix builds from fixture script")
}

/// Builds a matrix with redox valence states folded into their parents.
pub fn build_matrix_without_redox(script: &str) -> ReactionMatrix {
    init_logging();
    ReactionMatrix::build(
        reference_factory(),
        BASE_DATABASE,
        script,
        MatrixConfig {
            with_h0_o0: false,
            with_redox: false,
        },
    )
    .expect("matrix builds from fixture script")
}

/// Splits a row-major export into one vector per cell row.
pub fn rows_from_export(export: &FlatExport) -> Vec<DVector<f64>> {
    (0..export.rows())
        .map(|index| DVector::from_row_slice(export.row(index)))
        .collect()
}

/// Asserts element-wise closeness, treating NaN == NaN as equal so that
/// sparse rows can be compared directly.
pub fn assert_all_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a.is_nan() && e.is_nan() {
            continue;
        }
        assert!(
            (a - e).abs() <= tolerance,
            "element {i} differs: {a} vs {e} (tolerance {tolerance})"
        );
    }
}
