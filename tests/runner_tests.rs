//! Integration tests for batch execution over sparse rows

mod common;

use common::fixtures::*;
use common::{assert_all_close, build_matrix_without_redox, rows_from_export};

use nalgebra::DVector;

use geochem_rs::matrix::ExportLayout;
use geochem_rs::runner::BatchRunner;
use geochem_rs::Error;

#[test]
fn one_engine_per_cell_is_constructed() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let runner = BatchRunner::new(&matrix).unwrap();
    assert_eq!(runner.num_engines(), 4);

    let subset = matrix.subset(&[2, 3]).unwrap();
    let runner = BatchRunner::new(&subset).unwrap();
    assert_eq!(runner.num_engines(), 2);
}

#[test]
fn sparse_rows_keep_their_nan_holes() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let subset = matrix.subset(&[2, 3]).unwrap();
    let mut runner = BatchRunner::new(&subset).unwrap();

    let export = subset.get(ExportLayout::RowMajor, true);
    let template = rows_from_export(&export);

    // Ten rows: the first half simulate cell 2, the rest cell 3.
    let mut rows: Vec<DVector<f64>> = (0..10)
        .map(|i| template[usize::from(i >= 5)].clone())
        .collect();

    runner.run(&mut rows, 100.0).unwrap();

    let barite_kin = export.names.iter().position(|n| n == "Barite_kin").unwrap();
    for (index, row) in rows.iter().enumerate() {
        if index < 5 {
            assert_eq!(row[0], 2.0);
            assert!(row[barite_kin].is_nan(), "foreign hole must stay NaN");
        } else {
            assert_eq!(row[0], 3.0);
            assert!(!row[barite_kin].is_nan());
        }

        // Solution columns survive the step with sane magnitudes.
        assert!((row[1] - 110.0).abs() < 1.0); // total H
        assert!((row[2] - 55.5).abs() < 1.0); // total O
    }
}

#[test]
fn rows_are_independent_of_their_neighbours() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let subset = matrix.subset(&[2, 3]).unwrap();

    let export = subset.get(ExportLayout::RowMajor, true);
    let template = rows_from_export(&export);

    // Batch A: cell-2 row alone. Batch B: the same row after a blanked
    // and ignored row. Results must match exactly.
    let mut alone = vec![template[0].clone()];
    let mut runner = BatchRunner::new(&subset).unwrap();
    runner.run(&mut alone, 500.0).unwrap();

    let mut blanked = template[1].clone();
    for slot in blanked.iter_mut().skip(1) {
        *slot = f64::NAN;
    }
    let blanked_before = blanked.clone();

    let mut batch = vec![blanked, template[0].clone()];
    let mut runner = BatchRunner::new(&subset).unwrap();
    runner.run_ignoring(&mut batch, 500.0, &[0]).unwrap();

    assert_all_close(batch[0].as_slice(), blanked_before.as_slice(), 0.0);
    assert_all_close(batch[1].as_slice(), alone[0].as_slice(), 0.0);
}

#[test]
fn ignored_rows_are_left_untouched() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let subset = matrix.subset(&[2, 3]).unwrap();
    let mut runner = BatchRunner::new(&subset).unwrap();

    let export = subset.get(ExportLayout::RowMajor, true);
    let row = rows_from_export(&export)[1].clone();

    let mut rows = vec![row.clone()];
    runner.run_ignoring(&mut rows, 10_000.0, &[0]).unwrap();

    assert_all_close(rows[0].as_slice(), row.as_slice(), 0.0);
}

#[test]
fn unknown_row_id_is_fatal() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let mut runner = BatchRunner::new(&matrix).unwrap();

    let width = matrix.get(ExportLayout::RowMajor, true).names.len();
    let mut rows = vec![DVector::zeros(width)];
    rows[0][0] = 1000.0;

    assert!(matches!(
        runner.run(&mut rows, 100.0),
        Err(Error::UnknownCell(1000))
    ));
}

#[test]
fn ignored_rows_skip_the_id_check() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let mut runner = BatchRunner::new(&matrix).unwrap();

    let width = matrix.get(ExportLayout::RowMajor, true).names.len();
    let mut rows = vec![DVector::from_element(width, f64::NAN)];
    rows[0][0] = 1000.0;

    // Ignored: the bogus ID is never inspected.
    runner.run_ignoring(&mut rows, 100.0, &[0]).unwrap();
    assert_eq!(rows[0][0], 1000.0);
}

#[test]
fn engines_accumulate_state_across_run_calls() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let subset = matrix.subset(&[3]).unwrap();
    let export = subset.get(ExportLayout::RowMajor, true);
    let celestite = export.names.iter().position(|n| n == "Celestite_kin").unwrap();

    let template = rows_from_export(&export);

    let mut once = vec![template[0].clone()];
    let mut runner = BatchRunner::new(&subset).unwrap();
    runner.run(&mut once, 50_000.0).unwrap();

    let mut twice = vec![template[0].clone()];
    let mut runner = BatchRunner::new(&subset).unwrap();
    runner.run(&mut twice, 50_000.0).unwrap();
    runner.run(&mut twice, 50_000.0).unwrap();

    assert!(twice[0][celestite] < once[0][celestite]);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_runs_match_sequential_runs() {
    let matrix = build_matrix_without_redox(BARITE_SCRIPT);
    let export = matrix.get(ExportLayout::RowMajor, true);
    let template = rows_from_export(&export);

    let mut sequential: Vec<DVector<f64>> = (0..8)
        .map(|i| template[i % template.len()].clone())
        .collect();
    let mut parallel = sequential.clone();

    let mut runner = BatchRunner::new(&matrix).unwrap();
    runner.run(&mut sequential, 1000.0).unwrap();

    let mut runner = BatchRunner::new(&matrix).unwrap();
    runner.run_parallel(&mut parallel, 1000.0).unwrap();

    for (a, b) in sequential.iter().zip(&parallel) {
        assert_all_close(a.as_slice(), b.as_slice(), 0.0);
    }
}
