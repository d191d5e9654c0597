//! Result export
//!
//! Host-side inspection helpers for dense matrix exports. The data plane
//! of the crate is the flat-vector protocol; this module only renders it.

mod csv;

pub use csv::{export_matrix_csv, matrix_to_csv_string, CsvConfig};
