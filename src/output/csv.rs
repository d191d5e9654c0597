//! CSV rendering of dense matrix exports
//!
//! Writes a row-major [`FlatExport`] as delimited text: one header line,
//! one line per cell. Absent quantities stay `NaN` in the output, so a host
//! reading the file back gets the same sparsity pattern the flat-vector
//! protocol uses.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::matrix::FlatExport;

/// Configuration for CSV export.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column separator.
    pub delimiter: char,
    /// Significant digits per value.
    pub precision: usize,
    /// Emit the header line.
    pub include_header: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            delimiter: ',',
            precision: 12,
            include_header: true,
        }
    }
}

/// Renders a row-major export to a CSV string.
pub fn matrix_to_csv_string(export: &FlatExport, config: &CsvConfig) -> String {
    let mut out = String::new();
    let width = export.names.len();
    if width == 0 {
        return out;
    }

    if config.include_header {
        out.push_str(&export.names.join(&config.delimiter.to_string()));
        out.push('\n');
    }

    let precision = config.precision;
    for row in 0..export.rows() {
        for (column, value) in export.row(row).iter().enumerate() {
            if column > 0 {
                out.push(config.delimiter);
            }
            if value.is_nan() {
                out.push_str("NaN");
            } else {
                out.push_str(&format!("{value:.precision$e}"));
            }
        }
        out.push('\n');
    }

    out
}

/// Writes a row-major export to a CSV file.
pub fn export_matrix_csv(
    export: &FlatExport,
    path: impl AsRef<Path>,
    config: Option<&CsvConfig>,
) -> std::io::Result<()> {
    let default_config = CsvConfig::default();
    let config = config.unwrap_or(&default_config);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(matrix_to_csv_string(export, config).as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn export() -> FlatExport {
        FlatExport {
            names: vec!["ID".to_string(), "H".to_string(), "Calcite_eq".to_string()],
            values: DVector::from_vec(vec![1.0, 110.5, 0.001, 2.0, 111.0, f64::NAN]),
        }
    }

    #[test]
    fn header_and_one_line_per_cell() {
        let csv = matrix_to_csv_string(&export(), &CsvConfig::default());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ID,H,Calcite_eq");
    }

    #[test]
    fn nan_cells_render_as_nan_tokens() {
        let csv = matrix_to_csv_string(&export(), &CsvConfig::default());
        let last = csv.lines().last().unwrap();
        assert!(last.ends_with("NaN"));
    }

    #[test]
    fn custom_delimiter_and_precision_apply() {
        let config = CsvConfig {
            delimiter: ';',
            precision: 2,
            include_header: false,
        };
        let csv = matrix_to_csv_string(&export(), &config);
        assert!(csv.starts_with("1.00e0;"));
        assert!(csv.contains(";1.00e-3"));
    }
}
