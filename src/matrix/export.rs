//! Dense tabular export
//!
//! The export column layout is: optional ID column, the Solution columns
//! verbatim (their fixed-prefix-plus-sorted-tail order is common to every
//! cell by construction), then the name-sorted union of each remaining
//! category (Exchange, Kinetic, Equilibrium, Surface) concatenated in
//! that fixed order. A column exists iff at least one cell defines the
//! name; cells lacking it read NaN.

use std::collections::HashMap;

use nalgebra::DVector;

use crate::chem::ReactantCategory;
use crate::matrix::ReactionMatrix;

/// Memory order of the exported value vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportLayout {
    /// Cell by cell: all columns of cell 0, then all columns of cell 1, …
    #[default]
    RowMajor,
    /// Column by column: one column's values across all cells, then the
    /// next column's.
    ColumnMajor,
}

/// A dense export: column names plus a flat value vector holding
/// `names.len() * rows()` entries in the requested layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatExport {
    pub names: Vec<String>,
    pub values: DVector<f64>,
}

impl FlatExport {
    /// Number of cell rows in the export.
    pub fn rows(&self) -> usize {
        if self.names.is_empty() {
            0
        } else {
            self.values.len() / self.names.len()
        }
    }

    /// One row-major row as a slice. Only meaningful for row-major
    /// exports.
    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.names.len();
        &self.values.as_slice()[index * width..(index + 1) * width]
    }
}

impl ReactionMatrix {
    /// Exports all cells into a dense table.
    pub fn get(&self, layout: ExportLayout, include_id: bool) -> FlatExport {
        let names = self.column_names(include_id);
        if self.records.is_empty() || names.is_empty() {
            return FlatExport {
                names,
                values: DVector::zeros(0),
            };
        }

        let lookups: Vec<(i32, HashMap<&str, f64>)> = self
            .records
            .iter()
            .map(|(id, elements)| {
                let lookup = elements
                    .iter()
                    .map(|element| (element.name.as_str(), element.value))
                    .collect();
                (*id, lookup)
            })
            .collect();

        let data_columns = &names[usize::from(include_id)..];
        let mut values = Vec::with_capacity(names.len() * lookups.len());

        match layout {
            ExportLayout::RowMajor => {
                for (id, lookup) in &lookups {
                    if include_id {
                        values.push(f64::from(*id));
                    }
                    for name in data_columns {
                        values.push(lookup.get(name.as_str()).copied().unwrap_or(f64::NAN));
                    }
                }
            }
            ExportLayout::ColumnMajor => {
                if include_id {
                    for (id, _) in &lookups {
                        values.push(f64::from(*id));
                    }
                }
                for name in data_columns {
                    for (_, lookup) in &lookups {
                        values.push(lookup.get(name.as_str()).copied().unwrap_or(f64::NAN));
                    }
                }
            }
        }

        FlatExport {
            names,
            values: DVector::from_vec(values),
        }
    }

    /// The export column list, rebuilt from the current cell set. Driven
    /// by whichever cells remain after `subset`/`erase`.
    pub(crate) fn column_names(&self, include_id: bool) -> Vec<String> {
        let mut names = Vec::new();
        if include_id {
            names.push("ID".to_string());
        }

        let Some(first) = self.records.values().next() else {
            return names;
        };

        names.extend(
            first
                .iter()
                .take_while(|element| element.category == ReactantCategory::Solution)
                .map(|element| element.name.clone()),
        );

        for group in ReactantCategory::EXPORT_GROUPS {
            names.extend(self.union_group_names(group));
        }

        names
    }

    /// The name-sorted union of one category group across all cells.
    pub(crate) fn union_group_names(&self, group: ReactantCategory) -> Vec<String> {
        let mut union = std::collections::BTreeSet::new();
        for elements in self.records.values() {
            union.extend(
                elements
                    .iter()
                    .filter(|element| element.category.export_group() == group)
                    .map(|element| element.name.clone()),
            );
        }
        union.into_iter().collect()
    }
}
