//! Point lookups, restriction and dump queries
//!
//! `subset` and `erase` are not plain filters: after restricting the cell
//! set they normalize the schema with a NaN-intersection cleanup, so the
//! exported table never contains a column that is NaN across every
//! remaining cell.

use std::collections::{BTreeMap, BTreeSet};

use crate::chem::ESSENTIALS;
use crate::chem::ReactantCategory;
use crate::error::{Error, Result};
use crate::matrix::ReactionMatrix;
use crate::CellId;

/// Solution quantities that are reported but must not be transported by a
/// host simulation: everything past H, O and Charge in the essential
/// prefix.
const OUTPUT_ONLY: [&str; 5] = [
    ESSENTIALS[3],
    ESSENTIALS[4],
    ESSENTIALS[5],
    ESSENTIALS[6],
    ESSENTIALS[7],
];

impl ReactionMatrix {
    /// Point lookup of one scalar.
    ///
    /// Fails when the cell is unknown or when the name is absent from
    /// that specific cell's record, even if other cells define it.
    pub fn value(&self, cell: CellId, name: &str) -> Result<f64> {
        let elements = self.records.get(&cell).ok_or(Error::UnknownCell(cell))?;
        elements
            .iter()
            .find(|element| element.name == name)
            .map(|element| element.value)
            .ok_or_else(|| Error::NameNotFound {
                cell,
                name: name.to_string(),
            })
    }

    /// A new matrix restricted to exactly the given cell IDs, sharing
    /// this matrix's solver metadata. Unknown IDs are an error.
    pub fn subset(&self, ids: &[CellId]) -> Result<ReactionMatrix> {
        let mut records = BTreeMap::new();
        let mut internal_names = BTreeMap::new();

        for &id in ids {
            let record = self.records.get(&id).ok_or(Error::UnknownCell(id))?;
            records.insert(id, record.clone());
            if let Some(names) = self.internal_names.get(&id) {
                internal_names.insert(id, names.clone());
            }
        }

        let mut result = ReactionMatrix {
            shared: self.shared.clone(),
            records,
            internal_names,
            surface_primaries: self.surface_primaries.clone(),
        };
        result.remove_nans();
        Ok(result)
    }

    /// A new matrix with the given cell IDs removed. IDs that do not
    /// exist are ignored.
    pub fn erase(&self, ids: &[CellId]) -> ReactionMatrix {
        let mut result = self.clone();
        for id in ids {
            result.records.remove(id);
            result.internal_names.remove(id);
        }
        result.remove_nans();
        result
    }

    /// Serializes one cell's full live reaction state into the solver's
    /// native transfer format.
    pub fn dump_string(&self, cell: CellId) -> Result<String> {
        if !self.records.contains_key(&cell) {
            return Err(Error::UnknownCell(cell));
        }
        self.shared.solver.dump_cell(cell)
    }

    /// Dump strings for every cell, keyed by ID.
    pub fn dump_strings(&self) -> Result<BTreeMap<CellId, String>> {
        self.records
            .keys()
            .map(|&cell| Ok((cell, self.dump_string(cell)?)))
            .collect()
    }

    /// Solution columns a reactive-transport host must transport:
    /// everything except the output-only essentials.
    pub fn transported_names(&self) -> Vec<String> {
        self.solution_names()
            .into_iter()
            .filter(|name| !OUTPUT_ONLY.contains(&name.as_str()))
            .collect()
    }

    /// Solution columns that are reported but never transported.
    pub fn output_only_names(&self) -> Vec<String> {
        OUTPUT_ONLY.iter().map(|name| name.to_string()).collect()
    }

    /// All exported columns belonging to kinetic reactants of any cell.
    pub fn kinetics_columns(&self) -> Vec<String> {
        self.union_group_names(ReactantCategory::Kinetic)
    }

    /// All exported columns belonging to equilibrium phases of any cell.
    pub fn equilibrium_columns(&self) -> Vec<String> {
        self.union_group_names(ReactantCategory::Equilibrium)
    }

    /// Drops every name whose value is NaN (or absent) across all
    /// remaining cells. Run after each restriction so the union schema
    /// shrinks with the population.
    fn remove_nans(&mut self) {
        if self.records.is_empty() {
            return;
        }

        let mut any_present: BTreeMap<&str, bool> = BTreeMap::new();
        for elements in self.records.values() {
            for element in elements {
                let entry = any_present.entry(element.name.as_str()).or_insert(false);
                *entry |= !element.value.is_nan();
            }
        }

        let doomed: BTreeSet<String> = any_present
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name.to_string())
            .collect();
        if doomed.is_empty() {
            return;
        }

        for elements in self.records.values_mut() {
            elements.retain(|element| !doomed.contains(&element.name));
        }
    }
}
