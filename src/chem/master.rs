//! Master-species table and redox-valence expansion
//!
//! The solver's thermodynamic database declares a list of master species.
//! Valence sub-states of an element appear as contiguous entries directly
//! after their parent (`"Fe"`, `"Fe(2)"`, `"Fe(3)"`). This layer depends on
//! that ordering: it is a contract of the external solver, and a violation
//! is reported loudly rather than papered over.

use crate::chem::{ESSENTIALS, NUM_ESSENTIALS};
use crate::error::{Error, Result};

/// Names that never take part in valence expansion: the essential solution
/// quantities plus the specially handled `H(0)`/`O(0)` placeholders.
const EXPANSION_IGNORED: [&str; NUM_ESSENTIALS + 2] = [
    ESSENTIALS[0],
    ESSENTIALS[1],
    ESSENTIALS[2],
    ESSENTIALS[3],
    ESSENTIALS[4],
    ESSENTIALS[5],
    ESSENTIALS[6],
    ESSENTIALS[7],
    "H(0)",
    "O(0)",
];

/// The database's master-species list, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterTable {
    entries: Vec<String>,
}

impl MasterTable {
    pub fn new(entries: Vec<String>) -> Self {
        MasterTable { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a name to its primary master element.
    ///
    /// `"Fe(2)"` and `"Fe"` both resolve to `"Fe"`. Names whose base is not
    /// a declared master species (e.g. the essential quantity `"tc"`)
    /// resolve to nothing.
    pub fn primary_of(&self, name: &str) -> Option<&str> {
        let base = match name.find('(') {
            Some(pos) => &name[..pos],
            None => name,
        };
        self.entries
            .iter()
            .find(|entry| entry.as_str() == base)
            .map(String::as_str)
    }

    /// Expands a solution name list into valence sub-states.
    ///
    /// For every non-essential name, the primary master element is looked
    /// up and the master table is scanned for the contiguous run of
    /// parenthesized valence states following it. When the run is non-empty
    /// the sub-states replace the base name; otherwise the base name is
    /// emitted unexpanded. Each primary element is expanded at most once,
    /// so a list already containing `"Fe(2)"` and `"Fe(3)"` does not
    /// duplicate the group.
    ///
    /// # Errors
    ///
    /// [`Error::Contract`] when a name has no primary master entry: the
    /// database and the script disagree, which this layer cannot repair.
    pub fn expand_valence_states(&self, names: &[String]) -> Result<Vec<String>> {
        let mut expanded = Vec::with_capacity(names.len());
        let mut primaries_seen: Vec<&str> = Vec::new();

        for name in names {
            if EXPANSION_IGNORED.contains(&name.as_str()) {
                expanded.push(name.clone());
                continue;
            }

            let primary = self.primary_of(name).ok_or_else(|| {
                Error::Contract(format!(
                    "master species table has no primary entry for `{name}`"
                ))
            })?;

            if primaries_seen.contains(&primary) {
                continue;
            }
            primaries_seen.push(primary);

            let states = self.valence_run(primary);
            if states.is_empty() {
                expanded.push(primary.to_string());
            } else {
                expanded.extend(states.iter().map(|s| s.to_string()));
            }
        }

        Ok(expanded)
    }

    /// The contiguous valence states following `primary` in the table.
    /// Relies on the pre-sorted master-table contract.
    fn valence_run(&self, primary: &str) -> &[String] {
        let Some(pos) = self.entries.iter().position(|e| e == primary) else {
            return &[];
        };

        let mut last = pos;
        while last + 1 < self.entries.len() {
            let next = &self.entries[last + 1];
            if !next.starts_with(primary) || next.as_bytes().get(primary.len()) != Some(&b'(') {
                break;
            }
            last += 1;
        }

        &self.entries[pos + 1..=last]
    }
}
