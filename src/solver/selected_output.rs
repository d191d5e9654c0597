//! SELECTED_OUTPUT / USER_PUNCH block handling
//!
//! The reaction-network script is opaque to this crate except for two
//! narrow, text-level parses:
//!
//! 1. Locating a `SELECTED_OUTPUT` (and optional `USER_PUNCH`) block by
//!    scanning for capitalized keyword lines, so the block can be replayed
//!    into each engine's private instance.
//! 2. Reading the tab-delimited header and value lines the solver emits
//!    while such a block is active.
//!
//! Everything here is string-pure; no solver instance is touched.

use crate::error::{Error, Result};

/// Suffix appended to selected-output headings to keep them apart from
/// schema column names.
const HEADING_SUFFIX: &str = "_SO";

/// Extracts the block introduced by a capitalized `keyword` line.
///
/// A block starts at a line beginning with `keyword` in column 0 and ends
/// just before the next line whose first non-blank character starts an
/// upper-case keyword. Returns `None` when the keyword does not occur.
pub fn block_by_keyword(script: &str, keyword: &str) -> Option<String> {
    let mut block: Option<String> = None;

    for line in script.lines() {
        match block.as_mut() {
            None => {
                if line.starts_with(keyword) {
                    block = Some(format!("{line}\n"));
                }
            }
            Some(collected) => {
                let trimmed = line.trim_start();
                if starts_with_keyword(trimmed) {
                    break;
                }
                collected.push_str(line);
                collected.push('\n');
            }
        }
    }

    block
}

fn starts_with_keyword(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// The combined `SELECTED_OUTPUT` + `USER_PUNCH` text found in a script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedOutputBlock {
    text: String,
}

impl SelectedOutputBlock {
    /// Scans a script for selected-output blocks.
    ///
    /// Returns `Ok(None)` when the script defines none. A `USER_PUNCH`
    /// block without a `SELECTED_OUTPUT` block is malformed.
    pub fn from_script(script: &str) -> Result<Option<Self>> {
        let selected = block_by_keyword(script, "SELECTED_OUTPUT");
        let punch = block_by_keyword(script, "USER_PUNCH");

        match (selected, punch) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(Error::SelectedOutput(
                "USER_PUNCH block found without a SELECTED_OUTPUT block".to_string(),
            )),
            (Some(selected), punch) => {
                let mut text = selected;
                if let Some(punch) = punch {
                    text.push_str(&punch);
                }
                Ok(Some(SelectedOutputBlock { text }))
            }
        }
    }

    /// The raw block text, replayable into a solver instance.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parses the tab-delimited heading line of a selected-output report.
/// Headings are trimmed and tagged with the `_SO` suffix.
pub fn parse_headings(report: &str) -> Result<Vec<String>> {
    let header = report
        .lines()
        .next()
        .ok_or_else(|| Error::SelectedOutput("no headings in selected output".to_string()))?;

    Ok(header
        .split('\t')
        .map(|heading| format!("{}{HEADING_SUFFIX}", heading.trim()))
        .collect())
}

/// Parses the last value line of a selected-output report. Fields that do
/// not parse as numbers become NaN.
pub fn parse_values(report: &str) -> Vec<f64> {
    let Some(last) = report.lines().filter(|l| !l.trim().is_empty()).last() else {
        return Vec::new();
    };

    last.split('\t')
        .map(|field| field.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect()
}
