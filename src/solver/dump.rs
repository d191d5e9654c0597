//! Dump-string handling
//!
//! A dump string is the solver's native snapshot of one cell: a script in
//! the transfer (`*_RAW`) grammar. The schema layer treats it as opaque
//! except for exactly one rewrite: before replaying a dump into a fresh
//! single-cell instance, the embedded cell-number tokens are normalized so
//! the restored state always lands in cell 1.

use regex::Regex;
use std::sync::OnceLock;

/// The cell every engine's private instance hosts its state in.
pub const ENGINE_CELL: crate::CellId = 1;

fn raw_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(RAW\s+)(\d+)").expect("valid cell-number pattern"))
}

/// Rewrites every `RAW <n>` cell-number token to `RAW 1`.
pub fn rewrite_cell_number(dump: &str) -> String {
    raw_keyword_re().replace_all(dump, "${1}1").into_owned()
}
