//! Developer tooling: scene inspector, a seeded highlight feed and JSON
//! highlight files.
//!
//! # Invariants
//! - Tools only read scene state.
//! - The feed is deterministic per seed.
//! - Highlight files yield distinct in-grid cells; out-of-range entries are
//!   counted and skipped.

mod feed;
mod highlight_file;
mod inspector;

pub use feed::random_cells;
pub use highlight_file::{
    FeedError, HighlightEntry, LoadedHighlights, expand_entries, load_highlights,
    parse_highlights,
};
pub use inspector::{SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    concat!("gridview-tools v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
