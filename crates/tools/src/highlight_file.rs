use gridview_common::{CellCoord, GridConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Errors from reading a highlight file.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of a highlight file. `x == -1` marks the whole row `y`,
/// `y == -1` the whole column `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightEntry {
    pub x: i64,
    pub y: i64,
}

/// Cells expanded from a highlight file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedHighlights {
    /// Distinct cells in file order.
    pub cells: Vec<CellCoord>,
    /// In-grid entries; a repeated single cell is not counted again.
    pub loaded: usize,
    /// Entries outside the grid.
    pub skipped: usize,
}

/// Read a JSON array of `{"x": .., "y": ..}` entries from `path`.
pub fn load_highlights(
    path: impl AsRef<Path>,
    grid: &GridConfig,
) -> Result<LoadedHighlights, FeedError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let entries: Vec<HighlightEntry> = serde_json::from_reader(std::io::BufReader::new(file))?;
    let loaded = expand_entries(&entries, grid);
    tracing::info!(
        path = %path.display(),
        loaded = loaded.loaded,
        skipped = loaded.skipped,
        cells = loaded.cells.len(),
        "loaded highlight file"
    );
    Ok(loaded)
}

/// Parse JSON text holding a highlight array.
pub fn parse_highlights(text: &str, grid: &GridConfig) -> Result<LoadedHighlights, FeedError> {
    let entries: Vec<HighlightEntry> = serde_json::from_str(text)?;
    Ok(expand_entries(&entries, grid))
}

/// Expand rows and columns into cells and drop repeats.
pub fn expand_entries(entries: &[HighlightEntry], grid: &GridConfig) -> LoadedHighlights {
    let width = i64::from(grid.width());
    let height = i64::from(grid.height());
    let mut seen = HashSet::new();
    let mut out = LoadedHighlights::default();
    let mut push = |cell: CellCoord, out: &mut LoadedHighlights| {
        if seen.insert(cell) {
            out.cells.push(cell);
            true
        } else {
            false
        }
    };

    for entry in entries {
        let HighlightEntry { x, y } = *entry;
        if x == -1 && (0..height).contains(&y) {
            for col in 0..width {
                push(CellCoord::new(col as i32, y as i32), &mut out);
            }
            out.loaded += 1;
        } else if y == -1 && (0..width).contains(&x) {
            for row in 0..height {
                push(CellCoord::new(x as i32, row as i32), &mut out);
            }
            out.loaded += 1;
        } else if (0..width).contains(&x) && (0..height).contains(&y) {
            if push(CellCoord::new(x as i32, y as i32), &mut out) {
                out.loaded += 1;
            }
        } else {
            out.skipped += 1;
        }
    }
    out
}
