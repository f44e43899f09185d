use glam::Vec2;
use gridview_common::GridConfig;

/// Fraction of a cell trimmed from each side of a highlight quad, leaving a
/// thin gap between neighbouring highlights.
pub const HIGHLIGHT_INSET: f32 = 0.08;

/// Line-list vertices for every grid line: `width + 1` vertical lines
/// followed by `height + 1` horizontal lines, two vertices each.
pub fn grid_line_vertices(grid: &GridConfig) -> Vec<Vec2> {
    let width = grid.width();
    let height = grid.height();
    let mut verts = Vec::with_capacity(grid_vertex_count(grid));

    for x in 0..=width {
        let x = x as f32;
        verts.push(Vec2::new(x, 0.0));
        verts.push(Vec2::new(x, height as f32));
    }
    for y in 0..=height {
        let y = y as f32;
        verts.push(Vec2::new(0.0, y));
        verts.push(Vec2::new(width as f32, y));
    }
    tracing::debug!(width, height, vertices = verts.len(), "built grid line geometry");
    verts
}

pub fn grid_vertex_count(grid: &GridConfig) -> usize {
    2 * (grid.width() as usize + 1) + 2 * (grid.height() as usize + 1)
}

/// Two triangles covering the unit cell shrunk by `inset` on every side.
pub fn highlight_quad(inset: f32) -> [Vec2; 6] {
    let lo = inset;
    let hi = 1.0 - inset;
    [
        Vec2::new(lo, lo),
        Vec2::new(hi, lo),
        Vec2::new(hi, hi),
        Vec2::new(lo, lo),
        Vec2::new(hi, hi),
        Vec2::new(lo, hi),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_vertices_cover_extent() {
        let grid = GridConfig::new(3, 2, 0).unwrap();
        let verts = grid_line_vertices(&grid);
        assert_eq!(verts.len(), grid_vertex_count(&grid));
        assert_eq!(verts.len(), 2 * 4 + 2 * 3);

        // First vertical line, last horizontal line.
        assert_eq!(verts[0], Vec2::new(0.0, 0.0));
        assert_eq!(verts[1], Vec2::new(0.0, 2.0));
        assert_eq!(verts[verts.len() - 2], Vec2::new(0.0, 2.0));
        assert_eq!(verts[verts.len() - 1], Vec2::new(3.0, 2.0));
        assert!(
            verts
                .iter()
                .all(|v| (0.0..=3.0).contains(&v.x) && (0.0..=2.0).contains(&v.y))
        );
    }

    #[test]
    fn full_size_grid_vertex_count() {
        let grid = GridConfig::default();
        assert_eq!(grid_vertex_count(&grid), 4100);
    }

    #[test]
    fn quad_is_inset_inside_unit_cell() {
        let quad = highlight_quad(HIGHLIGHT_INSET);
        for v in quad {
            assert!(v.x >= HIGHLIGHT_INSET && v.x <= 1.0 - HIGHLIGHT_INSET);
            assert!(v.y >= HIGHLIGHT_INSET && v.y <= 1.0 - HIGHLIGHT_INSET);
        }
        // Two triangles with the same winding cover the square.
        let area = |a: Vec2, b: Vec2, c: Vec2| (b - a).perp_dot(c - a) * 0.5;
        let side = 1.0 - 2.0 * HIGHLIGHT_INSET;
        let total = area(quad[0], quad[1], quad[2]) + area(quad[3], quad[4], quad[5]);
        assert!((total - side * side).abs() < 1e-6);
    }
}
