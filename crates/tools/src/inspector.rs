use gridview_common::ViewBounds;
use gridview_scene::Scene;
use std::time::Duration;

/// Read-only queries against a scene for the HUD and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        let camera = scene.camera();
        let center = camera.center();
        let stats = scene.stats();
        let timer = scene.frame_timer();
        SceneSummary {
            grid: (scene.grid().width(), scene.grid().height()),
            zoom: camera.zoom(),
            center: (center.x, center.y),
            bounds: camera.view_bounds(),
            highlights: scene.highlights().len(),
            visible: scene.visible_highlights().len(),
            dirty: scene.is_dirty(),
            frames_drawn: stats.frames_drawn,
            frames_skipped: stats.frames_skipped,
            uploads: stats.instance_uploads,
            cull_passes: scene.culler().stats().passes,
            last_cull: scene.culler().stats().last_pass_time,
            avg_frame: timer.average(),
            fps: timer.fps(),
        }
    }
}

/// Snapshot of scene state.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub grid: (u32, u32),
    pub zoom: f64,
    pub center: (f64, f64),
    pub bounds: ViewBounds,
    pub highlights: usize,
    pub visible: usize,
    pub dirty: bool,
    pub frames_drawn: u64,
    pub frames_skipped: u64,
    pub uploads: u64,
    pub cull_passes: u64,
    pub last_cull: Duration,
    pub avg_frame: Duration,
    pub fps: f64,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grid: {}x{}", self.grid.0, self.grid.1)?;
        writeln!(
            f,
            "Camera: zoom={:.3} center=({:.2}, {:.2})",
            self.zoom, self.center.0, self.center.1
        )?;
        let (l, r, b, t) = self.bounds.as_tuple();
        writeln!(f, "Bounds: x=[{l:.2}, {r:.2}] y=[{b:.2}, {t:.2}]")?;
        writeln!(
            f,
            "Highlights: {} visible / {} total",
            self.visible, self.highlights
        )?;
        writeln!(
            f,
            "Frames: drawn={} skipped={} uploads={} dirty={}",
            self.frames_drawn, self.frames_skipped, self.uploads, self.dirty
        )?;
        write!(
            f,
            "Timing: cull_passes={} last_cull={:?} avg_frame={:?} fps={:.1}",
            self.cull_passes, self.last_cull, self.avg_frame, self.fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_common::{CellCoord, GridConfig};
    use gridview_render::DebugTextRenderer;
    use std::time::Instant;

    fn scene() -> Scene {
        let mut scene = Scene::with_grid(GridConfig::new(64, 64, 0).unwrap()).unwrap();
        scene.resize(640, 640);
        scene
    }

    #[test]
    fn summary_fresh_scene() {
        let summary = SceneInspector::summary(&scene());
        assert_eq!(summary.grid, (64, 64));
        assert_eq!(summary.zoom, 1.0);
        assert_eq!(summary.center, (32.0, 32.0));
        assert_eq!(summary.highlights, 0);
        assert_eq!(summary.frames_drawn, 0);
        assert!(summary.dirty);
    }

    #[test]
    fn summary_after_frame() {
        let mut scene = scene();
        scene.set_highlights([CellCoord::new(1, 1), CellCoord::new(2, 2)]);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start);
        scene.tick(&mut renderer, start + Duration::from_millis(1));

        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.highlights, 2);
        assert_eq!(summary.visible, 2);
        assert_eq!(summary.frames_drawn, 1);
        assert_eq!(summary.frames_skipped, 1);
        assert_eq!(summary.uploads, 1);
        assert_eq!(summary.cull_passes, 1);
        assert!(!summary.dirty);
    }

    #[test]
    fn summary_display() {
        let text = SceneInspector::summary(&scene()).to_string();
        assert!(text.contains("Grid: 64x64"));
        assert!(text.contains("zoom=1.000"));
        assert!(text.contains("0 visible / 0 total"));
    }
}
