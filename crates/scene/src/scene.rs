use crate::config::{ConfigError, SceneConfig};
use glam::{DVec2, Vec2};
use gridview_common::{CellCoord, GridConfig, ViewBounds};
use gridview_input::{Action, Dispatch, InputEvent, InteractionHandler, PointerButton};
use gridview_render::{FramePlan, GridLod, Palette, Renderer};
use gridview_stream::{FrameDecision, FrameScheduler, FrameTimer, VisibilityCuller};
use gridview_viewport::Camera;
use std::time::Instant;

/// Number of frame intervals kept for statistics.
const FRAME_HISTORY: usize = 120;

/// Frame counters kept by the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub frames_drawn: u64,
    pub frames_skipped: u64,
    pub instance_uploads: u64,
}

/// The viewer core. Owns camera, highlight set, culler, scheduler and input
/// state; all mutation goes through its methods.
pub struct Scene {
    grid: GridConfig,
    camera: Camera,
    highlights: Vec<Vec2>,
    culler: VisibilityCuller,
    scheduler: FrameScheduler,
    input: InteractionHandler,
    lod: GridLod,
    palette: Palette,
    timer: FrameTimer,
    stats: SceneStats,
}

impl Scene {
    /// Build a scene from a validated configuration. The highlight set starts
    /// empty and the scene starts dirty.
    pub fn new(config: &SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            width = config.grid.width(),
            height = config.grid.height(),
            target_fps = config.frame.target_fps,
            "scene created"
        );
        Ok(Self {
            grid: config.grid,
            camera: Camera::new(&config.grid, config.camera),
            highlights: Vec::new(),
            culler: VisibilityCuller::new(config.cull),
            scheduler: FrameScheduler::new(config.frame),
            input: InteractionHandler::new(),
            lod: config.lod,
            palette: config.palette,
            timer: FrameTimer::new(FRAME_HISTORY),
            stats: SceneStats::default(),
        })
    }

    /// Scene over `grid` with every other setting at its default.
    pub fn with_grid(grid: GridConfig) -> Result<Self, ConfigError> {
        Self::new(&SceneConfig {
            grid,
            ..SceneConfig::default()
        })
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn highlights(&self) -> &[Vec2] {
        &self.highlights
    }

    /// Highlights inside the view as of the last drawn frame.
    pub fn visible_highlights(&self) -> &[Vec2] {
        self.culler.visible()
    }

    pub fn culler(&self) -> &VisibilityCuller {
        &self.culler
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn lod(&self) -> &GridLod {
        &self.lod
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty()
    }

    pub fn view_bounds(&self) -> ViewBounds {
        self.camera.view_bounds()
    }

    /// Offer a host event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        let dispatch = self.input.handle(event);
        self.dispatch(dispatch)
    }

    pub fn handle_wheel(&mut self, position: DVec2, delta: f64) -> bool {
        let dispatch = self.input.wheel(position, delta);
        self.dispatch(dispatch)
    }

    pub fn handle_pointer_down(&mut self, position: DVec2, button: PointerButton) -> bool {
        let dispatch = self.input.pointer_down(position, button);
        self.dispatch(dispatch)
    }

    pub fn handle_pointer_move(&mut self, position: DVec2) -> bool {
        let dispatch = self.input.pointer_move(position);
        self.dispatch(dispatch)
    }

    pub fn handle_pointer_up(&mut self, position: DVec2, button: PointerButton) -> bool {
        let dispatch = self.input.pointer_up(position, button);
        self.dispatch(dispatch)
    }

    /// Drop a drag whose release the host will never deliver.
    pub fn handle_pointer_cancel(&mut self) -> bool {
        let dispatch = self.input.cancel();
        self.dispatch(dispatch)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.apply(Action::Resize { width, height });
    }

    pub fn reset_view(&mut self) {
        self.apply(Action::ResetView);
    }

    /// Place the camera directly; zoom is clamped.
    pub fn look_at(&mut self, center: DVec2, zoom: f64) {
        self.camera.look_at(center, zoom);
        self.scheduler.mark_dirty();
    }

    /// Replace the full highlight set. Cells are stored by their lower-left
    /// corner; duplicates are kept. An empty input clears all highlights.
    pub fn set_highlights<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = CellCoord>,
    {
        self.highlights.clear();
        self.highlights
            .extend(cells.into_iter().map(|c| c.lower_left()));
        self.culler.invalidate();
        self.scheduler.mark_dirty();
        tracing::debug!(count = self.highlights.len(), "highlights replaced");
    }

    pub fn clear_highlights(&mut self) {
        self.set_highlights(std::iter::empty());
    }

    /// Add `cell` if absent, otherwise remove every copy of it. Returns
    /// whether the cell is highlighted afterwards. Cells outside the grid are
    /// left alone and report `false`.
    pub fn toggle_highlight(&mut self, cell: CellCoord) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        let corner = cell.lower_left();
        let before = self.highlights.len();
        self.highlights.retain(|p| *p != corner);
        let added = self.highlights.len() == before;
        if added {
            self.highlights.push(corner);
        }
        self.culler.invalidate();
        self.scheduler.mark_dirty();
        tracing::debug!(x = cell.x, y = cell.y, added, "highlight toggled");
        added
    }

    /// Grid cell under a screen point, if the point lies on the grid.
    pub fn cell_at(&self, screen_point: DVec2) -> Option<CellCoord> {
        let world = self.camera.screen_to_world(screen_point);
        let cell = CellCoord::new(world.x.floor() as i32, world.y.floor() as i32);
        self.grid.contains(cell).then_some(cell)
    }

    /// Force the next frame request to draw.
    pub fn request_redraw(&mut self) {
        self.scheduler.mark_dirty();
    }

    /// Whether a frame request at `now` would draw. Lets the host skip
    /// acquiring a surface for frames that would be dropped.
    pub fn frame_due(&self, now: Instant) -> bool {
        self.scheduler.decide(now) == FrameDecision::Draw
    }

    /// Run one frame request. Returns `None` when the scheduler skips it;
    /// nothing touches the renderer in that case.
    pub fn tick<R: Renderer>(&mut self, renderer: &mut R, now: Instant) -> Option<R::Output> {
        let previous = self.scheduler.last_frame();
        if self.scheduler.begin_frame(now) == FrameDecision::Skip {
            self.stats.frames_skipped += 1;
            tracing::trace!("frame skipped");
            return None;
        }
        if let Some(previous) = previous {
            self.timer.record(now.saturating_duration_since(previous));
        }

        let bounds = self.camera.view_bounds();
        if self.culler.refresh(&self.highlights, bounds).needs_upload() {
            renderer.upload_instances(self.culler.visible());
            self.stats.instance_uploads += 1;
        }

        let plan = FramePlan::new(
            self.camera.projection(),
            self.camera.zoom() as f32,
            self.culler.visible().len(),
            &self.lod,
            &self.palette,
        );
        self.stats.frames_drawn += 1;
        tracing::trace!(
            zoom = self.camera.zoom(),
            visible = self.culler.visible().len(),
            "frame drawn"
        );
        Some(renderer.render(&plan))
    }

    fn dispatch(&mut self, dispatch: Dispatch) -> bool {
        if let Some(action) = dispatch.action() {
            self.apply(action);
        }
        dispatch.is_consumed()
    }

    fn apply(&mut self, action: Action) {
        let changed = match action {
            Action::ZoomAt { position, delta } => self.camera.zoom_at(position, delta),
            Action::Pan { from, to } => self.camera.pan(from, to),
            Action::Resize { width, height } => {
                self.camera.set_viewport(width, height);
                true
            }
            Action::ResetView => {
                self.camera.reset();
                true
            }
            Action::ToggleCell { position } => {
                if let Some(cell) = self.cell_at(position) {
                    self.toggle_highlight(cell);
                }
                false
            }
        };
        if changed {
            self.scheduler.mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridview_render::DebugTextRenderer;
    use std::time::Duration;

    fn scene(highlight_count: usize) -> Scene {
        let grid = GridConfig::new(1024, 1024, highlight_count).unwrap();
        let mut scene = Scene::with_grid(grid).unwrap();
        scene.resize(800, 800);
        scene
    }

    fn cells(points: &[(i32, i32)]) -> Vec<CellCoord> {
        points.iter().copied().map(CellCoord::from).collect()
    }

    #[test]
    fn new_scene_is_dirty() {
        let scene = scene(0);
        assert!(scene.is_dirty());
        assert!(scene.frame_due(Instant::now()));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneConfig::default();
        config.frame.target_fps = 0;
        assert!(Scene::new(&config).is_err());
    }

    #[test]
    fn duplicates_survive_culling() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(5, 5), (5, 5), (999, 999)]));
        let bounds = scene.view_bounds();
        assert_eq!(bounds.as_tuple(), (0.0, 1024.0, 0.0, 1024.0));

        let mut renderer = DebugTextRenderer::new();
        let output = scene.tick(&mut renderer, Instant::now()).unwrap();
        assert_eq!(scene.visible_highlights().len(), 3);
        assert_eq!(renderer.instances().len(), 3);
        assert!(output.contains("3 instances"));
    }

    #[test]
    fn max_zoom_bounds_around_center() {
        let mut scene = scene(0);
        scene.look_at(DVec2::new(512.0, 512.0), 64.0);
        let (l, r, b, t) = scene.view_bounds().as_tuple();
        for (got, want) in [(l, 504.0), (r, 520.0), (b, 504.0), (t, 520.0)] {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn zero_wheel_is_consumed_noop() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        scene.tick(&mut renderer, Instant::now()).unwrap();
        assert!(!scene.is_dirty());

        let zoom = scene.camera().zoom();
        let center = scene.camera().center();
        assert!(scene.handle_wheel(DVec2::new(100.0, 100.0), 0.0));
        assert!(!scene.is_dirty());
        assert_eq!(scene.camera().zoom(), zoom);
        assert_eq!(scene.camera().center(), center);
    }

    #[test]
    fn wheel_at_clamp_is_consumed_without_dirtying() {
        let mut scene = scene(0);
        scene.look_at(DVec2::new(512.0, 512.0), 64.0);
        let mut renderer = DebugTextRenderer::new();
        scene.tick(&mut renderer, Instant::now()).unwrap();

        assert!(scene.handle_wheel(DVec2::new(10.0, 10.0), 120.0));
        assert!(!scene.is_dirty());
        assert_eq!(scene.camera().zoom(), 64.0);
    }

    #[test]
    fn wheel_zoom_keeps_cursor_point() {
        let mut scene = scene(0);
        let cursor = DVec2::new(200.0, 600.0);
        let before = scene.camera().screen_to_world(cursor);
        assert!(scene.handle_wheel(cursor, 240.0));
        let after = scene.camera().screen_to_world(cursor);
        assert!((before - after).length() < 1e-4);
        assert!(scene.camera().zoom() > 1.0);
    }

    #[test]
    fn identical_bounds_upload_once() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(1, 1), (2, 2), (3, 3)]));
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();

        scene.tick(&mut renderer, start).unwrap();
        scene.request_redraw();
        scene.tick(&mut renderer, start + Duration::from_millis(1)).unwrap();
        scene.request_redraw();
        scene.tick(&mut renderer, start + Duration::from_millis(2)).unwrap();

        assert_eq!(renderer.frame_count(), 3);
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(scene.stats().instance_uploads, 1);
    }

    #[test]
    fn pan_with_same_subset_skips_upload() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(512, 512)]));
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start).unwrap();

        // A small drag moves the bounds but keeps the middle cell in view.
        let from = DVec2::new(400.0, 400.0);
        scene.handle_pointer_down(from, PointerButton::Primary);
        assert!(scene.handle_pointer_move(DVec2::new(410.0, 400.0)));
        scene.handle_pointer_up(DVec2::new(410.0, 400.0), PointerButton::Primary);
        assert!(scene.is_dirty());

        scene.tick(&mut renderer, start + Duration::from_millis(20)).unwrap();
        assert_eq!(renderer.frame_count(), 2);
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(scene.culler().stats().passes, 2);
    }

    #[test]
    fn panning_away_uploads_smaller_subset() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(10, 10), (1000, 1000)]));
        scene.look_at(DVec2::new(10.0, 10.0), 64.0);
        let mut renderer = DebugTextRenderer::new();
        scene.tick(&mut renderer, Instant::now()).unwrap();
        assert_eq!(renderer.instances(), &[Vec2::new(10.0, 10.0)]);
    }

    #[test]
    fn clearing_highlights_uploads_empty_subset() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(1, 1)]));
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start).unwrap();

        scene.set_highlights(Vec::<CellCoord>::new());
        assert!(scene.is_dirty());
        let output = scene
            .tick(&mut renderer, start + Duration::from_millis(1))
            .unwrap();
        assert_eq!(renderer.upload_count(), 2);
        assert!(renderer.instances().is_empty());
        assert!(output.contains("Highlights: none"));
    }

    #[test]
    fn replacing_highlights_rescans_same_bounds() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start).unwrap();
        assert_eq!(renderer.upload_count(), 0);

        scene.set_highlights(cells(&[(7, 7)]));
        scene
            .tick(&mut renderer, start + Duration::from_millis(1))
            .unwrap();
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(renderer.instances(), &[Vec2::new(7.0, 7.0)]);
    }

    #[test]
    fn throttle_skips_idle_request() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        assert!(scene.tick(&mut renderer, start).is_some());
        assert!(!scene.frame_due(start + Duration::from_millis(5)));
        assert!(scene
            .tick(&mut renderer, start + Duration::from_millis(5))
            .is_none());
        assert_eq!(renderer.frame_count(), 1);
        assert_eq!(scene.stats().frames_skipped, 1);

        assert!(scene
            .tick(&mut renderer, start + Duration::from_millis(20))
            .is_some());
    }

    #[test]
    fn mutation_overrides_throttle() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start).unwrap();
        scene.handle_wheel(DVec2::new(400.0, 400.0), 120.0);
        assert!(scene
            .tick(&mut renderer, start + Duration::from_millis(5))
            .is_some());
    }

    #[test]
    fn grid_pass_skipped_when_zoomed_out() {
        let mut scene = scene(0);
        scene.look_at(DVec2::new(512.0, 512.0), 0.1);
        let mut renderer = DebugTextRenderer::new();
        let output = scene.tick(&mut renderer, Instant::now()).unwrap();
        assert!(output.contains("Grid: skipped"));
    }

    #[test]
    fn secondary_drag_is_not_consumed() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        scene.tick(&mut renderer, Instant::now()).unwrap();
        assert!(!scene.handle_pointer_down(DVec2::ZERO, PointerButton::Secondary));
        assert!(!scene.handle_pointer_move(DVec2::new(50.0, 50.0)));
        assert!(!scene.is_dirty());
    }

    #[test]
    fn zoom_then_pan_compose() {
        let mut scene = scene(0);
        scene.handle_event(InputEvent::Wheel {
            position: DVec2::new(400.0, 400.0),
            delta: 120.0,
        });
        let zoom = scene.camera().zoom();
        let anchor = scene.camera().screen_to_world(DVec2::new(100.0, 100.0));
        scene.handle_event(InputEvent::PointerDown {
            position: DVec2::new(100.0, 100.0),
            button: PointerButton::Primary,
        });
        scene.handle_event(InputEvent::PointerMove {
            position: DVec2::new(300.0, 250.0),
        });
        let moved = scene.camera().screen_to_world(DVec2::new(300.0, 250.0));
        assert!((anchor - moved).length() < 1e-4);
        assert_eq!(scene.camera().zoom(), zoom);
    }

    #[test]
    fn reset_view_restores_defaults() {
        let mut scene = scene(0);
        scene.look_at(DVec2::new(3.0, 4.0), 8.0);
        scene.handle_event(InputEvent::ResetView);
        assert_eq!(scene.camera().zoom(), 1.0);
        assert_eq!(scene.camera().center(), DVec2::new(512.0, 512.0));
    }

    #[test]
    fn frame_timer_records_drawn_intervals() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start);
        scene.tick(&mut renderer, start + Duration::from_millis(20));
        scene.tick(&mut renderer, start + Duration::from_millis(40));
        assert_eq!(scene.frame_timer().count(), 2);
        assert_eq!(scene.frame_timer().average(), Duration::from_millis(20));
        assert_eq!(scene.stats().frames_drawn, 3);
    }

    #[test]
    fn cell_at_floors_world_point() {
        let scene = scene(0);
        assert_eq!(
            scene.cell_at(DVec2::new(400.0, 400.0)),
            Some(CellCoord::new(512, 512))
        );
        assert_eq!(
            scene.cell_at(DVec2::new(1.0, 799.0)),
            Some(CellCoord::new(1, 1))
        );
        assert_eq!(scene.cell_at(DVec2::new(-5.0, 400.0)), None);
        assert_eq!(scene.cell_at(DVec2::new(400.0, 805.0)), None);
    }

    #[test]
    fn toggle_adds_then_removes_every_copy() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(3, 3), (3, 3), (4, 4)]));
        assert!(!scene.toggle_highlight(CellCoord::new(3, 3)));
        assert_eq!(scene.highlights(), &[Vec2::new(4.0, 4.0)]);
        assert!(scene.toggle_highlight(CellCoord::new(3, 3)));
        assert_eq!(scene.highlights().len(), 2);
        assert!(!scene.toggle_highlight(CellCoord::new(2000, 3)));
        assert_eq!(scene.highlights().len(), 2);
    }

    #[test]
    fn click_toggles_cell_under_pointer() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        let start = Instant::now();
        scene.tick(&mut renderer, start).unwrap();

        let at = DVec2::new(400.0, 400.0);
        scene.handle_pointer_down(at, PointerButton::Primary);
        assert!(scene.handle_pointer_up(at + DVec2::new(2.0, 1.0), PointerButton::Primary));
        assert_eq!(scene.highlights(), &[Vec2::new(512.0, 512.0)]);
        assert!(scene.is_dirty());

        scene
            .tick(&mut renderer, start + Duration::from_millis(20))
            .unwrap();
        assert_eq!(renderer.instances(), &[Vec2::new(512.0, 512.0)]);

        scene.handle_pointer_down(at, PointerButton::Primary);
        scene.handle_pointer_up(at, PointerButton::Primary);
        assert!(scene.highlights().is_empty());
    }

    #[test]
    fn drag_release_does_not_toggle() {
        let mut scene = scene(0);
        let at = DVec2::new(400.0, 400.0);
        scene.handle_pointer_down(at, PointerButton::Primary);
        scene.handle_pointer_move(at + DVec2::new(40.0, 0.0));
        scene.handle_pointer_up(at + DVec2::new(40.0, 0.0), PointerButton::Primary);
        assert!(scene.highlights().is_empty());
    }

    #[test]
    fn cancelled_drag_stops_panning() {
        let mut scene = scene(0);
        let mut renderer = DebugTextRenderer::new();
        scene.handle_pointer_down(DVec2::new(100.0, 100.0), PointerButton::Primary);
        scene.handle_pointer_move(DVec2::new(150.0, 100.0));
        assert!(scene.handle_pointer_cancel());
        scene.tick(&mut renderer, Instant::now()).unwrap();

        let center = scene.camera().center();
        assert!(!scene.handle_pointer_move(DVec2::new(300.0, 300.0)));
        assert!(!scene.handle_event(InputEvent::PointerCancel));
        assert_eq!(scene.camera().center(), center);
        assert!(!scene.is_dirty());
    }

    #[test]
    fn clear_highlights_empties_set() {
        let mut scene = scene(0);
        scene.set_highlights(cells(&[(1, 1), (2, 2)]));
        scene.clear_highlights();
        assert!(scene.highlights().is_empty());
        assert!(scene.is_dirty());
    }
}
