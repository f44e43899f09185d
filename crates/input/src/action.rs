use glam::DVec2;

/// Pointer buttons the host window reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

/// Raw host-window input, in screen pixels with y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Resize { width: u32, height: u32 },
    /// `delta` is in wheel units; one notch is 120.
    Wheel { position: DVec2, delta: f64 },
    PointerDown { position: DVec2, button: PointerButton },
    PointerMove { position: DVec2 },
    PointerUp { position: DVec2, button: PointerButton },
    /// The pointer left the window or focus was lost mid-drag.
    PointerCancel,
    ResetView,
}

/// A scene mutation produced from input.
///
/// The scene consumes actions, never raw input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Zoom around a screen point, keeping the world point under it fixed.
    ZoomAt { position: DVec2, delta: f64 },
    /// Drag the view so the world point at `from` ends up under `to`.
    Pan { from: DVec2, to: DVec2 },
    Resize { width: u32, height: u32 },
    /// Zoom 1, centered on the grid.
    ResetView,
    /// A primary click; toggles the highlight under `position`.
    ToggleCell { position: DVec2 },
}

/// Outcome of offering one event to the handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// Not ours; the host may route it elsewhere.
    Ignored,
    /// Handled with no camera change.
    Consumed,
    /// Handled; apply this action.
    Apply(Action),
}

impl Dispatch {
    pub fn is_consumed(&self) -> bool {
        !matches!(self, Dispatch::Ignored)
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            Dispatch::Apply(action) => Some(*action),
            _ => None,
        }
    }
}
