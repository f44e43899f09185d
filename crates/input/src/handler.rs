use crate::action::{Action, Dispatch, InputEvent, PointerButton};
use glam::DVec2;

/// A primary release within this many pixels of its press, on both axes, is a click.
pub const CLICK_SLOP: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
struct Drag {
    origin: DVec2,
    last: DVec2,
}

/// Maps host input to scene actions.
///
/// Holds only the press origin and last pointer position while the primary
/// button is down. There is no inertia.
#[derive(Debug, Default)]
pub struct InteractionHandler {
    drag: Option<Drag>,
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a primary-button drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle(&mut self, event: InputEvent) -> Dispatch {
        match event {
            InputEvent::Resize { width, height } => {
                Dispatch::Apply(Action::Resize { width, height })
            }
            InputEvent::Wheel { position, delta } => self.wheel(position, delta),
            InputEvent::PointerDown { position, button } => self.pointer_down(position, button),
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp { position, button } => self.pointer_up(position, button),
            InputEvent::PointerCancel => self.cancel(),
            InputEvent::ResetView => {
                self.drag = None;
                Dispatch::Apply(Action::ResetView)
            }
        }
    }

    /// Always consumed. A zero delta is reported as consumed without an action.
    pub fn wheel(&mut self, position: DVec2, delta: f64) -> Dispatch {
        if delta == 0.0 || delta.is_nan() {
            return Dispatch::Consumed;
        }
        Dispatch::Apply(Action::ZoomAt { position, delta })
    }

    pub fn pointer_down(&mut self, position: DVec2, button: PointerButton) -> Dispatch {
        if button != PointerButton::Primary {
            return Dispatch::Ignored;
        }
        self.drag = Some(Drag {
            origin: position,
            last: position,
        });
        Dispatch::Consumed
    }

    pub fn pointer_move(&mut self, position: DVec2) -> Dispatch {
        let Some(drag) = self.drag.as_mut() else {
            return Dispatch::Ignored;
        };
        let from = std::mem::replace(&mut drag.last, position);
        if from == position {
            return Dispatch::Consumed;
        }
        Dispatch::Apply(Action::Pan { from, to: position })
    }

    /// Ends a drag. A release near the press origin is a click and toggles
    /// the cell under it instead of panning the last leg.
    pub fn pointer_up(&mut self, position: DVec2, button: PointerButton) -> Dispatch {
        if button != PointerButton::Primary {
            return Dispatch::Ignored;
        }
        let Some(drag) = self.drag.take() else {
            return Dispatch::Ignored;
        };
        tracing::trace!(origin = ?drag.origin, ?position, "drag released");
        let travel = (position - drag.origin).abs();
        if travel.x < CLICK_SLOP && travel.y < CLICK_SLOP {
            return Dispatch::Apply(Action::ToggleCell { position });
        }
        if drag.last == position {
            return Dispatch::Consumed;
        }
        Dispatch::Apply(Action::Pan {
            from: drag.last,
            to: position,
        })
    }

    /// Drops any drag in progress without panning or clicking.
    pub fn cancel(&mut self) -> Dispatch {
        match self.drag.take() {
            Some(_) => Dispatch::Consumed,
            None => Dispatch::Ignored,
        }
    }
}
