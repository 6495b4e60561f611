// # Drag Sessions
//
// One DragController per draggable surface (widget grid, asset gallery).
//
// - **geometry**: points and boxes reported by the view layer
// - **strategy**: collision rules (grid vs. vertical list) and synthetic layouts
// - **keyboard**: keyboard commands and directional neighbour lookup
//
// The controller only ever produces a MoveRequest; applying it to a
// collection is the caller's job. Pointer and keyboard paths produce
// identical requests for the same drop.

mod geometry;
mod keyboard;
mod strategy;

pub use geometry::{Point, Rect};
pub use keyboard::{neighbor, Direction, KeyboardCommand};
pub use strategy::{grid_layout, list_layout, CollisionStrategy, Droppable};

use crate::collection::MoveRequest;
use tracing::{debug, info};

/// Pointer travel (in view pixels) before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    /// Pointer is down on an item but hasn't moved far enough to count as a drag
    Pressed { active_id: String, origin: Point },
    Dragging {
        active_id: String,
        source: DragSource,
        /// Pointer drags only; keyboard drags don't track a pointer
        origin: Option<Point>,
        over_id: Option<String>,
    },
}

/// What the view layer needs for hover highlighting
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DragFeedback {
    pub active_id: Option<String>,
    pub over_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DragController {
    strategy: CollisionStrategy,
    activation_distance: f32,
    layout: Vec<Droppable>,
    state: DragState,
}

impl DragController {
    pub fn new(strategy: CollisionStrategy, activation_distance: f32) -> Self {
        DragController {
            strategy,
            activation_distance,
            layout: Vec::new(),
            state: DragState::Idle,
        }
    }

    pub fn strategy(&self) -> CollisionStrategy {
        self.strategy
    }

    /// Switch collision rule. Any gesture in progress is cancelled since its
    /// geometry belongs to the old layout.
    pub fn set_strategy(&mut self, strategy: CollisionStrategy) {
        if self.strategy != strategy {
            self.cancel();
            self.strategy = strategy;
        }
    }

    /// Replace the rendered item boxes.
    ///
    /// If the active item is no longer rendered the drag is cancelled; a
    /// candidate that vanished is cleared.
    pub fn set_layout(&mut self, layout: Vec<Droppable>) {
        self.layout = layout;

        let active_gone = match &self.state {
            DragState::Idle => false,
            DragState::Pressed { active_id, .. } | DragState::Dragging { active_id, .. } => {
                self.rect_of(active_id).is_none()
            }
        };
        if active_gone {
            debug!("Active item left the layout, cancelling drag");
            self.state = DragState::Idle;
            return;
        }

        if let DragState::Dragging { over_id, .. } = &mut self.state {
            let vanished = over_id
                .as_ref()
                .is_some_and(|over| !self.layout.iter().any(|d| &d.id == over));
            if vanished {
                *over_id = None;
            }
        }
    }

    pub fn layout(&self) -> &[Droppable] {
        &self.layout
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn feedback(&self) -> DragFeedback {
        match &self.state {
            DragState::Dragging {
                active_id, over_id, ..
            } => DragFeedback {
                active_id: Some(active_id.clone()),
                over_id: over_id.clone(),
            },
            _ => DragFeedback::default(),
        }
    }

    /// Press on an item. Ignored unless idle and the item is rendered.
    pub fn pointer_down(&mut self, id: &str, at: Point) -> bool {
        if !matches!(self.state, DragState::Idle) || self.rect_of(id).is_none() {
            return false;
        }
        self.state = DragState::Pressed {
            active_id: id.to_string(),
            origin: at,
        };
        true
    }

    /// Pointer moved. Activates a pending press once it has travelled past
    /// the activation distance, then recomputes the drop candidate.
    pub fn pointer_move(&mut self, at: Point) {
        let state = std::mem::replace(&mut self.state, DragState::Idle);

        self.state = match state {
            DragState::Pressed { active_id, origin } => {
                if origin.distance_to(at) > self.activation_distance {
                    info!(active = %active_id, strategy = ?self.strategy, "Drag started");
                    let over_id = self.candidate_for(&active_id, origin, at);
                    DragState::Dragging {
                        active_id,
                        source: DragSource::Pointer,
                        origin: Some(origin),
                        over_id,
                    }
                } else {
                    DragState::Pressed { active_id, origin }
                }
            }
            DragState::Dragging {
                active_id,
                source: DragSource::Pointer,
                origin: Some(origin),
                over_id,
            } => {
                let next = self.candidate_for(&active_id, origin, at);
                if next != over_id {
                    debug!(active = %active_id, over = ?next, "Drop candidate changed");
                }
                DragState::Dragging {
                    active_id,
                    source: DragSource::Pointer,
                    origin: Some(origin),
                    over_id: next,
                }
            }
            other => other,
        };
    }

    /// Pointer released. Returns the move to apply, if the drop lands on a
    /// different item. A release before activation is a plain click.
    pub fn pointer_up(&mut self) -> Option<MoveRequest> {
        if matches!(
            self.state,
            DragState::Dragging {
                source: DragSource::Pointer,
                ..
            }
        ) {
            return self.commit();
        }
        if matches!(self.state, DragState::Pressed { .. }) {
            self.state = DragState::Idle;
        }
        None
    }

    /// Abandon the gesture without any mutation (escape, lost pointer, ...)
    pub fn cancel(&mut self) {
        if !matches!(self.state, DragState::Idle) {
            info!("Drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Drive the controller from the keyboard. Returns a move only on `Drop`.
    pub fn keyboard(&mut self, command: KeyboardCommand) -> Option<MoveRequest> {
        match command {
            KeyboardCommand::PickUp(id) => {
                if matches!(self.state, DragState::Idle) && self.rect_of(&id).is_some() {
                    info!(active = %id, "Keyboard drag started");
                    self.state = DragState::Dragging {
                        over_id: Some(id.clone()),
                        active_id: id,
                        source: DragSource::Keyboard,
                        origin: None,
                    };
                }
                None
            }
            KeyboardCommand::Move(direction) => {
                let from = match &self.state {
                    DragState::Dragging {
                        source: DragSource::Keyboard,
                        over_id: Some(over),
                        ..
                    } => self.rect_of(over),
                    _ => None,
                };
                if let Some(from) = from {
                    if let Some(next) = neighbor(&from, direction, &self.layout).map(str::to_string) {
                        self.set_keyboard_over(next);
                    }
                }
                None
            }
            KeyboardCommand::MoveTo(target) => {
                if self.rect_of(&target).is_some() {
                    self.set_keyboard_over(target);
                }
                None
            }
            KeyboardCommand::Drop => {
                if matches!(
                    self.state,
                    DragState::Dragging {
                        source: DragSource::Keyboard,
                        ..
                    }
                ) {
                    self.commit()
                } else {
                    None
                }
            }
            KeyboardCommand::Cancel => {
                self.cancel();
                None
            }
        }
    }

    fn set_keyboard_over(&mut self, target: String) {
        if let DragState::Dragging {
            source: DragSource::Keyboard,
            over_id,
            ..
        } = &mut self.state
        {
            *over_id = Some(target);
        }
    }

    fn commit(&mut self) -> Option<MoveRequest> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging {
            active_id, over_id, ..
        } = state
        else {
            return None;
        };

        match over_id {
            Some(target_id) if target_id != active_id => {
                info!(active = %active_id, target = %target_id, "Drag committed");
                Some(MoveRequest {
                    active_id,
                    target_id,
                })
            }
            _ => {
                debug!(active = %active_id, "Dropped without a different target");
                None
            }
        }
    }

    fn candidate_for(&self, active_id: &str, origin: Point, at: Point) -> Option<String> {
        let rect = self.rect_of(active_id)?;
        let dragged = rect.translated(at.x - origin.x, at.y - origin.y);
        self.strategy
            .detect(&dragged, &self.layout)
            .map(str::to_string)
    }

    fn rect_of(&self, id: &str) -> Option<Rect> {
        self.layout.iter().find(|d| d.id == id).map(|d| d.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_controller() -> DragController {
        let mut controller = DragController::new(CollisionStrategy::Grid, DEFAULT_ACTIVATION_DISTANCE);
        controller.set_layout(grid_layout(&["a", "b", "c", "d"], 2, 100.0, 100.0));
        controller
    }

    #[test]
    fn test_click_without_travel_does_not_drag() {
        let mut controller = grid_controller();

        assert!(controller.pointer_down("a", Point::new(50.0, 50.0)));
        controller.pointer_move(Point::new(53.0, 52.0));
        assert!(!controller.is_dragging());

        assert_eq!(controller.pointer_up(), None);
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_pointer_drag_onto_other_item_commits_move() {
        let mut controller = grid_controller();

        controller.pointer_down("a", Point::new(50.0, 50.0));
        controller.pointer_move(Point::new(60.0, 50.0));
        assert!(controller.is_dragging());
        // Still mostly over itself
        assert_eq!(controller.feedback().over_id.as_deref(), Some("a"));

        controller.pointer_move(Point::new(150.0, 150.0));
        assert_eq!(controller.feedback().over_id.as_deref(), Some("d"));

        assert_eq!(controller.pointer_up(), Some(MoveRequest::new("a", "d")));
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let mut controller = grid_controller();

        controller.pointer_down("b", Point::new(150.0, 50.0));
        controller.pointer_move(Point::new(160.0, 60.0));

        assert_eq!(controller.pointer_up(), None);
    }

    #[test]
    fn test_drop_outside_targets_is_noop() {
        let mut controller = grid_controller();

        controller.pointer_down("a", Point::new(50.0, 50.0));
        controller.pointer_move(Point::new(900.0, 900.0));
        assert_eq!(controller.feedback().over_id, None);

        assert_eq!(controller.pointer_up(), None);
    }

    #[test]
    fn test_cancel_discards_candidate() {
        let mut controller = grid_controller();

        controller.pointer_down("a", Point::new(50.0, 50.0));
        controller.pointer_move(Point::new(150.0, 50.0));
        controller.cancel();

        assert_eq!(controller.pointer_up(), None);
        assert_eq!(controller.feedback(), DragFeedback::default());
    }

    #[test]
    fn test_press_on_unrendered_item_is_ignored() {
        let mut controller = grid_controller();
        assert!(!controller.pointer_down("zzz", Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_keyboard_path_matches_pointer_path() {
        let mut pointer = grid_controller();
        pointer.pointer_down("a", Point::new(50.0, 50.0));
        pointer.pointer_move(Point::new(150.0, 150.0));
        let by_pointer = pointer.pointer_up();

        let mut keys = grid_controller();
        keys.keyboard(KeyboardCommand::PickUp("a".to_string()));
        keys.keyboard(KeyboardCommand::Move(Direction::Right));
        keys.keyboard(KeyboardCommand::Move(Direction::Down));
        let by_keyboard = keys.keyboard(KeyboardCommand::Drop);

        assert_eq!(by_pointer, by_keyboard);
        assert_eq!(by_keyboard, Some(MoveRequest::new("a", "d")));
    }

    #[test]
    fn test_keyboard_move_to_and_cancel() {
        let mut controller = grid_controller();

        controller.keyboard(KeyboardCommand::PickUp("c".to_string()));
        controller.keyboard(KeyboardCommand::MoveTo("b".to_string()));
        assert_eq!(controller.feedback().over_id.as_deref(), Some("b"));

        assert_eq!(controller.keyboard(KeyboardCommand::Cancel), None);
        assert_eq!(controller.keyboard(KeyboardCommand::Drop), None);
    }

    #[test]
    fn test_active_item_removed_mid_drag_cancels() {
        let mut controller = grid_controller();
        controller.pointer_down("a", Point::new(50.0, 50.0));
        controller.pointer_move(Point::new(150.0, 50.0));

        controller.set_layout(grid_layout(&["b", "c", "d"], 2, 100.0, 100.0));

        assert!(!controller.is_dragging());
        assert_eq!(controller.pointer_up(), None);
    }

    #[test]
    fn test_switching_strategy_cancels_drag() {
        let mut controller = grid_controller();
        controller.keyboard(KeyboardCommand::PickUp("a".to_string()));

        controller.set_strategy(CollisionStrategy::VerticalList);

        assert!(!controller.is_dragging());
        assert_eq!(controller.strategy(), CollisionStrategy::VerticalList);
    }
}
