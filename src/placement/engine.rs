//! Pointer-driven drag lifecycle for people and tables.
//!
//! Every gesture is a [`DragSession`] keyed by pointer id, so independent
//! pointers (multi-touch) never interfere:
//!
//! begin_drag → update_drag* → end_drag | cancel_drag
//!
//! Person gestures stay "pending" until the pointer travels further than the
//! drag threshold; releasing a pending gesture is a click.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::geometry::{clamp_position, clamp_to_extent, Point, Rect, Size};
use super::roster::{Roster, Seat, TableShape};
use crate::config::BoardConfig;

/// The primary mouse button / touch contact.
pub const PRIMARY_BUTTON: i16 = 0;

/// Setup allows table editing; Live locks tables and turns clicks into
/// speaker selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Setup,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub pointer_id: i32,
    pub button: i16,
    pub position: Point,
}

impl PointerInput {
    pub fn primary(pointer_id: i32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            button: PRIMARY_BUTTON,
            position: Point::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeHandle {
    East,
    South,
    SouthEast,
}

impl ResizeHandle {
    fn adjusts_width(&self) -> bool {
        matches!(self, ResizeHandle::East | ResizeHandle::SouthEast)
    }

    fn adjusts_height(&self) -> bool {
        matches!(self, ResizeHandle::South | ResizeHandle::SouthEast)
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DragTarget {
    Person(String),
    Table(String),
    Resize { table_id: String, handle: ResizeHandle },
}

/// Where a person was when their gesture began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    List,
    Canvas,
    Absent,
}

impl Zone {
    fn of(seat: &Seat) -> Self {
        match seat {
            Seat::Listed => Zone::List,
            Seat::Placed(_) => Zone::Canvas,
            Seat::Absent => Zone::Absent,
        }
    }
}

/// Drop zone currently under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hover {
    #[default]
    Outside,
    Canvas,
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragKind {
    Person { person_id: String, origin: Zone },
    TableMove { table_id: String, grab_offset: Point },
    TableResize {
        table_id: String,
        handle: ResizeHandle,
        start_size: Size,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pointer_id: i32,
    pub kind: DragKind,
    pub start: Point,
    pub hover: Hover,
    /// Set once the pointer has moved past the threshold.
    pub dragging: bool,
}

impl DragSession {
    fn targets(&self, target: &DragTarget) -> bool {
        match (&self.kind, target) {
            (DragKind::Person { person_id, .. }, DragTarget::Person(id)) => person_id == id,
            (DragKind::TableMove { table_id, .. }, DragTarget::Table(id))
            | (DragKind::TableMove { table_id, .. }, DragTarget::Resize { table_id: id, .. })
            | (DragKind::TableResize { table_id, .. }, DragTarget::Table(id))
            | (DragKind::TableResize { table_id, .. }, DragTarget::Resize { table_id: id, .. }) => {
                table_id == id
            }
            _ => false,
        }
    }

    fn is_table_gesture(&self) -> bool {
        !matches!(self.kind, DragKind::Person { .. })
    }

    /// A person drag past the threshold has a floating proxy on screen.
    pub fn shows_proxy(&self) -> bool {
        self.dragging && !self.is_table_gesture()
    }
}

/// Viewport bounds of the two drop zones, reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardLayout {
    pub canvas: Rect,
    pub absent: Rect,
}

impl BoardLayout {
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas.width, self.canvas.height)
    }

    /// Absent wins over canvas when the zones overlap.
    pub fn hit_test(&self, point: Point) -> Hover {
        if self.absent.contains(point) {
            Hover::Absent
        } else if self.canvas.contains(point) {
            Hover::Canvas
        } else {
            Hover::Outside
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// No session for this pointer.
    Ignored,
    /// Still within the click threshold.
    Pending,
    /// The gesture just crossed the threshold; show the floating proxy.
    ProxyStarted { person_id: String, at: Point, hover: Hover },
    ProxyMoved { at: Point, hover: Hover, hover_changed: bool },
    TableMoved { table_id: String, position: Point },
    TableResized { table_id: String, size: Size },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Ignored,
    /// Released without crossing the threshold.
    Clicked { person_id: String },
    Placed { person_id: String, at: Point },
    MarkedAbsent { person_id: String },
    /// Canvas-origin drag released outside every zone: seat unchanged.
    Kept { person_id: String },
    ReturnedToList { person_id: String },
    TableReleased { table_id: String },
}

impl DropOutcome {
    /// Whether the roster changed as a result of this drop.
    pub fn mutated_roster(&self) -> bool {
        matches!(
            self,
            DropOutcome::Placed { .. } | DropOutcome::MarkedAbsent { .. } | DropOutcome::ReturnedToList { .. }
        )
    }
}

pub struct PlacementEngine {
    roster: Roster,
    board: BoardConfig,
    layout: BoardLayout,
    stage: Stage,
    sessions: HashMap<i32, DragSession>,
    selected_table: Option<String>,
}

impl PlacementEngine {
    pub fn new(board: BoardConfig) -> Self {
        Self {
            roster: Roster::new(),
            board,
            layout: BoardLayout::default(),
            stage: Stage::Setup,
            sessions: HashMap::new(),
            selected_table: None,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: BoardLayout) {
        self.layout = layout;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Leaving Setup drops table selection and abandons any table gesture.
    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        if stage == Stage::Live {
            self.selected_table = None;
            self.sessions.retain(|_, session| !session.is_table_gesture());
        }
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.selected_table.as_deref()
    }

    pub fn session(&self, pointer_id: i32) -> Option<&DragSession> {
        self.sessions.get(&pointer_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn add_table(&mut self, shape: TableShape) -> Option<String> {
        if !self.tables_editable() {
            return None;
        }
        Some(self.roster.add_table(shape, &self.board).id.clone())
    }

    pub fn delete_table(&mut self, table_id: &str) -> bool {
        if !self.tables_editable() {
            return false;
        }
        if self.selected_table.as_deref() == Some(table_id) {
            self.selected_table = None;
        }
        self.sessions.retain(|_, s| !s.targets(&DragTarget::Table(table_id.to_string())));
        self.roster.delete_table(table_id)
    }

    pub fn clear_tables(&mut self) -> bool {
        if !self.tables_editable() {
            return false;
        }
        self.selected_table = None;
        self.sessions.retain(|_, session| !session.is_table_gesture());
        self.roster.clear_tables();
        true
    }

    fn tables_editable(&self) -> bool {
        if self.stage != Stage::Setup {
            debug!("Table edits are locked outside setup");
            return false;
        }
        true
    }

    /// Start a gesture. Returns false when the input is ignored: non-primary
    /// button, a pointer that already owns a session, an unknown target, a
    /// table gesture outside setup, or an entity another pointer is dragging.
    pub fn begin_drag(&mut self, target: DragTarget, input: PointerInput) -> bool {
        if input.button != PRIMARY_BUTTON {
            return false;
        }
        if self.sessions.contains_key(&input.pointer_id) {
            debug!("Pointer {} already has an active drag", input.pointer_id);
            return false;
        }
        if self.sessions.values().any(|s| s.targets(&target)) {
            debug!("{:?} is already being dragged by another pointer", target);
            return false;
        }

        let kind = match target {
            DragTarget::Person(person_id) => {
                let Some(person) = self.roster.person(&person_id) else {
                    return false;
                };
                DragKind::Person {
                    origin: Zone::of(&person.seat),
                    person_id,
                }
            }
            DragTarget::Table(table_id) => {
                if !self.tables_editable() {
                    return false;
                }
                let Some(table) = self.roster.table(&table_id) else {
                    return false;
                };
                let local = self.layout.canvas.to_local(input.position);
                let grab_offset = Point::new(local.x - table.position.x, local.y - table.position.y);
                self.selected_table = Some(table_id.clone());
                DragKind::TableMove {
                    table_id,
                    grab_offset,
                }
            }
            DragTarget::Resize { table_id, handle } => {
                if !self.tables_editable() {
                    return false;
                }
                let Some(table) = self.roster.table(&table_id) else {
                    return false;
                };
                DragKind::TableResize {
                    start_size: table.size,
                    table_id,
                    handle,
                }
            }
        };

        debug!("Pointer {} began {:?}", input.pointer_id, kind);
        self.sessions.insert(
            input.pointer_id,
            DragSession {
                pointer_id: input.pointer_id,
                kind,
                start: input.position,
                hover: Hover::Outside,
                dragging: false,
            },
        );
        true
    }

    pub fn update_drag(&mut self, input: PointerInput) -> MoveOutcome {
        let threshold = self.board.drag_threshold_px;
        let layout = self.layout;
        let Some(session) = self.sessions.get_mut(&input.pointer_id) else {
            return MoveOutcome::Ignored;
        };

        match session.kind.clone() {
            DragKind::Person { person_id, .. } => {
                let just_started = if session.dragging {
                    false
                } else if session.start.distance_to(input.position) > threshold {
                    session.dragging = true;
                    true
                } else {
                    return MoveOutcome::Pending;
                };

                let hover = layout.hit_test(input.position);
                let hover_changed = hover != session.hover;
                session.hover = hover;

                if just_started {
                    MoveOutcome::ProxyStarted {
                        person_id,
                        at: input.position,
                        hover,
                    }
                } else {
                    MoveOutcome::ProxyMoved {
                        at: input.position,
                        hover,
                        hover_changed,
                    }
                }
            }
            DragKind::TableMove {
                table_id,
                grab_offset,
            } => {
                session.dragging = true;
                match self.move_table(&table_id, input.position, grab_offset) {
                    Some(position) => MoveOutcome::TableMoved { table_id, position },
                    None => MoveOutcome::Ignored,
                }
            }
            DragKind::TableResize {
                table_id,
                handle,
                start_size,
            } => {
                session.dragging = true;
                let delta = Point::new(
                    input.position.x - session.start.x,
                    input.position.y - session.start.y,
                );
                match self.resize_table(&table_id, handle, start_size, delta) {
                    Some(size) => MoveOutcome::TableResized { table_id, size },
                    None => MoveOutcome::Ignored,
                }
            }
        }
    }

    /// Finish the gesture owned by `input.pointer_id` and resolve the drop.
    pub fn end_drag(&mut self, input: PointerInput) -> DropOutcome {
        let Some(session) = self.sessions.remove(&input.pointer_id) else {
            return DropOutcome::Ignored;
        };

        match session.kind {
            DragKind::Person { person_id, origin } => {
                if !session.dragging {
                    return DropOutcome::Clicked { person_id };
                }
                self.drop_person(person_id, origin, input.position)
            }
            DragKind::TableMove { table_id, .. } | DragKind::TableResize { table_id, .. } => {
                DropOutcome::TableReleased { table_id }
            }
        }
    }

    /// External cleanup hook for gestures that never receive a pointer-up
    /// (lost pointer capture, hidden tab). Eagerly applied table moves are
    /// kept.
    pub fn cancel_drag(&mut self, pointer_id: i32) -> Option<DragSession> {
        let cancelled = self.sessions.remove(&pointer_id);
        if cancelled.is_some() {
            warn!("Drag on pointer {} cancelled", pointer_id);
        }
        cancelled
    }

    /// Drop every gesture, returned in pointer order.
    pub fn cancel_all(&mut self) -> Vec<DragSession> {
        let mut cancelled: Vec<DragSession> = self.sessions.drain().map(|(_, s)| s).collect();
        cancelled.sort_by_key(|s| s.pointer_id);
        cancelled
    }

    fn drop_person(&mut self, person_id: String, origin: Zone, at: Point) -> DropOutcome {
        if self.roster.person(&person_id).is_none() {
            debug!("{} left the roster mid-drag", person_id);
            return DropOutcome::Ignored;
        }
        match self.layout.hit_test(at) {
            Hover::Absent => {
                self.roster.set_seat(&person_id, Seat::Absent);
                info!("{} marked absent", person_id);
                DropOutcome::MarkedAbsent { person_id }
            }
            Hover::Canvas => {
                let placement = self.canvas_coords(at);
                self.roster.set_seat(&person_id, Seat::Placed(placement));
                info!("{} placed at ({:.0}, {:.0})", person_id, placement.x, placement.y);
                DropOutcome::Placed {
                    person_id,
                    at: placement,
                }
            }
            Hover::Outside if origin == Zone::Canvas => DropOutcome::Kept { person_id },
            Hover::Outside => {
                self.roster.set_seat(&person_id, Seat::Listed);
                DropOutcome::ReturnedToList { person_id }
            }
        }
    }

    /// Convert a viewport point to a person's top-left on the canvas, centred
    /// under the pointer and clamped to the board.
    pub fn canvas_coords(&self, at: Point) -> Point {
        let half = self.board.person_size / 2.0;
        let local = self.layout.canvas.to_local(at);
        clamp_position(
            Point::new(local.x - half, local.y - half),
            Size::square(self.board.person_size),
            self.layout.canvas_size(),
        )
    }

    fn move_table(&mut self, table_id: &str, pointer: Point, grab_offset: Point) -> Option<Point> {
        let canvas = self.layout.canvas;
        let table = self.roster.table_mut(table_id)?;
        let local = canvas.to_local(pointer);
        table.position = clamp_position(
            Point::new(local.x - grab_offset.x, local.y - grab_offset.y),
            table.size,
            Size::new(canvas.width, canvas.height),
        );
        Some(table.position)
    }

    /// Apply a resize delta to the size captured at gesture start. Circles stay
    /// square; the minimum size yields to the canvas edge when both cannot
    /// hold.
    pub fn resize_table(
        &mut self,
        table_id: &str,
        handle: ResizeHandle,
        start_size: Size,
        delta: Point,
    ) -> Option<Size> {
        if self.stage != Stage::Setup {
            return None;
        }
        let min_size = self.board.min_table_size;
        let canvas = self.layout.canvas_size();
        let table = self.roster.table_mut(table_id)?;

        let mut width = start_size.width;
        let mut height = start_size.height;
        if handle.adjusts_width() {
            width = (start_size.width + delta.x).max(min_size);
        }
        if handle.adjusts_height() {
            height = (start_size.height + delta.y).max(min_size);
        }

        let max_width = clamp_to_extent(canvas.width - table.position.x, f64::MAX);
        let max_height = clamp_to_extent(canvas.height - table.position.y, f64::MAX);

        table.size = if table.shape == TableShape::Circle {
            let side = width.max(height).min(max_width).min(max_height);
            Size::square(side)
        } else {
            Size::new(width.min(max_width), height.min(max_height))
        };
        Some(table.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::roster::Person;

    const CANVAS: Rect = Rect {
        left: 100.0,
        top: 50.0,
        width: 800.0,
        height: 600.0,
    };
    const ABSENT: Rect = Rect {
        left: 950.0,
        top: 50.0,
        width: 200.0,
        height: 200.0,
    };

    fn engine() -> PlacementEngine {
        let mut engine = PlacementEngine::new(BoardConfig::default());
        engine.set_layout(BoardLayout {
            canvas: CANVAS,
            absent: ABSENT,
        });
        engine.roster_mut().replace_members(vec![
            Person::member("alice", "Alice", "", None),
            Person::member("bob", "Bob", "", None),
        ]);
        engine
    }

    fn drag_person(engine: &mut PlacementEngine, id: &str, from: (f64, f64), to: (f64, f64)) -> DropOutcome {
        assert!(engine.begin_drag(DragTarget::Person(id.into()), PointerInput::primary(1, from.0, from.1)));
        engine.update_drag(PointerInput::primary(1, to.0, to.1));
        engine.end_drag(PointerInput::primary(1, to.0, to.1))
    }

    #[test]
    fn test_non_primary_button_ignored() {
        let mut engine = engine();
        let input = PointerInput {
            pointer_id: 1,
            button: 2,
            position: Point::new(0.0, 0.0),
        };
        assert!(!engine.begin_drag(DragTarget::Person("alice".into()), input));
        assert_eq!(engine.active_sessions(), 0);
    }

    #[test]
    fn test_one_session_per_pointer() {
        let mut engine = engine();
        assert!(engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 0.0, 0.0)));
        assert!(!engine.begin_drag(DragTarget::Person("bob".into()), PointerInput::primary(1, 0.0, 0.0)));
        assert!(engine.begin_drag(DragTarget::Person("bob".into()), PointerInput::primary(2, 0.0, 0.0)));
        assert_eq!(engine.active_sessions(), 2);
    }

    #[test]
    fn test_threshold_disambiguates_click() {
        let mut engine = engine();
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 10.0, 10.0));

        // Exactly 6px is still a click.
        assert_eq!(engine.update_drag(PointerInput::primary(1, 16.0, 10.0)), MoveOutcome::Pending);
        assert_eq!(
            engine.end_drag(PointerInput::primary(1, 16.0, 10.0)),
            DropOutcome::Clicked {
                person_id: "alice".into()
            }
        );
        assert!(engine.roster().person("alice").unwrap().is_listed());
    }

    #[test]
    fn test_proxy_starts_past_threshold() {
        let mut engine = engine();
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 10.0, 10.0));
        let outcome = engine.update_drag(PointerInput::primary(1, 15.0, 15.0));
        assert!(matches!(outcome, MoveOutcome::ProxyStarted { hover: Hover::Outside, .. }));

        let outcome = engine.update_drag(PointerInput::primary(1, 200.0, 200.0));
        assert_eq!(
            outcome,
            MoveOutcome::ProxyMoved {
                at: Point::new(200.0, 200.0),
                hover: Hover::Canvas,
                hover_changed: true
            }
        );
    }

    #[test]
    fn test_drop_on_canvas_is_clamped() {
        let mut engine = engine();
        let outcome = drag_person(&mut engine, "alice", (0.0, 0.0), (105.0, 640.0));
        // local (5, 590) minus half person size, clamped to [0, 600 - 72].
        assert_eq!(
            outcome,
            DropOutcome::Placed {
                person_id: "alice".into(),
                at: Point::new(0.0, 528.0)
            }
        );
        assert_eq!(
            engine.roster().person("alice").unwrap().placement(),
            Some(Point::new(0.0, 528.0))
        );
    }

    #[test]
    fn test_drop_on_absent_from_any_origin() {
        let mut engine = engine();
        drag_person(&mut engine, "alice", (0.0, 0.0), (400.0, 300.0));
        let outcome = drag_person(&mut engine, "alice", (400.0, 300.0), (1000.0, 100.0));
        assert_eq!(
            outcome,
            DropOutcome::MarkedAbsent {
                person_id: "alice".into()
            }
        );
        let alice = engine.roster().person("alice").unwrap();
        assert!(alice.is_absent());
        assert_eq!(alice.placement(), None);
    }

    #[test]
    fn test_absent_wins_over_canvas_when_overlapping() {
        let mut engine = engine();
        engine.set_layout(BoardLayout {
            canvas: CANVAS,
            absent: Rect::new(700.0, 400.0, 300.0, 300.0),
        });
        let outcome = drag_person(&mut engine, "bob", (0.0, 0.0), (750.0, 450.0));
        assert_eq!(outcome, DropOutcome::MarkedAbsent { person_id: "bob".into() });
    }

    #[test]
    fn test_canvas_origin_miss_keeps_placement() {
        let mut engine = engine();
        drag_person(&mut engine, "alice", (0.0, 0.0), (400.0, 300.0));
        let before = engine.roster().person("alice").unwrap().placement();

        let outcome = drag_person(&mut engine, "alice", (400.0, 300.0), (20.0, 900.0));
        assert_eq!(outcome, DropOutcome::Kept { person_id: "alice".into() });
        assert_eq!(engine.roster().person("alice").unwrap().placement(), before);
    }

    #[test]
    fn test_absent_origin_miss_returns_to_list() {
        let mut engine = engine();
        drag_person(&mut engine, "bob", (0.0, 0.0), (1000.0, 100.0));
        let outcome = drag_person(&mut engine, "bob", (1000.0, 100.0), (20.0, 900.0));
        assert_eq!(outcome, DropOutcome::ReturnedToList { person_id: "bob".into() });
        assert!(engine.roster().person("bob").unwrap().is_listed());
    }

    #[test]
    fn test_cancel_releases_pointer() {
        let mut engine = engine();
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(7, 0.0, 0.0));
        assert!(!engine.begin_drag(DragTarget::Person("bob".into()), PointerInput::primary(7, 0.0, 0.0)));

        assert!(engine.cancel_drag(7).is_some());
        assert!(engine.begin_drag(DragTarget::Person("bob".into()), PointerInput::primary(7, 0.0, 0.0)));
    }

    #[test]
    fn test_clear_tables_keeps_person_drags() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Oval).unwrap();
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 10.0, 10.0));
        engine.update_drag(PointerInput::primary(1, 200.0, 200.0));
        engine.begin_drag(DragTarget::Table(table_id), PointerInput::primary(2, 150.0, 100.0));

        assert!(engine.clear_tables());
        assert!(engine.session(1).is_some_and(|s| s.shows_proxy()));
        assert!(engine.session(2).is_none());
        assert!(matches!(
            engine.end_drag(PointerInput::primary(1, 400.0, 300.0)),
            DropOutcome::Placed { .. }
        ));
    }

    #[test]
    fn test_cancel_all_returns_sessions_in_pointer_order() {
        let mut engine = engine();
        engine.begin_drag(DragTarget::Person("bob".into()), PointerInput::primary(9, 10.0, 10.0));
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(3, 10.0, 10.0));
        engine.update_drag(PointerInput::primary(3, 200.0, 200.0));

        let cancelled = engine.cancel_all();
        let ids: Vec<i32> = cancelled.iter().map(|s| s.pointer_id).collect();
        assert_eq!(ids, vec![3, 9]);
        assert!(cancelled[0].shows_proxy());
        assert!(!cancelled[1].shows_proxy());
        assert_eq!(engine.active_sessions(), 0);
    }

    #[test]
    fn test_drop_of_person_removed_mid_drag_is_ignored() {
        let mut engine = engine();
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 10.0, 10.0));
        engine.update_drag(PointerInput::primary(1, 400.0, 300.0));
        engine
            .roster_mut()
            .replace_members(vec![Person::member("bob", "Bob", "", None)]);

        let outcome = engine.end_drag(PointerInput::primary(1, 400.0, 300.0));
        assert_eq!(outcome, DropOutcome::Ignored);
        assert!(!outcome.mutated_roster());
        assert!(engine.roster().person("alice").is_none());
    }

    #[test]
    fn test_same_person_cannot_be_dragged_twice() {
        let mut engine = engine();
        assert!(engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(1, 0.0, 0.0)));
        assert!(!engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(2, 0.0, 0.0)));
    }

    #[test]
    fn test_table_move_clamped_to_canvas() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Oval).unwrap();
        // Grab the table 10px inside its top-left corner (40,40 on canvas).
        assert!(engine.begin_drag(DragTarget::Table(table_id.clone()), PointerInput::primary(1, 150.0, 100.0)));
        assert_eq!(engine.selected_table(), Some(table_id.as_str()));

        let outcome = engine.update_drag(PointerInput::primary(1, 2000.0, 2000.0));
        assert_eq!(
            outcome,
            MoveOutcome::TableMoved {
                table_id: table_id.clone(),
                position: Point::new(560.0, 450.0)
            }
        );
        assert_eq!(
            engine.end_drag(PointerInput::primary(1, 2000.0, 2000.0)),
            DropOutcome::TableReleased { table_id }
        );
    }

    #[test]
    fn test_tables_locked_in_live_stage() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Rect).unwrap();
        engine.set_stage(Stage::Live);

        assert!(engine.add_table(TableShape::Oval).is_none());
        assert!(!engine.delete_table(&table_id));
        assert!(!engine.begin_drag(DragTarget::Table(table_id.clone()), PointerInput::primary(1, 150.0, 100.0)));
        assert!(!engine.begin_drag(
            DragTarget::Resize {
                table_id,
                handle: ResizeHandle::SouthEast
            },
            PointerInput::primary(1, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_entering_live_abandons_table_gestures() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Rect).unwrap();
        engine.begin_drag(DragTarget::Table(table_id), PointerInput::primary(1, 150.0, 100.0));
        engine.begin_drag(DragTarget::Person("alice".into()), PointerInput::primary(2, 0.0, 0.0));

        engine.set_stage(Stage::Live);
        assert!(engine.session(1).is_none());
        assert!(engine.session(2).is_some());
        assert!(engine.selected_table().is_none());
    }

    #[test]
    fn test_resize_enforces_minimum() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Rect).unwrap();
        let size = engine
            .resize_table(&table_id, ResizeHandle::SouthEast, Size::new(220.0, 130.0), Point::new(-500.0, -500.0))
            .unwrap();
        assert_eq!(size, Size::new(80.0, 80.0));
    }

    #[test]
    fn test_resize_east_only_changes_width() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Oval).unwrap();
        let size = engine
            .resize_table(&table_id, ResizeHandle::East, Size::new(240.0, 150.0), Point::new(30.0, 90.0))
            .unwrap();
        assert_eq!(size, Size::new(270.0, 150.0));
    }

    #[test]
    fn test_resize_clamped_to_canvas() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Rect).unwrap();
        let size = engine
            .resize_table(&table_id, ResizeHandle::SouthEast, Size::new(220.0, 130.0), Point::new(5000.0, 5000.0))
            .unwrap();
        // Table sits at (40, 40) on an 800x600 canvas.
        assert_eq!(size, Size::new(760.0, 560.0));
    }

    #[test]
    fn test_circle_resize_always_square() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Circle).unwrap();
        let deltas = [
            (10.0, -40.0),
            (-300.0, 25.0),
            (0.0, 0.0),
            (900.0, 3.0),
            (-2.0, 5000.0),
            (123.4, 56.7),
        ];
        for handle in [ResizeHandle::East, ResizeHandle::South, ResizeHandle::SouthEast] {
            for (dx, dy) in deltas {
                let size = engine
                    .resize_table(&table_id, handle, Size::square(150.0), Point::new(dx, dy))
                    .unwrap();
                assert_eq!(size.width, size.height, "handle {:?} delta ({}, {})", handle, dx, dy);
            }
        }
    }

    #[test]
    fn test_resize_gesture_uses_start_size() {
        let mut engine = engine();
        let table_id = engine.add_table(TableShape::Circle).unwrap();
        engine.begin_drag(
            DragTarget::Resize {
                table_id: table_id.clone(),
                handle: ResizeHandle::South,
            },
            PointerInput::primary(3, 300.0, 300.0),
        );
        engine.update_drag(PointerInput::primary(3, 300.0, 350.0));
        let outcome = engine.update_drag(PointerInput::primary(3, 300.0, 360.0));
        assert_eq!(
            outcome,
            MoveOutcome::TableResized {
                table_id,
                size: Size::square(210.0)
            }
        );
    }
}
