//! Floor plan: roster, tables, and the pointer-driven placement engine.

pub mod engine;
pub mod geometry;
pub mod roster;

pub use engine::{
    BoardLayout, DragKind, DragSession, DragTarget, DropOutcome, Hover, MoveOutcome,
    PlacementEngine, PointerInput, ResizeHandle, Stage, Zone, PRIMARY_BUTTON,
};
pub use geometry::{Point, Rect, Size};
pub use roster::{normalize_name, Person, Roster, Seat, Table, TableShape};
