//! People and tables on the floor plan.
//!
//! A person's seat is a single enum so "placed", "absent" and "in the roster
//! list" are mutually exclusive by construction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::geometry::{Point, Size};
use crate::config::BoardConfig;
use crate::error::{MinutesError, MinutesResult};

/// Where a person currently is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Seat {
    /// Unplaced, shown in the roster list.
    #[default]
    Listed,
    /// Seated at a canvas-relative coordinate.
    Placed(Point),
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    /// Opaque avatar reference (URL or data URI) resolved by the host.
    pub avatar: Option<String>,
    pub alias: String,
    pub is_guest: bool,
    pub seat: Seat,
}

impl Person {
    pub fn member(id: impl Into<String>, name: &str, alias: &str, avatar: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: normalize_name(name),
            avatar,
            alias: alias.to_string(),
            is_guest: false,
            seat: Seat::Listed,
        }
    }

    pub fn guest(name: &str) -> Self {
        Self {
            id: format!("p-{}", Uuid::new_v4().simple()),
            name: normalize_name(name),
            avatar: None,
            alias: String::new(),
            is_guest: true,
            seat: Seat::Listed,
        }
    }

    pub fn placement(&self) -> Option<Point> {
        match self.seat {
            Seat::Placed(point) => Some(point),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.seat == Seat::Absent
    }

    pub fn is_listed(&self) -> bool {
        self.seat == Seat::Listed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableShape {
    #[default]
    Oval,
    Circle,
    Rect,
}

impl TableShape {
    pub fn default_size(&self) -> Size {
        match self {
            TableShape::Oval => Size::new(240.0, 150.0),
            TableShape::Circle => Size::square(150.0),
            TableShape::Rect => Size::new(220.0, 130.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub label: String,
    pub position: Point,
    pub size: Size,
    pub shape: TableShape,
}

/// Collapse internal whitespace runs and trim.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The attendee roster plus the tables of the floor plan.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    people: Vec<Person>,
    tables: Vec<Table>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub(crate) fn person_mut(&mut self, id: &str) -> Option<&mut Person> {
        self.people.iter_mut().find(|p| p.id == id)
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub(crate) fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        let needle = normalize_name(name).to_lowercase();
        self.people.iter().find(|p| p.name.to_lowercase() == needle)
    }

    pub fn listed(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|p| p.is_listed())
    }

    pub fn absent(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|p| p.is_absent())
    }

    pub fn placed(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|p| p.placement().is_some())
    }

    /// Replace the imported members, keeping guests whose names do not
    /// collide with an incoming member.
    pub fn replace_members(&mut self, members: Vec<Person>) {
        let incoming: Vec<String> = members.iter().map(|m| m.name.to_lowercase()).collect();
        let guests: Vec<Person> = self
            .people
            .drain(..)
            .filter(|p| p.is_guest && !incoming.contains(&p.name.to_lowercase()))
            .collect();

        self.people = members;
        self.people.extend(guests);
        info!("Roster replaced: {} people", self.people.len());
    }

    /// Add a walk-in guest. Names are whitespace-normalised and must be unique
    /// case-insensitively.
    pub fn add_guest(&mut self, raw_name: &str) -> MinutesResult<&Person> {
        let name = normalize_name(raw_name);
        if name.is_empty() {
            return Err(MinutesError::Validation("Guest name is empty.".to_string()));
        }
        if self.find_by_name(&name).is_some() {
            return Err(MinutesError::Validation(format!(
                "Guest \"{name}\" already exists."
            )));
        }

        self.people.push(Person::guest(&name));
        debug!("Added guest {}", name);
        Ok(&self.people[self.people.len() - 1])
    }

    /// Remove a guest. Members cannot be removed this way.
    pub fn remove_guest(&mut self, id: &str) -> bool {
        let before = self.people.len();
        self.people.retain(|p| !(p.id == id && p.is_guest));
        before != self.people.len()
    }

    pub fn add_table(&mut self, shape: TableShape, board: &BoardConfig) -> &Table {
        let offset = self.tables.len() as f64 * board.table_offset_step;
        let table = Table {
            id: format!("t-{}", Uuid::new_v4().simple()),
            label: format!("Table {}", self.tables.len() + 1),
            position: Point::new(board.table_origin + offset, board.table_origin + offset),
            size: shape.default_size(),
            shape,
        };
        self.tables.push(table);
        &self.tables[self.tables.len() - 1]
    }

    pub fn delete_table(&mut self, id: &str) -> bool {
        let before = self.tables.len();
        self.tables.retain(|t| t.id != id);
        before != self.tables.len()
    }

    /// Remove every table and return everyone to the roster list.
    pub fn clear_tables(&mut self) {
        self.tables.clear();
        self.reset_seats();
    }

    pub fn reset_seats(&mut self) {
        for person in &mut self.people {
            person.seat = Seat::Listed;
        }
    }

    pub(crate) fn set_seat(&mut self, id: &str, seat: Seat) -> bool {
        match self.person_mut(id) {
            Some(person) => {
                person.seat = seat;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with_members() -> Roster {
        let mut roster = Roster::new();
        roster.replace_members(vec![
            Person::member("p-0", "Alice  Smith", "Chair", None),
            Person::member("p-1", "Bob", "", None),
        ]);
        roster
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Ada   Lovelace "), "Ada Lovelace");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_add_guest_rejects_duplicates_case_insensitively() {
        let mut roster = roster_with_members();
        assert!(roster.add_guest("carol").is_ok());
        assert!(matches!(
            roster.add_guest("  CAROL "),
            Err(MinutesError::Validation(_))
        ));
        assert!(matches!(roster.add_guest("alice smith"), Err(MinutesError::Validation(_))));
        assert!(matches!(roster.add_guest("   "), Err(MinutesError::Validation(_))));
    }

    #[test]
    fn test_remove_guest_only_removes_guests() {
        let mut roster = roster_with_members();
        let guest_id = roster.add_guest("Dana").unwrap().id.clone();

        assert!(!roster.remove_guest("p-0"));
        assert!(roster.remove_guest(&guest_id));
        assert_eq!(roster.people().len(), 2);
    }

    #[test]
    fn test_replace_members_keeps_non_colliding_guests() {
        let mut roster = roster_with_members();
        roster.add_guest("Eve").unwrap();
        roster.add_guest("Frank").unwrap();

        roster.replace_members(vec![Person::member("p-0", "Frank", "", None)]);

        let names: Vec<&str> = roster.people().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Frank", "Eve"]);
        assert!(!roster.people()[0].is_guest);
    }

    #[test]
    fn test_add_table_staggers_and_labels() {
        let mut roster = Roster::new();
        let board = BoardConfig::default();
        roster.add_table(TableShape::Oval, &board);
        let second = roster.add_table(TableShape::Circle, &board).clone();

        assert_eq!(second.label, "Table 2");
        assert_eq!(second.position, Point::new(58.0, 58.0));
        assert_eq!(second.size, Size::square(150.0));
    }

    #[test]
    fn test_clear_tables_returns_everyone_to_list() {
        let mut roster = roster_with_members();
        roster.add_table(TableShape::Rect, &BoardConfig::default());
        roster.set_seat("p-0", Seat::Placed(Point::new(10.0, 10.0)));
        roster.set_seat("p-1", Seat::Absent);

        roster.clear_tables();

        assert!(roster.tables().is_empty());
        assert!(roster.people().iter().all(|p| p.is_listed()));
    }

    #[test]
    fn test_seat_views_are_exclusive() {
        let mut roster = roster_with_members();
        roster.set_seat("p-0", Seat::Placed(Point::new(1.0, 2.0)));
        roster.set_seat("p-1", Seat::Absent);

        assert_eq!(roster.placed().count(), 1);
        assert_eq!(roster.absent().count(), 1);
        assert_eq!(roster.listed().count(), 0);
    }
}
