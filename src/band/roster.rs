//! Roster definitions and the standard band layout.

// Roster sizes are tiny; index-to-coordinate casts are exact.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

use crate::band::{BandMember, BandStore, MemberId, Position, Section};
use crate::error::LoadError;

/// Default number of members in a band.
pub const DEFAULT_BAND_SIZE: usize = 16;

/// Largest band a roster may define.
pub const MAX_BAND_SIZE: usize = 50;

/// One member in a roster definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Member identifier.
    pub id: MemberId,
    /// Section the member belongs to.
    pub section: Section,
    /// Instrument tag.
    pub instrument: String,
    /// Starting x coordinate in yards.
    pub x: f64,
    /// Starting y coordinate in yards.
    pub y: f64,
    /// Starting facing in degrees.
    #[serde(default)]
    pub facing: i64,
}

impl RosterEntry {
    fn to_member(&self) -> BandMember {
        BandMember::new(
            self.id,
            self.section,
            self.instrument.clone(),
            Position::new(self.x, self.y),
            self.facing,
        )
    }
}

/// The starting line-up for a level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Build a roster from entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster is too large or ids repeat.
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self, LoadError> {
        let roster = Self { entries };
        roster.validate()?;
        Ok(roster)
    }

    /// The standard block layout used when a level does not supply one.
    ///
    /// Members fill four rows starting at the 20-yard line, 15 yards from the
    /// back sideline, 5 yards apart along the field and 8 yards apart across
    /// it. Sections rotate every four members and each member gets the next
    /// instrument of its section. `size` is clamped into `1..=50`.
    #[must_use]
    pub fn standard(size: usize) -> Self {
        const ROWS: usize = 4;
        const START_X: f64 = 20.0;
        const START_Y: f64 = 15.0;
        const COL_SPACING: f64 = 5.0;
        const ROW_SPACING: f64 = 8.0;

        let size = size.clamp(1, MAX_BAND_SIZE);
        let cols = (size / ROWS).max(1);

        let entries = (0..size)
            .map(|i| {
                let row = i / cols;
                let col = i % cols;
                let section = Section::ALL[(i % 16) / 4];
                let instruments = section.instruments();
                RosterEntry {
                    id: i as MemberId,
                    section,
                    instrument: instruments[i % instruments.len()].to_string(),
                    x: START_X + col as f64 * COL_SPACING,
                    y: START_Y + row as f64 * ROW_SPACING,
                    facing: 0,
                }
            })
            .collect();

        Self { entries }
    }

    /// Parse a roster from a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the roster is invalid.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let roster: Self = serde_json::from_str(json)?;
        roster.validate()?;
        Ok(roster)
    }

    /// Roster entries in order.
    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a fresh store with every member at its starting position.
    ///
    /// # Errors
    ///
    /// Returns an error if ids repeat.
    pub fn to_store(&self) -> Result<BandStore, LoadError> {
        BandStore::from_members(self.entries.iter().map(RosterEntry::to_member).collect())
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.entries.len() > MAX_BAND_SIZE {
            return Err(LoadError::RosterTooLarge(self.entries.len()));
        }
        self.to_store().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sixteen() {
        let roster = Roster::standard(DEFAULT_BAND_SIZE);
        assert_eq!(roster.len(), 16);

        let first = &roster.entries()[0];
        assert_eq!(first.section, Section::Brass);
        assert_eq!(first.instrument, "trumpet");
        assert!((first.x - 20.0).abs() < f64::EPSILON);
        assert!((first.y - 15.0).abs() < f64::EPSILON);

        let last = &roster.entries()[15];
        assert_eq!(last.section, Section::Guard);
        assert_eq!(last.instrument, "banner");
        assert!((last.x - 35.0).abs() < f64::EPSILON);
        assert!((last.y - 39.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_standard_small_band() {
        let roster = Roster::standard(4);
        let store = roster.to_store().unwrap();
        assert_eq!(store.len(), 4);
        assert!(store.get_all_members().iter().all(|m| (m.x() - 20.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_standard_size_clamped() {
        assert_eq!(Roster::standard(0).len(), 1);
        assert_eq!(Roster::standard(500).len(), MAX_BAND_SIZE);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": 0, "section": "brass", "instrument": "tuba", "x": 10.0, "y": 10.0},
            {"id": 1, "section": "guard", "instrument": "flag", "x": 12.0, "y": 10.0, "facing": 90}
        ]"#;
        let roster = Roster::from_json(json).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.entries()[1].facing, 90);
    }

    #[test]
    fn test_from_json_duplicate() {
        let json = r#"[
            {"id": 0, "section": "brass", "instrument": "tuba", "x": 10.0, "y": 10.0},
            {"id": 0, "section": "guard", "instrument": "flag", "x": 12.0, "y": 10.0}
        ]"#;
        assert!(matches!(
            Roster::from_json(json),
            Err(LoadError::DuplicateMember(0))
        ));
    }
}
