//! Target formations.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::band::{CommandKind, MemberId, Position, Section};
use crate::error::LoadError;

/// Default radius, in yards, within which a slot counts as filled.
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// Default allowed facing error, in degrees, for slots that name a facing.
pub const DEFAULT_FACING_TOLERANCE: u16 = 15;

/// Which member may fill a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSelector {
    /// Exactly this member.
    Id(MemberId),
    /// The nearest unmatched member of this section.
    Section(Section),
    /// The nearest unmatched member.
    #[default]
    Any,
}

impl MemberSelector {
    /// Whether a member with `id` in `section` may fill the slot.
    #[must_use]
    pub fn accepts(self, id: MemberId, section: Section) -> bool {
        match self {
            Self::Id(want) => want == id,
            Self::Section(want) => want == section,
            Self::Any => true,
        }
    }
}

/// One expected position in a formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSlot {
    /// Who may fill this slot.
    #[serde(default)]
    pub member: MemberSelector,
    /// Expected x in yards.
    pub x: f64,
    /// Expected y in yards.
    pub y: f64,
    /// Expected facing, if it matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<i64>,
    /// Per-slot tolerance overriding the formation default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl TargetSlot {
    /// A slot at `position` for `member`.
    #[must_use]
    pub fn new(member: MemberSelector, position: Position) -> Self {
        Self {
            member,
            x: position.x,
            y: position.y,
            facing: None,
            tolerance: None,
        }
    }

    /// Require a facing as well.
    #[must_use]
    pub fn facing(mut self, degrees: i64) -> Self {
        self.facing = Some(degrees);
        self
    }

    /// Expected position.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_facing_tolerance() -> u16 {
    DEFAULT_FACING_TOLERANCE
}

/// An expected arrangement of band members plus the par values the bonuses
/// are measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationTarget {
    /// Display name.
    pub name: String,
    /// Expected slots.
    pub slots: Vec<TargetSlot>,
    /// Default tolerance radius in yards.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Allowed facing error in degrees.
    #[serde(default = "default_facing_tolerance")]
    pub facing_tolerance: u16,
    /// Band commands a good solution needs; fewer earns an efficiency bonus.
    #[serde(default)]
    pub par_operations: Option<usize>,
    /// Execution time a good solution needs; faster earns a speed bonus.
    #[serde(default)]
    pub par_time_ms: Option<u64>,
    /// Command kinds the simplest solution uses.
    #[serde(default)]
    pub minimal_commands: BTreeSet<CommandKind>,
}

impl FormationTarget {
    /// An empty formation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            facing_tolerance: DEFAULT_FACING_TOLERANCE,
            par_operations: None,
            par_time_ms: None,
            minimal_commands: BTreeSet::new(),
        }
    }

    /// A formation whose slot `i` expects `selectors[i]` at `points[i]`.
    ///
    /// Extra selectors or points are ignored.
    #[must_use]
    pub fn from_points(
        name: impl Into<String>,
        selectors: impl IntoIterator<Item = MemberSelector>,
        points: Vec<Position>,
    ) -> Self {
        let slots = selectors
            .into_iter()
            .zip(points)
            .map(|(selector, point)| TargetSlot::new(selector, point))
            .collect();
        Self {
            slots,
            ..Self::new(name)
        }
    }

    /// Parse a formation from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a formation from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Add a slot.
    #[must_use]
    pub fn with_slot(mut self, slot: TargetSlot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Set the default tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the operation par.
    #[must_use]
    pub fn with_par_operations(mut self, par: usize) -> Self {
        self.par_operations = Some(par);
        self
    }

    /// Set the time par.
    #[must_use]
    pub fn with_par_time_ms(mut self, par: u64) -> Self {
        self.par_time_ms = Some(par);
        self
    }

    /// Set the minimal command set.
    #[must_use]
    pub fn with_minimal_commands(mut self, kinds: impl IntoIterator<Item = CommandKind>) -> Self {
        self.minimal_commands = kinds.into_iter().collect();
        self
    }

    /// Tolerance that applies to `slot`.
    #[must_use]
    pub fn tolerance_for(&self, slot: &TargetSlot) -> f64 {
        slot.tolerance.unwrap_or(self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{
            "name": "Two spots",
            "slots": [
                {"member": {"id": 0}, "x": 10.0, "y": 20.0},
                {"member": {"section": "guard"}, "x": 30.0, "y": 20.0, "facing": 90, "tolerance": 2.5},
                {"x": 50.0, "y": 20.0}
            ],
            "minimal_commands": ["move_to"]
        }"#;
        let target = FormationTarget::from_json(json).unwrap();
        assert_eq!(target.slots.len(), 3);
        assert_eq!(target.slots[0].member, MemberSelector::Id(0));
        assert_eq!(target.slots[1].member, MemberSelector::Section(Section::Guard));
        assert_eq!(target.slots[2].member, MemberSelector::Any);
        assert!((target.tolerance - DEFAULT_TOLERANCE).abs() < f64::EPSILON);
        assert!((target.tolerance_for(&target.slots[1]) - 2.5).abs() < f64::EPSILON);
        assert!(target.minimal_commands.contains(&CommandKind::MoveTo));
        assert!(target.par_operations.is_none());
    }

    #[test]
    fn test_from_points_zips() {
        let target = FormationTarget::from_points(
            "pair",
            [MemberSelector::Id(1), MemberSelector::Id(2), MemberSelector::Id(3)],
            vec![Position::new(1.0, 1.0), Position::new(2.0, 2.0)],
        );
        assert_eq!(target.slots.len(), 2);
        assert_eq!(target.slots[1].position(), Position::new(2.0, 2.0));
    }

    #[test]
    fn test_selector_accepts() {
        assert!(MemberSelector::Any.accepts(3, Section::Brass));
        assert!(MemberSelector::Section(Section::Brass).accepts(3, Section::Brass));
        assert!(!MemberSelector::Section(Section::Guard).accepts(3, Section::Brass));
        assert!(!MemberSelector::Id(4).accepts(3, Section::Brass));
    }
}
