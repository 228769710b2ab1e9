//! Band invariants - sanity checks that detect bugs.
//!
//! The Command Surface clamps and normalizes on every mutation, so these
//! should never trigger. Tests and fuzz targets run them after arbitrary
//! command sequences.

use std::collections::HashSet;

use crate::band::field::FULL_TURN;
use crate::band::BandStore;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check every store invariant.
///
/// Returns the violations found, or an empty list if all invariants hold.
#[must_use]
pub fn check_invariants(store: &BandStore) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();

    for member in store.get_all_members() {
        let pos = member.position();

        if !pos.x.is_finite() || !pos.y.is_finite() {
            violations.push(InvariantViolation {
                message: format!("Member {} has non-finite position {pos:?}", member.id()),
            });
        } else if !pos.is_on_field() {
            violations.push(InvariantViolation {
                message: format!(
                    "Member {} is off the field at ({}, {})",
                    member.id(),
                    pos.x,
                    pos.y
                ),
            });
        }

        if i64::from(member.facing()) >= FULL_TURN {
            violations.push(InvariantViolation {
                message: format!("Member {} has facing {} >= 360", member.id(), member.facing()),
            });
        }

        if !seen.insert(member.id()) {
            violations.push(InvariantViolation {
                message: format!("Member id {} appears twice", member.id()),
            });
        }
    }

    violations
}

/// Check that a run kept the roster intact.
///
/// Ids, order, sections and instruments must be identical before and after;
/// only positions and facings may change.
#[must_use]
pub fn check_roster_preserved(before: &BandStore, after: &BandStore) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if before.len() != after.len() {
        violations.push(InvariantViolation {
            message: format!("Roster size changed from {} to {}", before.len(), after.len()),
        });
        return violations;
    }

    for (old, new) in before.get_all_members().iter().zip(after.get_all_members()) {
        if old.id() != new.id() {
            violations.push(InvariantViolation {
                message: format!("Roster order changed: {} became {}", old.id(), new.id()),
            });
        } else if old.section() != new.section() || old.instrument() != new.instrument() {
            violations.push(InvariantViolation {
                message: format!("Member {} changed identity", old.id()),
            });
        }
    }

    violations
}

/// Assert all store invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(store: &BandStore) {
    let violations = check_invariants(store);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Band invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_store: &BandStore) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{BandApi, BandMember, Direction, MemberRef, Position, Roster, Section};

    #[test]
    fn test_standard_roster_passes() {
        let store = Roster::standard(16).to_store().unwrap();
        assert!(check_invariants(&store).is_empty());
    }

    #[test]
    fn test_commands_keep_invariants() {
        let mut api = BandApi::new(Roster::standard(8).to_store().unwrap());
        let all: Vec<MemberRef> = (0..8).map(MemberRef::Id).collect();
        api.form_circle(&all, 95.0, 50.0, 40.0);
        api.move_forward(3_i64, 1e9);
        api.turn(4_i64, Direction::Degrees(i64::MIN));
        assert!(check_invariants(api.store()).is_empty());
    }

    #[test]
    fn test_off_field_detected() {
        let json = r#"{"id":0,"section":"brass","instrument":"tuba","position":{"x":500.0,"y":10.0},"facing":0}"#;
        let member: BandMember = serde_json::from_str(json).unwrap();
        let store = BandStore::from_raw(vec![member]);
        let violations = check_invariants(&store);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("off the field"));
    }

    #[test]
    fn test_bad_facing_detected() {
        let json = r#"{"id":0,"section":"guard","instrument":"flag","position":{"x":5.0,"y":5.0},"facing":400}"#;
        let member: BandMember = serde_json::from_str(json).unwrap();
        let store = BandStore::from_raw(vec![member]);
        let violations = check_invariants(&store);
        assert!(violations[0].message.contains("facing"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "off the field")]
    fn test_assert_invariants_panics_on_violation() {
        let json = r#"{"id":0,"section":"brass","instrument":"tuba","position":{"x":-3.0,"y":10.0},"facing":0}"#;
        let member: BandMember = serde_json::from_str(json).unwrap();
        assert_invariants(&BandStore::from_raw(vec![member]));
    }

    #[test]
    fn test_roster_identity_change_detected() {
        let before = Roster::standard(2).to_store().unwrap();
        let swapped = BandStore::from_members(vec![
            BandMember::new(0, Section::Guard, "flag", Position::new(20.0, 15.0), 0),
            before.get_all_members()[1].clone(),
        ])
        .unwrap();
        let violations = check_roster_preserved(&before, &swapped);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("identity"));
    }

    #[test]
    fn test_roster_preserved_after_moves() {
        let before = Roster::standard(4).to_store().unwrap();
        let mut api = BandApi::new(before.clone());
        api.move_to(1_i64, 70.0, 40.0);
        assert!(check_roster_preserved(&before, api.store()).is_empty());
    }
}
