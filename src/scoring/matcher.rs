//! Slot-to-member matching.

use crate::band::field::facing_difference;
use crate::band::{BandMember, MemberId};

use super::target::{FormationTarget, MemberSelector, TargetSlot};

/// How one slot was filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotMatch {
    /// Index of the slot in the target.
    pub slot: usize,
    /// Member assigned to the slot, if any was available.
    pub member: Option<MemberId>,
    /// Distance from the member to the slot, in yards.
    pub distance: Option<f64>,
    /// Within tolerance (and facing tolerance when the slot names one).
    pub correct: bool,
}

/// Assign members to slots.
///
/// Slots naming an explicit id are matched first. Every other slot then
/// takes the nearest member that is still unmatched and satisfies its
/// selector, in slot order; ties go to the member earlier in the roster.
/// Each member fills at most one slot.
#[must_use]
pub fn match_slots(members: &[BandMember], target: &FormationTarget) -> Vec<SlotMatch> {
    let mut taken = vec![false; members.len()];
    let mut assigned: Vec<Option<usize>> = vec![None; target.slots.len()];

    for (slot_index, slot) in target.slots.iter().enumerate() {
        if let MemberSelector::Id(id) = slot.member {
            if let Some(i) = members.iter().position(|m| m.id() == id) {
                if !taken[i] {
                    taken[i] = true;
                    assigned[slot_index] = Some(i);
                }
            }
        }
    }

    for (slot_index, slot) in target.slots.iter().enumerate() {
        if matches!(slot.member, MemberSelector::Id(_)) {
            continue;
        }
        let goal = slot.position();
        let mut best: Option<(usize, f64)> = None;
        for (i, member) in members.iter().enumerate() {
            if taken[i] || !slot.member.accepts(member.id(), member.section()) {
                continue;
            }
            let distance = member.position().distance(goal);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        if let Some((i, _)) = best {
            taken[i] = true;
            assigned[slot_index] = Some(i);
        }
    }

    target
        .slots
        .iter()
        .zip(assigned)
        .enumerate()
        .map(|(slot_index, (slot, member))| match member {
            Some(i) => evaluate(slot_index, slot, &members[i], target),
            None => SlotMatch {
                slot: slot_index,
                member: None,
                distance: None,
                correct: false,
            },
        })
        .collect()
}

fn evaluate(
    slot_index: usize,
    slot: &TargetSlot,
    member: &BandMember,
    target: &FormationTarget,
) -> SlotMatch {
    let distance = member.position().distance(slot.position());
    let facing_ok = slot.facing.is_none_or(|want| {
        facing_difference(i64::from(member.facing()), want) <= target.facing_tolerance
    });
    SlotMatch {
        slot: slot_index,
        member: Some(member.id()),
        distance: Some(distance),
        correct: distance <= target.tolerance_for(slot) && facing_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{Position, Section};
    use crate::scoring::target::TargetSlot;

    fn member(id: MemberId, section: Section, x: f64, y: f64) -> BandMember {
        BandMember::new(id, section, "x", Position::new(x, y), 0)
    }

    #[test]
    fn test_explicit_ids_win_over_nearest() {
        let members = vec![
            member(0, Section::Brass, 10.0, 10.0),
            member(1, Section::Brass, 50.0, 10.0),
        ];
        // The "any" slot comes first but member 0 is reserved by the id slot.
        let target = FormationTarget::new("t")
            .with_slot(TargetSlot::new(MemberSelector::Any, Position::new(10.0, 10.0)))
            .with_slot(TargetSlot::new(MemberSelector::Id(0), Position::new(10.0, 10.0)));
        let matches = match_slots(&members, &target);
        assert_eq!(matches[0].member, Some(1));
        assert!(!matches[0].correct);
        assert_eq!(matches[1].member, Some(0));
        assert!(matches[1].correct);
    }

    #[test]
    fn test_section_selector() {
        let members = vec![
            member(0, Section::Brass, 30.0, 10.0),
            member(1, Section::Guard, 40.0, 10.0),
        ];
        let target = FormationTarget::new("t").with_slot(TargetSlot::new(
            MemberSelector::Section(Section::Guard),
            Position::new(30.0, 10.0),
        ));
        let matches = match_slots(&members, &target);
        assert_eq!(matches[0].member, Some(1));
        assert!((matches[0].distance.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_break_by_roster_order() {
        let members = vec![
            member(7, Section::Brass, 10.0, 10.0),
            member(3, Section::Brass, 10.0, 10.0),
        ];
        let target = FormationTarget::new("t")
            .with_slot(TargetSlot::new(MemberSelector::Any, Position::new(10.0, 10.0)));
        assert_eq!(match_slots(&members, &target)[0].member, Some(7));
    }

    #[test]
    fn test_facing_checked() {
        let members = vec![member(0, Section::Brass, 10.0, 10.0)];
        let target = FormationTarget::new("t").with_slot(
            TargetSlot::new(MemberSelector::Id(0), Position::new(10.0, 10.0)).facing(90),
        );
        assert!(!match_slots(&members, &target)[0].correct);

        let target = FormationTarget::new("t").with_slot(
            TargetSlot::new(MemberSelector::Id(0), Position::new(10.0, 10.0)).facing(355),
        );
        assert!(match_slots(&members, &target)[0].correct);
    }

    #[test]
    fn test_more_slots_than_members() {
        let members = vec![member(0, Section::Brass, 10.0, 10.0)];
        let target = FormationTarget::new("t")
            .with_slot(TargetSlot::new(MemberSelector::Any, Position::new(10.0, 10.0)))
            .with_slot(TargetSlot::new(MemberSelector::Any, Position::new(20.0, 10.0)));
        let matches = match_slots(&members, &target);
        assert!(matches[0].correct);
        assert_eq!(matches[1].member, None);
        assert!(!matches[1].correct);
    }
}
