//! The Band API: the only mutation path into a [`BandStore`].
//!
//! Every operation is total. Out-of-range coordinates are clamped, unknown
//! members are ignored and nothing here ever fails. Each call is recorded so
//! the scorer can see how a formation was built.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::band::field::STEP_LENGTH_YARDS;
use crate::band::formation::{block_points, circle_points, line_points};
use crate::band::{BandMember, BandStore, MemberId, Position};

/// A reference to a member as a script supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    /// A raw id. Negative or unknown ids resolve to nothing.
    Id(i64),
    /// A member object previously handed out by the store.
    Member(MemberId),
}

impl From<i64> for MemberRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<MemberId> for MemberRef {
    fn from(id: MemberId) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&BandMember> for MemberRef {
    fn from(member: &BandMember) -> Self {
        Self::Member(member.id())
    }
}

/// Where a `turn` should leave a member facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Quarter turn counter-clockwise.
    Left,
    /// Quarter turn clockwise.
    Right,
    /// Keep the current facing.
    Forward,
    /// About-face.
    Backward,
    /// Absolute facing in degrees.
    Degrees(i64),
}

impl Direction {
    /// Parse a symbolic direction token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "forward" => Some(Self::Forward),
            "backward" => Some(Self::Backward),
            _ => None,
        }
    }

    /// Facing in degrees (not yet normalized) after turning from `current`.
    #[must_use]
    pub fn apply(self, current: u16) -> i64 {
        let current = i64::from(current);
        match self {
            Self::Left => current - 90,
            Self::Right => current + 90,
            Self::Forward => current,
            Self::Backward => current + 180,
            Self::Degrees(degrees) => degrees,
        }
    }
}

/// The kind of a Band API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// `move_to`
    MoveTo,
    /// `move_forward`
    MoveForward,
    /// `turn`
    Turn,
    /// `form_line`
    FormLine,
    /// `form_circle`
    FormCircle,
    /// `form_block`
    FormBlock,
}

impl CommandKind {
    /// Name as called from scripts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MoveTo => "move_to",
            Self::MoveForward => "move_forward",
            Self::Turn => "turn",
            Self::FormLine => "form_line",
            Self::FormCircle => "form_circle",
            Self::FormBlock => "form_block",
        }
    }

    /// Whether this is one of the multi-member formation helpers.
    #[must_use]
    pub const fn is_formation(self) -> bool {
        matches!(self, Self::FormLine | Self::FormCircle | Self::FormBlock)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded Band API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    /// Which operation was called.
    pub kind: CommandKind,
    /// How many members the call actually moved or turned.
    pub affected: usize,
}

/// Command surface over a band store.
#[derive(Debug, Clone, Default)]
pub struct BandApi {
    store: BandStore,
    commands: Vec<CommandRecord>,
}

impl BandApi {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: BandStore) -> Self {
        Self {
            store,
            commands: Vec::new(),
        }
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &BandStore {
        &self.store
    }

    /// Calls recorded so far, in order.
    #[must_use]
    pub fn commands(&self) -> &[CommandRecord] {
        &self.commands
    }

    /// Split into the final store and the command log.
    #[must_use]
    pub fn into_parts(self) -> (BandStore, Vec<CommandRecord>) {
        (self.store, self.commands)
    }

    /// Resolve a member reference to its roster index.
    ///
    /// This is the single place where ids and member objects are told apart.
    #[must_use]
    pub fn resolve(&self, member: MemberRef) -> Option<usize> {
        let id = match member {
            MemberRef::Id(raw) => MemberId::try_from(raw).ok()?,
            MemberRef::Member(id) => id,
        };
        self.store.index_of(id)
    }

    /// Look up a member by reference.
    #[must_use]
    pub fn get_member(&self, member: MemberRef) -> Option<&BandMember> {
        self.resolve(member)
            .and_then(|index| self.store.get_all_members().get(index))
    }

    /// Move a member to `(x, y)`, clamped into the field.
    pub fn move_to(&mut self, member: impl Into<MemberRef>, x: f64, y: f64) {
        let affected = usize::from(self.place(member.into(), Position::new(x, y)));
        self.record(CommandKind::MoveTo, affected);
    }

    /// Move a member `steps` steps along its facing. Negative steps back up.
    pub fn move_forward(&mut self, member: impl Into<MemberRef>, steps: f64) {
        let mut affected = 0;
        if let Some(member) = self.resolve(member.into()).and_then(|i| self.store.member_mut(i)) {
            let radians = f64::from(member.facing()).to_radians();
            let distance = steps * STEP_LENGTH_YARDS;
            let x = member.x() + radians.sin() * distance;
            let y = member.y() + radians.cos() * distance;
            member.place(x, y);
            affected = 1;
        }
        self.record(CommandKind::MoveForward, affected);
    }

    /// Turn a member relative to its facing, or to an absolute facing.
    pub fn turn(&mut self, member: impl Into<MemberRef>, direction: Direction) {
        let mut affected = 0;
        if let Some(member) = self.resolve(member.into()).and_then(|i| self.store.member_mut(i)) {
            let facing = direction.apply(member.facing());
            member.face(facing);
            affected = 1;
        }
        self.record(CommandKind::Turn, affected);
    }

    /// Spread members evenly along the segment `(x1, y1)`-`(x2, y2)`.
    pub fn form_line(&mut self, members: &[MemberRef], x1: f64, y1: f64, x2: f64, y2: f64) {
        let points = line_points(members.len(), Position::new(x1, y1), Position::new(x2, y2));
        let affected = self.place_all(members, &points);
        self.record(CommandKind::FormLine, affected);
    }

    /// Spread members at equal angles around a circle.
    pub fn form_circle(&mut self, members: &[MemberRef], cx: f64, cy: f64, radius: f64) {
        let points = circle_points(members.len(), Position::new(cx, cy), radius);
        let affected = self.place_all(members, &points);
        self.record(CommandKind::FormCircle, affected);
    }

    /// Arrange members in a grid of `rows` rows starting at `(x, y)`.
    ///
    /// A non-positive row count leaves everyone where they are.
    pub fn form_block(&mut self, members: &[MemberRef], x: f64, y: f64, rows: i64, spacing: f64) {
        let rows = usize::try_from(rows).unwrap_or(0);
        let points = block_points(members.len(), Position::new(x, y), rows, spacing);
        let affected = self.place_all(members, &points);
        self.record(CommandKind::FormBlock, affected);
    }

    fn place(&mut self, member: MemberRef, target: Position) -> bool {
        match self.resolve(member).and_then(|i| self.store.member_mut(i)) {
            Some(member) => {
                member.place(target.x, target.y);
                true
            }
            None => false,
        }
    }

    /// Unresolved entries keep their slot so the others do not shift.
    fn place_all(&mut self, members: &[MemberRef], points: &[Position]) -> usize {
        members
            .iter()
            .zip(points)
            .filter(|&(&member, &point)| self.place(member, point))
            .count()
    }

    fn record(&mut self, kind: CommandKind, affected: usize) {
        trace!(command = kind.name(), affected, "band command");
        self.commands.push(CommandRecord { kind, affected });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::field::{FIELD_LENGTH, FIELD_WIDTH};
    use crate::band::Roster;

    fn api(size: usize) -> BandApi {
        BandApi::new(Roster::standard(size).to_store().unwrap())
    }

    fn refs(ids: &[i64]) -> Vec<MemberRef> {
        ids.iter().copied().map(MemberRef::Id).collect()
    }

    fn pos(api: &BandApi, id: i64) -> (f64, f64) {
        let m = api.get_member(MemberRef::Id(id)).unwrap();
        (m.x(), m.y())
    }

    fn assert_at(api: &BandApi, id: i64, expected: (f64, f64)) {
        let (x, y) = pos(api, id);
        assert!(
            (x - expected.0).abs() < 1e-9 && (y - expected.1).abs() < 1e-9,
            "member {id} at ({x}, {y}), expected {expected:?}"
        );
    }

    #[test]
    fn test_move_to_clamps() {
        let mut api = api(4);
        api.move_to(0_i64, 500.0, -20.0);
        let (x, y) = pos(&api, 0);
        assert!((x - FIELD_LENGTH).abs() < f64::EPSILON);
        assert!(y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_move_to_unknown_is_noop() {
        let mut api = api(4);
        let before = api.store().clone();
        api.move_to(99_i64, 10.0, 10.0);
        api.move_to(-1_i64, 10.0, 10.0);
        assert_eq!(api.store(), &before);
        assert_eq!(api.commands().len(), 2);
        assert!(api.commands().iter().all(|c| c.affected == 0));
    }

    #[test]
    fn test_member_object_resolves() {
        let mut api = api(4);
        let member = api.store().get_all_members()[2].clone();
        api.move_to(&member, 70.0, 30.0);
        let (x, y) = pos(&api, 2);
        assert!((x - 70.0).abs() < f64::EPSILON && (y - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_move_forward_follows_facing() {
        let mut api = api(1);
        api.move_to(0_i64, 50.0, 20.0);
        api.move_forward(0_i64, 10.0);
        let (x, y) = pos(&api, 0);
        assert!((x - 50.0).abs() < 1e-9);
        assert!((y - 28.0).abs() < 1e-9);

        api.turn(0_i64, Direction::Right);
        api.move_forward(0_i64, -5.0);
        let (x, y) = pos(&api, 0);
        assert!((x - 46.0).abs() < 1e-9);
        assert!((y - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_forward_clamped() {
        let mut api = api(1);
        api.move_forward(0_i64, 1000.0);
        let (_, y) = pos(&api, 0);
        assert!((y - FIELD_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_turn_relative_and_absolute() {
        let mut api = api(1);
        api.turn(0_i64, Direction::Left);
        assert_eq!(api.get_member(MemberRef::Id(0)).unwrap().facing(), 270);
        api.turn(0_i64, Direction::Backward);
        assert_eq!(api.get_member(MemberRef::Id(0)).unwrap().facing(), 90);
        api.turn(0_i64, Direction::Forward);
        assert_eq!(api.get_member(MemberRef::Id(0)).unwrap().facing(), 90);
        api.turn(0_i64, Direction::Degrees(-45));
        assert_eq!(api.get_member(MemberRef::Id(0)).unwrap().facing(), 315);
    }

    #[test]
    fn test_form_line_two_members_at_endpoints() {
        let mut api = api(2);
        api.form_line(&refs(&[0, 1]), 10.0, 10.0, 30.0, 40.0);
        assert_at(&api, 0, (10.0, 10.0));
        assert_at(&api, 1, (30.0, 40.0));
    }

    #[test]
    fn test_form_line_skips_unresolved_without_shifting() {
        let mut api = api(2);
        api.form_line(&refs(&[0, 77, 1]), 20.0, 26.0, 80.0, 26.0);
        assert_at(&api, 0, (20.0, 26.0));
        assert_at(&api, 1, (80.0, 26.0));
        assert_eq!(api.commands()[0].affected, 2);
    }

    #[test]
    fn test_form_circle_radius() {
        let mut api = api(6);
        api.form_circle(&refs(&[0, 1, 2, 3, 4, 5]), 50.0, 26.0, 10.0);
        for id in 0..6 {
            let (x, y) = pos(&api, id);
            assert!(((x - 50.0).hypot(y - 26.0) - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_form_block_non_positive_rows() {
        let mut api = api(4);
        let before = api.store().clone();
        api.form_block(&refs(&[0, 1, 2, 3]), 10.0, 10.0, 0, 5.0);
        api.form_block(&refs(&[0, 1, 2, 3]), 10.0, 10.0, -3, 5.0);
        assert_eq!(api.store(), &before);
    }

    #[test]
    fn test_form_block_grid() {
        let mut api = api(4);
        api.form_block(&refs(&[0, 1, 2, 3]), 10.0, 10.0, 2, 4.0);
        assert_at(&api, 0, (10.0, 10.0));
        assert_at(&api, 1, (14.0, 10.0));
        assert_at(&api, 2, (10.0, 14.0));
        assert_at(&api, 3, (14.0, 14.0));
    }
}
