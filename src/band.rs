//! Band state: members, the store that owns them and the Command Surface.
//!
//! - [`BandStore`] is the authoritative container, read by the renderer and
//!   the scorer.
//! - [`BandApi`] is the only way to mutate it.
//! - [`field`] and [`formation`] hold the geometry both of them share.

pub mod field;
pub mod formation;

mod api;
mod invariants;
mod member;
mod roster;
mod store;

pub use api::{BandApi, CommandKind, CommandRecord, Direction, MemberRef};
pub use field::{Position, FIELD_LENGTH, FIELD_WIDTH, STEP_LENGTH_YARDS};
pub use invariants::{
    assert_invariants, check_invariants, check_roster_preserved, InvariantViolation,
};
pub use member::{BandMember, MemberId, Section};
pub use roster::{Roster, RosterEntry, DEFAULT_BAND_SIZE, MAX_BAND_SIZE};
pub use store::BandStore;
