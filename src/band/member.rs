//! Band member state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::band::field::{normalize_facing, Position};

/// Unique identifier for a band member.
pub type MemberId = u32;

/// Fixed categorical grouping of band members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Trumpets, trombones, horns, tubas.
    Brass,
    /// Flutes, clarinets, saxophones, oboes.
    Woodwind,
    /// Drums, cymbals, mallets.
    Percussion,
    /// Color guard: flags, rifles, sabers.
    Guard,
}

impl Section {
    /// All sections in roster order.
    pub const ALL: [Section; 4] = [
        Section::Brass,
        Section::Woodwind,
        Section::Percussion,
        Section::Guard,
    ];

    /// Lowercase name as used by scripts and JSON.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Section::Brass => "brass",
            Section::Woodwind => "woodwind",
            Section::Percussion => "percussion",
            Section::Guard => "guard",
        }
    }

    /// Parse a section name. Case and surrounding whitespace are ignored.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|section| section.name().eq_ignore_ascii_case(name))
    }

    /// Instruments handed out to members of this section, in rotation.
    #[must_use]
    pub const fn instruments(self) -> [&'static str; 4] {
        match self {
            Section::Brass => ["trumpet", "trombone", "french horn", "tuba"],
            Section::Woodwind => ["flute", "clarinet", "saxophone", "oboe"],
            Section::Percussion => ["snare", "bass drum", "cymbals", "mallets"],
            Section::Guard => ["flag", "rifle", "saber", "banner"],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single marcher on the field.
///
/// Identity (`id`, `section`, `instrument`) is fixed at creation. Position and
/// facing only change through [`crate::band::BandApi`], which keeps them
/// clamped and normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandMember {
    id: MemberId,
    section: Section,
    instrument: String,
    position: Position,
    facing: u16,
}

impl BandMember {
    /// Create a member, clamping the position and normalizing the facing.
    #[must_use]
    pub fn new(
        id: MemberId,
        section: Section,
        instrument: impl Into<String>,
        position: Position,
        facing: i64,
    ) -> Self {
        Self {
            id,
            section,
            instrument: instrument.into(),
            position: Position::clamped(position.x, position.y),
            facing: normalize_facing(facing),
        }
    }

    /// Re-apply the position and facing invariants.
    ///
    /// Deserialized members bypass [`BandMember::new`], so loaders call this.
    #[must_use]
    pub fn normalized(self) -> Self {
        let facing = i64::from(self.facing);
        Self::new(self.id, self.section, self.instrument, self.position, facing)
    }

    /// Member identifier.
    #[must_use]
    pub const fn id(&self) -> MemberId {
        self.id
    }

    /// Section this member marches with.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Instrument tag.
    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current x coordinate in yards.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.position.x
    }

    /// Current y coordinate in yards.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.position.y
    }

    /// Current facing in degrees, `0..360`.
    #[must_use]
    pub const fn facing(&self) -> u16 {
        self.facing
    }

    pub(crate) fn place(&mut self, x: f64, y: f64) {
        self.position = Position::clamped(x, y);
    }

    pub(crate) fn face(&mut self, degrees: i64) {
        self.facing = normalize_facing(degrees);
    }
}

impl fmt::Display for BandMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BandMember({}, x={:.1}, y={:.1}, {})",
            self.id, self.position.x, self.position.y, self.section
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::field::{FIELD_LENGTH, FIELD_WIDTH};

    #[test]
    fn test_section_parse() {
        assert_eq!(Section::parse("brass"), Some(Section::Brass));
        assert_eq!(Section::parse("  Guard "), Some(Section::Guard));
        assert_eq!(Section::parse("strings"), None);
    }

    #[test]
    fn test_member_new_clamps() {
        let m = BandMember::new(3, Section::Brass, "tuba", Position::new(150.0, -2.0), -90);
        assert!((m.x() - FIELD_LENGTH).abs() < f64::EPSILON);
        assert!(m.y().abs() < f64::EPSILON);
        assert_eq!(m.facing(), 270);
    }

    #[test]
    fn test_place_clamps() {
        let mut m = BandMember::new(0, Section::Woodwind, "flute", Position::new(10.0, 10.0), 0);
        m.place(50.0, 99.0);
        assert!((m.x() - 50.0).abs() < f64::EPSILON);
        assert!((m.y() - FIELD_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        let m = BandMember::new(7, Section::Percussion, "snare", Position::new(20.0, 15.0), 0);
        assert_eq!(m.to_string(), "BandMember(7, x=20.0, y=15.0, percussion)");
    }

    #[test]
    fn test_serde_roundtrip_normalizes() {
        let json = r#"{"id":1,"section":"guard","instrument":"flag","position":{"x":-4.0,"y":10.0},"facing":400}"#;
        let m: BandMember = serde_json::from_str(json).unwrap();
        let m = m.normalized();
        assert!(m.x().abs() < f64::EPSILON);
        assert_eq!(m.facing(), 40);
    }
}
