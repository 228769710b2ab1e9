//! Built-in challenge catalog.
//!
//! Each challenge pairs a target formation with starter code and a hint.
//! Targets are built from the same placement geometry the formation helpers
//! use, so a helper-based solution lands exactly on every slot.
//!
//! Built-in targets carry no par time: scripts finish far faster than any
//! meaningful limit, so a time bonus would only add a constant.

mod progress;

use std::fmt;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::band::formation::{block_points, circle_points, line_points};
use crate::band::{CommandKind, MemberId, Position, Roster, Section};
use crate::scoring::{FormationTarget, MemberSelector};

pub use progress::{LeaderboardEntry, Progress, LEADERBOARD_CAPACITY};

/// Days from the Unix epoch to 2024-01-01, the first day of the rotation.
const ROTATION_EPOCH_DAYS: u64 = 19_723;

const SECONDS_PER_DAY: u64 = 86_400;

/// Challenge difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// First steps.
    Beginner,
    /// Sections and helpers.
    Intermediate,
    /// Combined patterns.
    Advanced,
}

impl Difficulty {
    /// Band size used at this difficulty.
    #[must_use]
    pub const fn band_size(self) -> usize {
        match self {
            Self::Beginner => 8,
            Self::Intermediate => 16,
            Self::Advanced => 24,
        }
    }

    /// Parse a difficulty name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        })
    }
}

/// One lesson: a target, starter code and a hint.
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    /// Catalog id, starting at 1.
    pub id: u32,
    /// Short title.
    pub title: &'static str,
    /// What the learner has to do.
    pub description: &'static str,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Code the editor starts with.
    pub starter_code: &'static str,
    /// Shown after a failed attempt.
    pub hint: &'static str,
    /// A known perfect solution.
    #[serde(skip)]
    pub solution: &'static str,
    /// Formation to build.
    pub target: FormationTarget,
}

impl Challenge {
    /// Band size for this challenge.
    #[must_use]
    pub fn band_size(&self) -> usize {
        self.difficulty.band_size()
    }

    /// Starting roster for this challenge.
    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster::standard(self.band_size())
    }
}

static CATALOG: LazyLock<Vec<Challenge>> = LazyLock::new(build_catalog);

/// All built-in challenges in id order.
#[must_use]
pub fn catalog() -> &'static [Challenge] {
    &CATALOG
}

/// Look up a challenge by id.
#[must_use]
pub fn find(id: u32) -> Option<&'static Challenge> {
    catalog().iter().find(|c| c.id == id)
}

/// Challenges at one difficulty.
pub fn by_difficulty(difficulty: Difficulty) -> impl Iterator<Item = &'static Challenge> {
    catalog().iter().filter(move |c| c.difficulty == difficulty)
}

/// The challenge for a given day of the rotation. Day 0 is 2024-01-01.
#[must_use]
pub fn daily(day: i64) -> &'static Challenge {
    let challenges = catalog();
    let len = i64::try_from(challenges.len()).unwrap_or(i64::MAX);
    let index = usize::try_from(day.rem_euclid(len)).unwrap_or(0);
    &challenges[index]
}

/// Days since 2024-01-01, by the system clock.
#[must_use]
pub fn rotation_day() -> i64 {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() / SECONDS_PER_DAY);
    i64::try_from(days.saturating_sub(ROTATION_EPOCH_DAYS)).unwrap_or(0)
}

/// Today's challenge, by the system clock.
#[must_use]
pub fn today() -> &'static Challenge {
    daily(rotation_day())
}

/// A random challenge, optionally at one difficulty. Falls back to the whole
/// catalog when no challenge has that difficulty.
pub fn random_challenge<R: Rng + ?Sized>(
    difficulty: Option<Difficulty>,
    rng: &mut R,
) -> &'static Challenge {
    let pool: Vec<&'static Challenge> = match difficulty {
        Some(d) => by_difficulty(d).collect(),
        None => Vec::new(),
    };
    let pool = if pool.is_empty() {
        catalog().iter().collect()
    } else {
        pool
    };
    pool.choose(rng).copied().unwrap_or_else(|| daily(0))
}

fn ids(range: std::ops::Range<MemberId>) -> impl Iterator<Item = MemberSelector> {
    range.map(MemberSelector::Id)
}

fn build_catalog() -> Vec<Challenge> {
    let complex_line = line_points(6, Position::new(20.0, 40.0), Position::new(80.0, 40.0));
    let complex_circle = circle_points(6, Position::new(50.0, 18.0), 8.0);
    let mut complex = FormationTarget::from_points(
        "Complex Pattern",
        (0..6).map(|i| MemberSelector::Id(i * 2)),
        complex_line,
    );
    complex.slots.extend(
        FormationTarget::from_points(
            "",
            (0..6).map(|i| MemberSelector::Id(i * 2 + 1)),
            complex_circle,
        )
        .slots,
    );

    vec![
        Challenge {
            id: 1,
            title: "Basic Movement",
            description: "Move member 0 to the spot at (50, 30).",
            difficulty: Difficulty::Beginner,
            starter_code: "let member = band.get_member(0);\n// Move the member to x = 50, y = 30\n",
            hint: "band.move_to(member, x, y) moves one member straight to a spot.",
            solution: "let member = band.get_member(0);\nband.move_to(member, 50, 30);\n",
            target: FormationTarget::from_points(
                "Basic Movement",
                ids(0..1),
                vec![Position::new(50.0, 30.0)],
            )
            .with_par_operations(1)
            .with_minimal_commands([CommandKind::MoveTo]),
        },
        Challenge {
            id: 2,
            title: "Line Formation",
            description: "Line up the first five members from (20, 26) to (80, 26).",
            difficulty: Difficulty::Beginner,
            starter_code: "let five = members.extract(0, 5);\n",
            hint: "band.form_line(list, x1, y1, x2, y2) spaces a list evenly between two points.",
            solution: "let five = members.extract(0, 5);\nband.form_line(five, 20, 26, 80, 26);\n",
            target: FormationTarget::from_points(
                "Line Formation",
                ids(0..5),
                line_points(5, Position::new(20.0, 26.0), Position::new(80.0, 26.0)),
            )
            .with_par_operations(1)
            .with_minimal_commands([CommandKind::FormLine]),
        },
        Challenge {
            id: 3,
            title: "Circle Formation",
            description: "Arrange the first eight members in a circle of radius 10 around midfield (50, 26).",
            difficulty: Difficulty::Intermediate,
            starter_code: "let eight = members.extract(0, 8);\n",
            hint: "band.form_circle(list, cx, cy, radius) places members around a center point.",
            solution: "let eight = members.extract(0, 8);\nband.form_circle(eight, 50, 26, 10);\n",
            target: FormationTarget::from_points(
                "Circle Formation",
                ids(0..8),
                circle_points(8, Position::new(50.0, 26.0), 10.0),
            )
            .with_par_operations(1)
            .with_minimal_commands([CommandKind::FormCircle]),
        },
        Challenge {
            id: 4,
            title: "Section Control",
            description: "Move the brass section into a two-row block starting at (30, 10).",
            difficulty: Difficulty::Intermediate,
            starter_code: "// `brass` already holds the brass section\n",
            hint: "band.form_block(list, x, y, rows) builds a grid; spacing defaults to 5 yards.",
            solution: "band.form_block(brass, 30, 10, 2);\n",
            target: FormationTarget::from_points(
                "Section Control",
                std::iter::repeat_n(MemberSelector::Section(Section::Brass), 4),
                block_points(4, Position::new(30.0, 10.0), 2, 5.0),
            )
            .with_par_operations(1)
            .with_minimal_commands([CommandKind::FormBlock]),
        },
        Challenge {
            id: 5,
            title: "Complex Pattern",
            description: "Of the first twelve members, put the even positions in a line from (20, 40) to (80, 40) and the odd positions in a circle of radius 8 around (50, 18).",
            difficulty: Difficulty::Advanced,
            starter_code: "let evens = [];\nlet odds = [];\nfor i in 0..12 {\n    // sort members[i] into evens or odds\n}\n",
            hint: "Use `i % 2 == 0` inside the loop, then one formation helper per list.",
            solution: "let evens = [];\nlet odds = [];\nfor i in 0..12 {\n    if i % 2 == 0 { evens.push(members[i]); } else { odds.push(members[i]); }\n}\nband.form_line(evens, 20, 40, 80, 40);\nband.form_circle(odds, 50, 18, 8);\n",
            target: complex
                .with_par_operations(2)
                .with_minimal_commands([CommandKind::FormLine, CommandKind::FormCircle]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids() {
        let ids: Vec<u32> = catalog().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(find(3).is_some());
        assert!(find(42).is_none());
    }

    #[test]
    fn test_daily_rotation() {
        assert_eq!(daily(0).id, 1);
        assert_eq!(daily(6).id, 2);
        assert_eq!(daily(-1).id, 5);
    }

    #[test]
    fn test_by_difficulty() {
        let beginner: Vec<u32> = by_difficulty(Difficulty::Beginner).map(|c| c.id).collect();
        assert_eq!(beginner, vec![1, 2]);
        assert_eq!(by_difficulty(Difficulty::Advanced).count(), 1);
    }

    #[test]
    fn test_targets_fit_band() {
        for challenge in catalog() {
            let store = challenge.roster().to_store().unwrap();
            for slot in &challenge.target.slots {
                if let MemberSelector::Id(id) = slot.member {
                    assert!(store.get_member(id).is_some(), "challenge {}", challenge.id);
                }
                assert!(slot.position().is_on_field());
            }
        }
    }

    #[test]
    fn test_complex_pattern_slots() {
        let target = &find(5).unwrap().target;
        assert_eq!(target.slots.len(), 12);
        assert_eq!(target.slots[0].member, MemberSelector::Id(0));
        assert_eq!(target.slots[6].member, MemberSelector::Id(1));
    }

    #[test]
    fn test_builtin_targets_have_no_par_time() {
        assert!(catalog().iter().all(|c| c.target.par_time_ms.is_none()));
    }

    #[test]
    fn test_random_challenge_respects_difficulty() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let challenge = random_challenge(Some(Difficulty::Intermediate), &mut rng);
            assert_eq!(challenge.difficulty, Difficulty::Intermediate);
        }
        let seen: std::collections::BTreeSet<u32> =
            (0..200).map(|_| random_challenge(None, &mut rng).id).collect();
        assert_eq!(seen.len(), catalog().len());
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse(" Advanced "), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::parse("expert"), None);
    }
}
