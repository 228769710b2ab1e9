#![no_main]

use arbitrary::Arbitrary;
use bandcode::band::{check_invariants, check_roster_preserved, BandApi, Direction, MemberRef, Roster};
use libfuzzer_sys::fuzz_target;

/// One Band API call with raw, unclamped arguments.
#[derive(Arbitrary, Debug)]
enum Command {
    MoveTo { member: i64, x: f64, y: f64 },
    MoveForward { member: i64, steps: f64 },
    Turn { member: i64, degrees: i64 },
    TurnLeft { member: i64 },
    Line { count: u8, x1: f64, y1: f64, x2: f64, y2: f64 },
    Circle { count: u8, cx: f64, cy: f64, radius: f64 },
    Block { count: u8, x: f64, y: f64, rows: i64, spacing: f64 },
}

#[derive(Arbitrary, Debug)]
struct CommandInput {
    band_size: u8,
    commands: Vec<Command>,
}

fn refs(count: u8) -> Vec<MemberRef> {
    (0..i64::from(count)).map(MemberRef::Id).collect()
}

fuzz_target!(|input: CommandInput| {
    let Ok(store) = Roster::standard(usize::from(input.band_size)).to_store() else {
        return;
    };
    let before = store.clone();
    let mut api = BandApi::new(store);

    for cmd in input.commands.iter().take(256) {
        match *cmd {
            Command::MoveTo { member, x, y } => api.move_to(member, x, y),
            Command::MoveForward { member, steps } => api.move_forward(member, steps),
            Command::Turn { member, degrees } => api.turn(member, Direction::Degrees(degrees)),
            Command::TurnLeft { member } => api.turn(member, Direction::Left),
            Command::Line { count, x1, y1, x2, y2 } => api.form_line(&refs(count), x1, y1, x2, y2),
            Command::Circle { count, cx, cy, radius } => {
                api.form_circle(&refs(count), cx, cy, radius);
            }
            Command::Block { count, x, y, rows, spacing } => {
                api.form_block(&refs(count), x, y, rows, spacing);
            }
        }
    }

    let violations = check_invariants(api.store());
    assert!(violations.is_empty(), "invariants violated: {violations:?}");
    let changed = check_roster_preserved(&before, api.store());
    assert!(changed.is_empty(), "roster changed: {changed:?}");
});
