//! Script-facing bindings for the Band API.
//!
//! Scripts only ever see two custom types: `Band` (the `band` variable) and
//! `BandMember`. Both are thin handles onto the shared [`ExecutionContext`];
//! member properties are read live from the store so a script always sees
//! the effect of its own commands.

// Script integers and floats convert to field coordinates; magnitudes are
// clamped right after, so precision loss is irrelevant.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
// Registered functions take script values by value.
#![allow(clippy::needless_pass_by_value)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rhai::debugger::DebuggerCommand;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Position as ScriptPosition, Scope, FLOAT, INT};
use tracing::debug;

use crate::band::{BandApi, BandMember, BandStore, Direction, MemberId, MemberRef, Section};
use crate::error::ErrorCategory;

use super::RunBudget;

/// Script-visible command names on `band`.
pub(crate) const BAND_COMMANDS: &[&str] = &[
    "get_member",
    "get_all_members",
    "get_section",
    "move_to",
    "move_forward",
    "turn",
    "form_line",
    "form_circle",
    "form_block",
    "print_positions",
];

/// Read-only properties on a `BandMember`.
pub(crate) const MEMBER_PROPERTIES: &[&str] =
    &["id", "x", "y", "section", "instrument", "facing"];

/// Output lines kept per run; anything past this is dropped.
const MAX_OUTPUT_LINES: usize = 1_000;

/// A reference that never resolves; used for `()` where a member is expected.
const NOBODY: MemberRef = MemberRef::Id(-1);

type HostResult<T> = Result<T, Box<EvalAltResult>>;

pub(crate) type Shared = Rc<RefCell<ExecutionContext>>;

/// Everything one run owns: the working band, the operation counter and the
/// captured output.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    api: BandApi,
    operations: u64,
    output: Vec<String>,
    last_line: Option<usize>,
}

impl ExecutionContext {
    /// Start a run on a working copy of `store`.
    #[must_use]
    pub fn new(store: BandStore) -> Self {
        Self {
            api: BandApi::new(store),
            operations: 0,
            output: Vec::new(),
            last_line: None,
        }
    }

    /// The Command Surface for this run.
    #[must_use]
    pub fn api(&self) -> &BandApi {
        &self.api
    }

    /// Interpreter operations consumed so far.
    #[must_use]
    pub fn operations(&self) -> u64 {
        self.operations
    }

    /// Captured `print`/`debug` output.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Source line of the last statement or expression the interpreter
    /// stepped onto.
    #[must_use]
    pub fn last_line(&self) -> Option<usize> {
        self.last_line
    }

    /// Split into the Command Surface and the captured output.
    #[must_use]
    pub fn into_parts(self) -> (BandApi, u64, Vec<String>) {
        (self.api, self.operations, self.output)
    }

    fn emit(&mut self, line: String) {
        if self.output.len() < MAX_OUTPUT_LINES {
            self.output.push(line);
        }
    }
}

/// A learner mistake detected by a host function rather than the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostFault {
    /// Attempt to assign a read-only member property.
    ReadOnly(&'static str),
    /// A coordinate or amount was NaN or infinite.
    NotFinite(&'static str),
    /// A direction string that is not left/right/forward/backward.
    UnknownDirection(String),
}

impl HostFault {
    pub(crate) fn category(&self) -> ErrorCategory {
        match self {
            Self::ReadOnly(_) => ErrorCategory::Unsupported,
            Self::NotFinite(_) | Self::UnknownDirection(_) => ErrorCategory::Value,
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            Self::ReadOnly(prop) => format!(
                "`{prop}` cannot be changed directly. Use the band commands to move members."
            ),
            Self::NotFinite(command) => format!("`{command}` needs finite numbers."),
            Self::UnknownDirection(token) => format!(
                "\"{token}\" is not a direction. Use \"left\", \"right\", \"forward\", \"backward\" or degrees."
            ),
        }
    }

    fn raise<T>(self) -> HostResult<T> {
        Err(EvalAltResult::ErrorRuntime(Dynamic::from(self), ScriptPosition::NONE).into())
    }
}

fn type_error<T>(expected: &str, actual: &Dynamic) -> HostResult<T> {
    Err(EvalAltResult::ErrorMismatchDataType(
        expected.to_string(),
        actual.type_name().to_string(),
        ScriptPosition::NONE,
    )
    .into())
}

fn number(value: &Dynamic, command: &'static str) -> HostResult<f64> {
    let n = if let Ok(f) = value.as_float() {
        f
    } else if let Ok(i) = value.as_int() {
        i as FLOAT
    } else {
        return type_error("number", value);
    };
    if n.is_finite() {
        Ok(n)
    } else {
        HostFault::NotFinite(command).raise()
    }
}

fn member_ref(value: &Dynamic) -> HostResult<MemberRef> {
    if let Some(handle) = value.clone().try_cast::<MemberHandle>() {
        Ok(MemberRef::Member(handle.id))
    } else if let Ok(id) = value.as_int() {
        Ok(MemberRef::Id(id))
    } else if value.is_unit() {
        Ok(NOBODY)
    } else {
        type_error("BandMember or id", value)
    }
}

fn member_list(value: &Dynamic) -> HostResult<Vec<MemberRef>> {
    match value.clone().into_array() {
        Ok(items) => items.iter().map(member_ref).collect(),
        Err(_) => type_error("list of members", value),
    }
}

fn direction(value: &Dynamic) -> HostResult<Direction> {
    if let Ok(token) = value.clone().into_immutable_string() {
        match Direction::parse(&token) {
            Some(direction) => Ok(direction),
            None => HostFault::UnknownDirection(token.to_string()).raise(),
        }
    } else if let Ok(degrees) = value.as_int() {
        Ok(Direction::Degrees(degrees))
    } else if let Ok(degrees) = value.as_float() {
        if degrees.is_finite() {
            Ok(Direction::Degrees(degrees.round() as i64))
        } else {
            HostFault::NotFinite("turn").raise()
        }
    } else {
        type_error("direction", value)
    }
}

/// The `band` object.
#[derive(Clone)]
pub(crate) struct BandHandle {
    ctx: Shared,
}

impl BandHandle {
    fn member(&self, id: MemberId) -> Dynamic {
        Dynamic::from(MemberHandle {
            id,
            ctx: Rc::clone(&self.ctx),
        })
    }

    fn all_members(&self) -> Array {
        let ids: Vec<MemberId> = self
            .ctx
            .borrow()
            .api
            .store()
            .get_all_members()
            .iter()
            .map(BandMember::id)
            .collect();
        ids.into_iter().map(|id| self.member(id)).collect()
    }

    fn section(&self, section: Section) -> Array {
        let ids: Vec<MemberId> = self
            .ctx
            .borrow()
            .api
            .store()
            .section_members(section)
            .map(BandMember::id)
            .collect();
        ids.into_iter().map(|id| self.member(id)).collect()
    }

    fn get_member(&mut self, member: Dynamic) -> HostResult<Dynamic> {
        let member = member_ref(&member)?;
        let found = self.ctx.borrow().api.get_member(member).map(BandMember::id);
        Ok(found.map_or(Dynamic::UNIT, |id| self.member(id)))
    }

    fn get_section(&mut self, name: Dynamic) -> HostResult<Array> {
        match name.clone().into_immutable_string() {
            Ok(name) => Ok(Section::parse(&name).map_or_else(Array::new, |s| self.section(s))),
            Err(_) => type_error("section name", &name),
        }
    }

    fn move_to(&mut self, member: Dynamic, x: Dynamic, y: Dynamic) -> HostResult<()> {
        let member = member_ref(&member)?;
        let (x, y) = (number(&x, "move_to")?, number(&y, "move_to")?);
        self.ctx.borrow_mut().api.move_to(member, x, y);
        Ok(())
    }

    fn move_forward(&mut self, member: Dynamic, steps: Dynamic) -> HostResult<()> {
        let member = member_ref(&member)?;
        let steps = number(&steps, "move_forward")?;
        self.ctx.borrow_mut().api.move_forward(member, steps);
        Ok(())
    }

    fn turn(&mut self, member: Dynamic, to: Dynamic) -> HostResult<()> {
        let member = member_ref(&member)?;
        let to = direction(&to)?;
        self.ctx.borrow_mut().api.turn(member, to);
        Ok(())
    }

    fn form_line(
        &mut self,
        members: Dynamic,
        x1: Dynamic,
        y1: Dynamic,
        x2: Dynamic,
        y2: Dynamic,
    ) -> HostResult<()> {
        let members = member_list(&members)?;
        let x1 = number(&x1, "form_line")?;
        let y1 = number(&y1, "form_line")?;
        let x2 = number(&x2, "form_line")?;
        let y2 = number(&y2, "form_line")?;
        self.ctx.borrow_mut().api.form_line(&members, x1, y1, x2, y2);
        Ok(())
    }

    fn form_circle(
        &mut self,
        members: Dynamic,
        cx: Dynamic,
        cy: Dynamic,
        radius: Dynamic,
    ) -> HostResult<()> {
        let members = member_list(&members)?;
        let cx = number(&cx, "form_circle")?;
        let cy = number(&cy, "form_circle")?;
        let radius = number(&radius, "form_circle")?;
        self.ctx.borrow_mut().api.form_circle(&members, cx, cy, radius);
        Ok(())
    }

    fn form_block(
        &mut self,
        members: Dynamic,
        x: Dynamic,
        y: Dynamic,
        rows: Dynamic,
        spacing: Dynamic,
    ) -> HostResult<()> {
        let members = member_list(&members)?;
        let x = number(&x, "form_block")?;
        let y = number(&y, "form_block")?;
        let Ok(rows) = rows.as_int() else {
            return type_error("integer", &rows);
        };
        let spacing = number(&spacing, "form_block")?;
        self.ctx
            .borrow_mut()
            .api
            .form_block(&members, x, y, rows, spacing);
        Ok(())
    }

    fn print_positions(&mut self) {
        let mut ctx = self.ctx.borrow_mut();
        let lines: Vec<String> = ctx
            .api
            .store()
            .get_all_members()
            .iter()
            .map(|m| {
                format!(
                    "Member {} ({}): x={:.1}, y={:.1}, facing={}",
                    m.id(),
                    m.section(),
                    m.x(),
                    m.y(),
                    m.facing()
                )
            })
            .collect();
        for line in lines {
            ctx.emit(line);
        }
    }
}

/// A `BandMember` as scripts see it.
#[derive(Clone)]
pub(crate) struct MemberHandle {
    id: MemberId,
    ctx: Shared,
}

impl MemberHandle {
    fn read<T>(&self, default: T, f: impl FnOnce(&BandMember) -> T) -> T {
        self.ctx
            .borrow()
            .api
            .store()
            .get_member(self.id)
            .map_or(default, f)
    }

    fn describe(&mut self) -> String {
        self.read(format!("BandMember({})", self.id), ToString::to_string)
    }
}

/// Build a locked-down interpreter bound to `ctx`.
///
/// `abort` is polled on every operation; the watchdog sets it when the time
/// budget runs out.
pub(crate) fn build_engine(ctx: &Shared, budget: &RunBudget, abort: Arc<AtomicBool>) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_expr_depths(64, 64);
    engine.set_max_call_levels(64);
    engine.set_max_operations(budget.max_operations);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(1_000);
    engine.set_max_map_size(500);
    engine.set_module_resolver(DummyModuleResolver::new());
    engine.disable_symbol("eval");

    let progress = Rc::clone(ctx);
    engine.on_progress(move |ops| {
        progress.borrow_mut().operations = ops;
        if abort.load(Ordering::Relaxed) {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    // Some interpreter errors carry no position; the step hook keeps the
    // current line so diagnostics can still name one.
    let cursor = Rc::clone(ctx);
    engine.register_debugger(
        |_, debugger| debugger,
        move |_, _, _, _, pos| {
            if let Some(line) = pos.line() {
                cursor.borrow_mut().last_line = Some(line);
            }
            Ok(DebuggerCommand::StepInto)
        },
    );

    let out = Rc::clone(ctx);
    engine.on_print(move |text| out.borrow_mut().emit(text.to_string()));
    let out = Rc::clone(ctx);
    engine.on_debug(move |text, _, pos| {
        let line = match pos.line() {
            Some(line) => format!("[line {line}] {text}"),
            None => text.to_string(),
        };
        out.borrow_mut().emit(line);
    });

    engine
        .register_type_with_name::<BandHandle>("Band")
        .register_fn("get_member", BandHandle::get_member)
        .register_fn("get_all_members", |band: &mut BandHandle| band.all_members())
        .register_fn("get_section", BandHandle::get_section)
        .register_fn("move_to", BandHandle::move_to)
        .register_fn("move_forward", BandHandle::move_forward)
        .register_fn("turn", BandHandle::turn)
        .register_fn("form_line", BandHandle::form_line)
        .register_fn("form_circle", BandHandle::form_circle)
        .register_fn("form_block", BandHandle::form_block)
        .register_fn(
            "form_block",
            |band: &mut BandHandle, members: Dynamic, x: Dynamic, y: Dynamic, rows: Dynamic| {
                let spacing = Dynamic::from_float(crate::band::formation::DEFAULT_BLOCK_SPACING);
                band.form_block(members, x, y, rows, spacing)
            },
        )
        .register_fn("print_positions", BandHandle::print_positions)
        .register_fn("to_string", |_: &mut BandHandle| "Band".to_string())
        .register_fn("to_debug", |_: &mut BandHandle| "Band".to_string());

    engine
        .register_type_with_name::<MemberHandle>("BandMember")
        .register_get("id", |m: &mut MemberHandle| INT::from(m.id))
        .register_get("x", |m: &mut MemberHandle| m.read(0.0, BandMember::x))
        .register_get("y", |m: &mut MemberHandle| m.read(0.0, BandMember::y))
        .register_get("facing", |m: &mut MemberHandle| {
            m.read(0, |member| INT::from(member.facing()))
        })
        .register_get("section", |m: &mut MemberHandle| {
            m.read(String::new(), |member| member.section().name().to_string())
        })
        .register_get("instrument", |m: &mut MemberHandle| {
            m.read(String::new(), |member| member.instrument().to_string())
        })
        .register_fn("to_string", MemberHandle::describe)
        .register_fn("to_debug", MemberHandle::describe);

    for &prop in MEMBER_PROPERTIES {
        engine.register_set(prop, move |_: &mut MemberHandle, _: Dynamic| -> HostResult<()> {
            HostFault::ReadOnly(prop).raise()
        });
    }

    debug!(max_operations = budget.max_operations, "script engine ready");
    engine
}

/// The names a script starts with: `band`, `members` and one list per
/// section.
pub(crate) fn bind_scope(ctx: &Shared) -> Scope<'static> {
    let band = BandHandle {
        ctx: Rc::clone(ctx),
    };
    let mut scope = Scope::new();
    scope.push("members", band.all_members());
    for section in Section::ALL {
        scope.push(section.name(), band.section(section));
    }
    scope.push("band", band);
    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Roster;

    fn shared(size: usize) -> Shared {
        let store = Roster::standard(size).to_store().unwrap();
        Rc::new(RefCell::new(ExecutionContext::new(store)))
    }

    fn run(ctx: &Shared, source: &str) -> Result<(), Box<EvalAltResult>> {
        let engine = build_engine(ctx, &RunBudget::default(), Arc::new(AtomicBool::new(false)));
        let mut scope = bind_scope(ctx);
        engine.run_with_scope(&mut scope, source)
    }

    fn position(ctx: &Shared, id: MemberId) -> (f64, f64) {
        let ctx = ctx.borrow();
        let m = ctx.api().store().get_member(id).unwrap();
        (m.x(), m.y())
    }

    fn assert_at(ctx: &Shared, id: MemberId, expected: (f64, f64)) {
        let (x, y) = position(ctx, id);
        assert!(
            (x - expected.0).abs() < 1e-9 && (y - expected.1).abs() < 1e-9,
            "member {id} at ({x}, {y}), expected {expected:?}"
        );
    }

    #[test]
    fn test_move_to_with_id_and_member() {
        let ctx = shared(4);
        run(&ctx, "band.move_to(0, 50, 20); band.move_to(members[1], 60.5, 21);").unwrap();
        assert_at(&ctx, 0, (50.0, 20.0));
        assert_at(&ctx, 1, (60.5, 21.0));
    }

    #[test]
    fn test_member_properties_are_live() {
        let ctx = shared(4);
        run(
            &ctx,
            r#"
            let m = band.get_member(2);
            band.move_to(m, 42, 7);
            if m.x != 42.0 { throw "stale"; }
            print(m.section + " " + m.instrument);
            "#,
        )
        .unwrap();
        assert_eq!(ctx.borrow().output(), ["brass french horn"]);
    }

    #[test]
    fn test_get_member_missing_is_unit() {
        let ctx = shared(2);
        run(&ctx, "let m = band.get_member(99); if m != () { throw \"found\"; } band.move_to(m, 1, 1);")
            .unwrap();
    }

    #[test]
    fn test_section_lists_bound() {
        let ctx = shared(16);
        run(&ctx, "if guard.len() != 4 || band.get_section(\"nope\").len() != 0 { throw \"bad\"; }")
            .unwrap();
    }

    #[test]
    fn test_property_assignment_rejected() {
        let ctx = shared(1);
        let err = run(&ctx, "let m = members[0]; m.x = 5;").unwrap_err();
        let EvalAltResult::ErrorRuntime(payload, _) = *err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(payload.try_cast::<HostFault>(), Some(HostFault::ReadOnly("x")));
    }

    #[test]
    fn test_unknown_direction_rejected() {
        let ctx = shared(1);
        let err = run(&ctx, "band.turn(0, \"sideways\");").unwrap_err();
        assert!(matches!(*err, EvalAltResult::ErrorRuntime(..)));
    }

    #[test]
    fn test_wrong_argument_type() {
        let ctx = shared(1);
        let err = run(&ctx, "band.move_to(0, \"ten\", 5);").unwrap_err();
        assert!(matches!(*err, EvalAltResult::ErrorMismatchDataType(..)));
    }

    #[test]
    fn test_form_block_default_spacing() {
        let ctx = shared(4);
        run(&ctx, "band.form_block(members, 10, 10, 2);").unwrap();
        assert_at(&ctx, 3, (15.0, 15.0));
    }

    #[test]
    fn test_print_positions_captured() {
        let ctx = shared(2);
        run(&ctx, "band.print_positions();").unwrap();
        let ctx = ctx.borrow();
        assert_eq!(ctx.output().len(), 2);
        assert!(ctx.output()[0].starts_with("Member 0 (brass): x=20.0"));
    }

    #[test]
    fn test_commands_recorded() {
        let ctx = shared(4);
        run(&ctx, "band.form_line(members, 20, 26, 80, 26); band.turn(0, \"left\");").unwrap();
        let kinds: Vec<_> = ctx.borrow().api().commands().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![crate::band::CommandKind::FormLine, crate::band::CommandKind::Turn]
        );
    }

    #[test]
    fn test_import_blocked() {
        let ctx = shared(1);
        let err = run(&ctx, "import \"std\" as s;").unwrap_err();
        assert!(matches!(*err, EvalAltResult::ErrorModuleNotFound(..)));
    }
}
