//! Classification of interpreter errors into learner-facing diagnostics.
//!
//! Raw interpreter messages never reach the learner. Each error is mapped to
//! an [`ErrorCategory`] and a templated one-sentence message; the raw text
//! only goes to the debug log.

use rhai::{EvalAltResult, LexError, ParseError, ParseErrorType};
use tracing::debug;

use crate::error::{Diagnostic, ErrorCategory};

use super::host::{HostFault, BAND_COMMANDS, MEMBER_PROPERTIES};

/// Names worth suggesting when a script misspells something.
const KNOWN_NAMES: &[&str] = &["print", "debug", "range", "len", "push"];

/// Largest edit distance still offered as a "did you mean".
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Classify a compile failure.
pub(crate) fn classify_parse(err: &ParseError) -> Diagnostic {
    debug!(error = %err, "script failed to compile");
    Diagnostic::new(
        ErrorCategory::Syntax,
        err.position().line(),
        &parse_message(err.err_type()),
    )
}

/// Classify a failure raised while the script ran.
///
/// `last_line` is where the interpreter last stepped; it stands in when the
/// error itself carries no position.
pub(crate) fn classify(err: &EvalAltResult, last_line: Option<usize>) -> Diagnostic {
    debug!(error = %err, "script failed");
    let (category, message) = describe(err);
    Diagnostic::new(category, innermost_line(err).or(last_line), &message)
}

fn parse_message(kind: &ParseErrorType) -> String {
    match kind {
        ParseErrorType::UnexpectedEOF => {
            "The script ends too early. Check for a missing `)` or `}`.".to_string()
        }
        ParseErrorType::MissingToken(token, _) => format!("A `{token}` is missing here."),
        ParseErrorType::MissingSymbol(_) => "A symbol is missing here.".to_string(),
        ParseErrorType::BadInput(LexError::UnexpectedInput(token)) => {
            format!("`{token}` cannot appear here.")
        }
        ParseErrorType::BadInput(LexError::UnterminatedString) => {
            "A text value is missing its closing quote.".to_string()
        }
        ParseErrorType::BadInput(LexError::MalformedNumber(number)) => {
            format!("`{number}` is not a valid number.")
        }
        ParseErrorType::ExprExpected(_) => "A value is missing here.".to_string(),
        ParseErrorType::VariableExpected => "A variable name is expected here.".to_string(),
        ParseErrorType::Reserved(word) => {
            format!("`{word}` is a reserved word and cannot be used as a name.")
        }
        ParseErrorType::UnknownOperator(op) => format!("`{op}` is not an operator."),
        ParseErrorType::AssignmentToConstant(name) => {
            format!("`{name}` is a constant and cannot be changed.")
        }
        _ => "The script could not be understood. Check the spelling and punctuation here."
            .to_string(),
    }
}

/// Line of the innermost error that carries one.
fn innermost_line(err: &EvalAltResult) -> Option<usize> {
    let inner = match err {
        EvalAltResult::ErrorInFunctionCall(.., inner, _) | EvalAltResult::ErrorInModule(_, inner, _) => {
            innermost_line(inner)
        }
        _ => None,
    };
    inner.or_else(|| err.position().line())
}

fn describe(err: &EvalAltResult) -> (ErrorCategory, String) {
    use ErrorCategory as C;

    match err {
        EvalAltResult::ErrorInFunctionCall(.., inner, _) | EvalAltResult::ErrorInModule(_, inner, _) => {
            describe(inner)
        }
        EvalAltResult::ErrorParsing(kind, _) => (C::Syntax, parse_message(kind)),
        EvalAltResult::ErrorVariableNotFound(name, _) => (C::Name, not_defined(name)),
        EvalAltResult::ErrorPropertyNotFound(name, _) => unknown_property(name, None),
        EvalAltResult::ErrorFunctionNotFound(signature, _) => function_not_found(signature),
        EvalAltResult::ErrorModuleNotFound(name, _) => (
            C::Unsupported,
            format!("Importing `{name}` is not allowed. Only the band commands are available."),
        ),
        EvalAltResult::ErrorDotExpr(message, _) => dot_expr(message),
        EvalAltResult::ErrorMismatchDataType(expected, actual, _) => (
            C::Type,
            format!(
                "Expected {} but got {}.",
                friendly_type(expected),
                friendly_type(actual)
            ),
        ),
        EvalAltResult::ErrorMismatchOutputType(expected, actual, _) => (
            C::Type,
            format!(
                "Expected the result to be {} but got {}.",
                friendly_type(expected),
                friendly_type(actual)
            ),
        ),
        EvalAltResult::ErrorIndexingType(type_name, _) => (
            C::Type,
            format!("A {} cannot be indexed with [].", friendly_type(type_name)),
        ),
        EvalAltResult::ErrorFor(_) => (
            C::Type,
            "A `for` loop needs a list or a range to walk over.".to_string(),
        ),
        EvalAltResult::ErrorUnboundThis(_) => (
            C::Type,
            "`this` can only be used inside a method.".to_string(),
        ),
        EvalAltResult::ErrorArithmetic(message, _) => (
            C::Value,
            if message.to_ascii_lowercase().contains("zero") {
                "A calculation is impossible here (dividing by zero?).".to_string()
            } else {
                "A calculation went out of range here (a number got too big?).".to_string()
            },
        ),
        EvalAltResult::ErrorArrayBounds(len, index, _) => (
            C::Value,
            format!("Index {index} is out of range for a list of {len} items."),
        ),
        EvalAltResult::ErrorStringBounds(len, index, _) => (
            C::Value,
            format!("Index {index} is out of range for a text of {len} characters."),
        ),
        EvalAltResult::ErrorTooManyOperations(_) | EvalAltResult::ErrorTerminated(..) => (
            C::Timeout,
            "The script took too long to finish. Check for loops that never end.".to_string(),
        ),
        EvalAltResult::ErrorAssignmentToConstant(name, _) => (
            C::Unsupported,
            format!("`{name}` is a constant and cannot be changed."),
        ),
        EvalAltResult::ErrorRuntime(payload, _) => match payload.clone().try_cast::<HostFault>() {
            Some(fault) => (fault.category(), fault.message()),
            None => (C::Runtime, format!("The script stopped with: {payload}.")),
        },
        EvalAltResult::ErrorStackOverflow(_) => (
            C::Runtime,
            "Too many nested function calls. Check for functions that call themselves forever."
                .to_string(),
        ),
        EvalAltResult::ErrorDataTooLarge(what, _) => {
            (C::Runtime, format!("{what} grew too large for the sandbox."))
        }
        EvalAltResult::ErrorSystem(..) => (
            C::Internal,
            "Something went wrong inside the game, not in your code.".to_string(),
        ),
        _ => (
            C::Runtime,
            "Something went wrong while running the script.".to_string(),
        ),
    }
}

fn not_defined(name: &str) -> String {
    let mut candidates = vec!["band", "members", "brass", "woodwind", "percussion", "guard"];
    candidates.extend_from_slice(KNOWN_NAMES);
    format!("`{name}` is not defined.{}", hint(name, &candidates))
}

/// Rhai reports unknown calls as `name (arg types)`.
fn function_not_found(signature: &str) -> (ErrorCategory, String) {
    let name = signature
        .split(|c: char| c == ' ' || c == '(')
        .next()
        .unwrap_or(signature)
        .trim();
    let args = signature[name.len()..].trim();
    let kinds = friendly_args(args);

    if let Some(prop) = name.strip_prefix("get$") {
        return unknown_property(prop, args_inner(args));
    }

    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        let operands = if kinds.is_empty() {
            "nothing".to_string()
        } else {
            kinds.join(" and ")
        };
        return (
            ErrorCategory::Type,
            format!("`{name}` cannot be used with {operands}."),
        );
    }

    if BAND_COMMANDS.contains(&name) {
        let given = if kinds.is_empty() {
            "no values".to_string()
        } else {
            kinds.join(", ")
        };
        return (
            ErrorCategory::Type,
            format!("`{name}` was called with the wrong number or kind of values (given {given})."),
        );
    }

    let mut candidates = BAND_COMMANDS.to_vec();
    candidates.extend_from_slice(KNOWN_NAMES);
    (
        ErrorCategory::Name,
        format!("`{name}` is not a known command.{}", hint(name, &candidates)),
    )
}

/// Rhai reports missing getters and setters as dot-expression errors that
/// quote the property name.
fn dot_expr(message: &str) -> (ErrorCategory, String) {
    let mut quoted = message.split('\'').skip(1).step_by(2);
    let prop = quoted.next().unwrap_or("?");
    if message.starts_with("Unknown property") {
        unknown_property(prop, quoted.next())
    } else {
        (
            ErrorCategory::Type,
            format!("`{prop}` cannot be set on this value."),
        )
    }
}

/// A property read on a value that has no such property. `type_name` is the
/// interpreter's name for the value, when known.
fn unknown_property(prop: &str, type_name: Option<&str>) -> (ErrorCategory, String) {
    if !MEMBER_PROPERTIES.contains(&prop) {
        return (
            ErrorCategory::Name,
            format!("`{prop}` is not a property.{}", hint(prop, MEMBER_PROPERTIES)),
        );
    }
    let message = match type_name {
        Some("()") => {
            format!("This value is nothing (no member with that id?), so it has no `{prop}`.")
        }
        Some(name) => format!("`{prop}` belongs to band members, not to {}.", friendly_type(name)),
        None => format!("`{prop}` belongs to band members, not to this value."),
    };
    (ErrorCategory::Type, message)
}

fn hint(name: &str, candidates: &[&str]) -> String {
    suggest(name, candidates).map_or_else(String::new, |s| format!(" Did you mean `{s}`?"))
}

/// Closest candidate within [`MAX_SUGGESTION_DISTANCE`] edits.
fn suggest<'a>(name: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (levenshtein(name, c), c))
        .filter(|&(d, _)| d > 0 && d <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|&(d, _)| d)
        .map(|(_, c)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (row[j] + 1).min(row[j + 1] + 1).min(prev + cost);
            prev = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

/// Human name for an interpreter or Rust type name.
pub(crate) fn friendly_type(name: &str) -> &str {
    let short = name.rsplit("::").next().unwrap_or(name);
    match short {
        "i64" | "i32" | "INT" => "a whole number",
        "f64" | "f32" | "FLOAT" => "a number",
        "string" | "String" | "ImmutableString" | "&str" | "char" => "text",
        "array" | "Array" => "a list",
        "map" | "Map" => "a map",
        "bool" => "true/false",
        "()" => "nothing",
        "Band" | "BandHandle" => "the band",
        "BandMember" | "MemberHandle" => "a band member",
        _ => name,
    }
}

/// The argument list inside a `(type, type)` signature tail.
fn args_inner(args: &str) -> Option<&str> {
    args.strip_prefix('(')
        .and_then(|a| a.strip_suffix(')'))
        .map(str::trim)
}

fn friendly_args(args: &str) -> Vec<&str> {
    match args_inner(args) {
        Some(inner) if !inner.is_empty() => {
            inner.split(',').map(|t| friendly_type(t.trim())).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::{Dynamic, Position};

    fn at(line: u16) -> Position {
        Position::new(line, 1)
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("mvoe_to", "move_to"), 2);
        assert_eq!(levenshtein("turn", "turn"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_misspelled_command_suggests() {
        let err = EvalAltResult::ErrorFunctionNotFound("mvoe_to (Band, i64, i64, i64)".into(), at(3));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Name);
        assert_eq!(d.line, Some(3));
        assert!(d.message.starts_with("Line 3: `mvoe_to`"));
        assert!(d.message.contains("Did you mean `move_to`?"));
    }

    #[test]
    fn test_wrong_arity_is_type_error() {
        let err = EvalAltResult::ErrorFunctionNotFound("move_to (Band, i64)".into(), at(1));
        assert_eq!(classify(&err, None).category, ErrorCategory::Type);
    }

    #[test]
    fn test_operator_mismatch_is_type_error() {
        let err = EvalAltResult::ErrorFunctionNotFound("- (string, i64)".into(), at(2));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Type);
        assert!(d.message.contains("text and a whole number"));
    }

    #[test]
    fn test_unknown_variable() {
        let err = EvalAltResult::ErrorVariableNotFound("bnad".into(), at(4));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Name);
        assert!(d.message.contains("Did you mean `band`?"));
    }

    #[test]
    fn test_timeouts() {
        let ops = EvalAltResult::ErrorTooManyOperations(at(1));
        let flag = EvalAltResult::ErrorTerminated(Dynamic::UNIT, at(1));
        assert_eq!(classify(&ops, None).category, ErrorCategory::Timeout);
        assert_eq!(classify(&flag, None).category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_host_fault_payload() {
        let err = EvalAltResult::ErrorRuntime(Dynamic::from(HostFault::ReadOnly("x")), at(5));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Unsupported);
        assert_eq!(d.line, Some(5));
    }

    #[test]
    fn test_thrown_value_is_runtime() {
        let err = EvalAltResult::ErrorRuntime("boom".into(), at(2));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Runtime);
        assert!(d.message.contains("boom"));
    }

    #[test]
    fn test_nested_call_uses_inner_line() {
        let inner = EvalAltResult::ErrorArithmetic("Division by zero".into(), at(7));
        let err = EvalAltResult::ErrorInFunctionCall("helper".into(), String::new(), inner.into(), at(12));
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Value);
        assert_eq!(d.line, Some(7));
    }

    #[test]
    fn test_unknown_property() {
        let err = EvalAltResult::ErrorDotExpr(
            "Unknown property 'positon' - a getter is not registered for type 'BandMember'".into(),
            at(1),
        );
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Name);
        assert!(d.message.contains("`positon`"));
    }

    #[test]
    fn test_known_property_on_nothing() {
        let err = EvalAltResult::ErrorDotExpr(
            "Unknown property 'x' - a getter is not registered for type '()'".into(),
            at(2),
        );
        let d = classify(&err, None);
        assert_eq!(d.category, ErrorCategory::Type);
        assert!(d.message.contains("nothing"), "{}", d.message);
        assert!(!d.message.contains("Did you mean"), "{}", d.message);

        let getter = EvalAltResult::ErrorFunctionNotFound("get$facing (())".into(), at(2));
        let d = classify(&getter, None);
        assert_eq!(d.category, ErrorCategory::Type);
        assert!(d.message.contains("`facing`"), "{}", d.message);
        assert!(d.message.contains("nothing"), "{}", d.message);
    }

    #[test]
    fn test_known_property_on_number() {
        let err = EvalAltResult::ErrorDotExpr(
            "Unknown property 'y' - a getter is not registered for type 'i64'".into(),
            at(1),
        );
        let d = classify(&err, None);
        assert_eq!(
            d.message,
            "Line 1: `y` belongs to band members, not to a whole number."
        );
    }

    #[test]
    fn test_wrong_arity_lists_given_values() {
        let err = EvalAltResult::ErrorFunctionNotFound("form_line (Band, array, i64)".into(), at(1));
        let d = classify(&err, None);
        assert!(
            d.message.ends_with("(given the band, a list, a whole number)."),
            "{}",
            d.message
        );
    }

    #[test]
    fn test_arithmetic_is_templated_and_falls_back_to_last_line() {
        let err = EvalAltResult::ErrorArithmetic("Division by zero: 10 / 0".into(), Position::NONE);
        let d = classify(&err, Some(2));
        assert_eq!(d.category, ErrorCategory::Value);
        assert_eq!(d.line, Some(2));
        assert_eq!(
            d.message,
            "Line 2: A calculation is impossible here (dividing by zero?)."
        );

        let positioned = EvalAltResult::ErrorArithmetic("Division by zero".into(), at(4));
        assert_eq!(classify(&positioned, Some(9)).line, Some(4));
    }

    #[test]
    fn test_parse_messages_are_templated() {
        assert_eq!(
            parse_message(&ParseErrorType::VariableExpected),
            "A variable name is expected here."
        );
        assert_eq!(
            parse_message(&ParseErrorType::BadInput(LexError::UnexpectedInput("let".into()))),
            "`let` cannot appear here."
        );
        assert_eq!(
            parse_message(&ParseErrorType::MissingToken(")".into(), "to close the call".into())),
            "A `)` is missing here."
        );
    }

    #[test]
    fn test_friendly_type_strips_paths() {
        assert_eq!(friendly_type("bandcode::sandbox::host::MemberHandle"), "a band member");
        assert_eq!(friendly_type("i64"), "a whole number");
    }
}
