//! Pattern evaluation.
//!
//! `accepts` / `accepts_key` test a pattern against a raw string.
//! `matches` / `matches_key` compare two pattern strings, honouring the trust
//! mode of the context: in data-plane mode the matched side is plain text no
//! matter what flags or kind it carries; in control-plane mode either side
//! may act as the pattern.

use crate::context::MatchContext;
use crate::pattern::{PatternKind, PatternString};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Key,
    Value,
}

impl Position {
    /// Keys are always compared case-insensitively. Regex values are
    /// case-sensitive unless they equal the regex text itself.
    fn case_insensitive(self) -> bool {
        matches!(self, Position::Key)
    }
}

/// Test the un-negated predicate.
///
/// Returns `None` when the pattern is malformed; such a clause never matches.
fn raw_accept(
    pattern: &PatternString,
    actual: &str,
    position: Position,
    ctx: &MatchContext,
) -> Option<bool> {
    match pattern.kind() {
        PatternKind::Literal => Some(pattern.cached_value().equals(actual, false)),
        PatternKind::Regex => {
            let case_insensitive = position.case_insensitive();
            let regex = pattern.compiled_regex(case_insensitive, ctx)?;
            Some(pattern.cached_value().equals(actual, false) || regex.is_match(actual))
        }
        PatternKind::Schema => {
            let schema = pattern.compiled_schema(ctx)?;
            Some(schema.accepts(actual))
        }
    }
}

fn accept(pattern: &PatternString, actual: &str, position: Position, ctx: &MatchContext) -> bool {
    raw_accept(pattern, actual, position, ctx)
        .map(|raw| raw ^ pattern.is_not())
        .unwrap_or(false)
}

/// Whether `pattern` accepts the value `actual`.
pub fn accepts(pattern: &PatternString, actual: &str, ctx: &MatchContext) -> bool {
    accept(pattern, actual, Position::Value, ctx)
}

/// Whether `pattern` accepts the key `actual`.
pub fn accepts_key(pattern: &PatternString, actual: &str, ctx: &MatchContext) -> bool {
    accept(pattern, actual, Position::Key, ctx)
}

fn schemas_equal(left: &PatternString, right: &PatternString) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(left.value()),
        serde_json::from_str::<serde_json::Value>(right.value()),
    ) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

fn compare(
    matcher: &PatternString,
    matched: &PatternString,
    position: Position,
    ctx: &MatchContext,
) -> bool {
    if !ctx.control_plane {
        return accept(matcher, matched.value(), position, ctx);
    }

    let raw = if matcher.kind() == PatternKind::Schema && matched.kind() == PatternKind::Schema {
        schemas_equal(matcher, matched)
    } else {
        let Some(forward) = raw_accept(matcher, matched.value(), position, ctx) else {
            return false;
        };
        if forward {
            true
        } else {
            match raw_accept(matched, matcher.value(), position, ctx) {
                Some(reverse) => reverse,
                None => return false,
            }
        }
    };
    raw ^ matcher.is_not() ^ matched.is_not()
}

/// Compare a matcher value with a matched value.
pub fn matches(matcher: &PatternString, matched: &PatternString, ctx: &MatchContext) -> bool {
    compare(matcher, matched, Position::Value, ctx)
}

/// Compare a matcher key with a matched key.
pub fn matches_key(matcher: &PatternString, matched: &PatternString, ctx: &MatchContext) -> bool {
    compare(matcher, matched, Position::Key, ctx)
}
