//! Subset containment: does a request's attribute group satisfy an
//! expectation's matcher group?
//!
//! # Styles
//!
//! - `SUB_SET` ([`contains_subset`]): every required matcher entry must be
//!   satisfied by some matched entry.
//! - `MATCHING_KEY` ([`contains_matching_key`]): every matched value under a
//!   matcher key must be accounted for by one of that key's matcher values.
//!
//! [`contains_all`] picks the style from the context and handles absent and
//! empty containers.

use std::collections::HashSet;

use crate::container::{KeyAndValue, MultiValueContainer};
use crate::context::{KeyMatchStyle, MatchContext};
use crate::matcher;
use crate::observer::MatchEvent;

/// `SUB_SET` containment of `matched` by `matcher`.
///
/// The final check compares the number of distinct matched entries used by
/// any matcher entry with the number of required matcher entries. It is an
/// aggregate count, not a one-to-one assignment.
pub fn contains_subset(
    matcher: &[KeyAndValue],
    matched: &[KeyAndValue],
    ctx: &MatchContext,
) -> bool {
    let mut used_indexes: HashSet<usize> = HashSet::new();

    for matcher_entry in matcher {
        let matching_indexes: Vec<usize> = matched
            .iter()
            .enumerate()
            .filter(|(_, matched_entry)| matcher_entry.matches(matched_entry, ctx))
            .map(|(i, _)| i)
            .collect();

        let optional_and_absent = matcher_entry.key.is_optional()
            && !matched.iter().any(|matched_entry| {
                matcher::matches_key(&matcher_entry.key, &matched_entry.key, ctx)
            });

        if matcher_entry.key.is_not() {
            let excluded = matcher_entry.key.un_negated();
            let conflict = matched.iter().any(|matched_entry| {
                !matched_entry.key.is_not()
                    && matcher::matches_key(&excluded, &matched_entry.key, ctx)
            });
            if conflict {
                ctx.emit(MatchEvent::NegatedKeyPresent {
                    key: excluded.to_text(),
                });
                return false;
            }
        }

        if !optional_and_absent && matching_indexes.is_empty() {
            ctx.emit(MatchEvent::EntryNotMatched {
                key: matcher_entry.key.to_text(),
                value: matcher_entry.value.to_text(),
            });
            return false;
        }

        used_indexes.extend(matching_indexes);
    }

    let required = matcher.iter().filter(|entry| !entry.key.is_optional()).count();
    if used_indexes.len() < required {
        ctx.emit(MatchEvent::InsufficientMatches {
            used: used_indexes.len(),
            required,
        });
        return false;
    }

    ctx.emit(MatchEvent::ContainmentMatched {
        style: KeyMatchStyle::SubSet,
        matcher_entries: matcher.len(),
        matched_entries: matched.len(),
    });
    true
}

/// `MATCHING_KEY` containment of `matched` by `matcher`.
pub fn contains_matching_key(
    matcher: &MultiValueContainer,
    matched: &MultiValueContainer,
    ctx: &MatchContext,
) -> bool {
    for (matcher_key, matcher_values) in matcher.groups() {
        let matched_values: Vec<_> = matched
            .groups()
            .filter(|(matched_key, _)| matcher::matches_key(matcher_key, matched_key, ctx))
            .flat_map(|(matched_key, values)| values.iter().map(move |v| (matched_key, v)))
            .collect();

        if matched_values.is_empty() {
            if matcher_key.is_optional() {
                continue;
            }
            ctx.emit(MatchEvent::KeyMissing {
                key: matcher_key.to_text(),
            });
            return false;
        }

        for (matched_key, matched_value) in matched_values {
            let accounted = matcher_values
                .iter()
                .any(|matcher_value| matcher::matches(matcher_value, matched_value, ctx));
            if !accounted {
                ctx.emit(MatchEvent::ValueNotAccounted {
                    key: matched_key.to_text(),
                    value: matched_value.to_text(),
                });
                return false;
            }
        }
    }

    ctx.emit(MatchEvent::ContainmentMatched {
        style: KeyMatchStyle::MatchingKey,
        matcher_entries: matcher.len(),
        matched_entries: matched.len(),
    });
    true
}

/// Containment check for one attribute group.
///
/// An absent container is treated as empty. An empty matcher always passes,
/// and so does a matcher whose keys are all negated against an empty
/// matched group.
pub fn contains_all(
    matcher: Option<&MultiValueContainer>,
    matched: Option<&MultiValueContainer>,
    ctx: &MatchContext,
) -> bool {
    let Some(matcher) = matcher.filter(|m| !m.is_empty()) else {
        return true;
    };
    let empty;
    let matched = match matched {
        Some(matched) => matched,
        None => {
            empty = MultiValueContainer::new(ctx.clone());
            &empty
        }
    };

    if matched.is_empty() && matcher.all_keys_notted() {
        return true;
    }

    match ctx.key_match_style {
        KeyMatchStyle::SubSet => {
            contains_subset(&matcher.entry_list(), &matched.entry_list(), ctx)
        }
        KeyMatchStyle::MatchingKey => contains_matching_key(matcher, matched, ctx),
    }
}
