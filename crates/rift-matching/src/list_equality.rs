//! Ordered list equality for positional attributes such as path parameters.
//!
//! Both checks require that every matcher entry is paired with a distinct
//! matched entry and the other way round. Pairings are found with augmenting
//! paths, so an entry that could satisfy several counterparts never blocks a
//! complete assignment that exists.

use crate::container::KeyAndValue;
use crate::context::MatchContext;
use crate::matcher;

/// Size of a maximum one-to-one pairing of `left` indices with right-side
/// indices, where `adjacency[l]` lists the right indices `l` may pair with.
fn maximum_pairing(adjacency: &[Vec<usize>], right_len: usize) -> usize {
    fn augment(
        left: usize,
        adjacency: &[Vec<usize>],
        visited: &mut [bool],
        paired_with: &mut [Option<usize>],
    ) -> bool {
        for &right in &adjacency[left] {
            if visited[right] {
                continue;
            }
            visited[right] = true;
            let free = match paired_with[right] {
                None => true,
                Some(other) => augment(other, adjacency, visited, paired_with),
            };
            if free {
                paired_with[right] = Some(left);
                return true;
            }
        }
        false
    }

    let mut paired_with = vec![None; right_len];
    let mut pairs = 0;
    for left in 0..adjacency.len() {
        let mut visited = vec![false; right_len];
        if augment(left, adjacency, &mut visited, &mut paired_with) {
            pairs += 1;
        }
    }
    pairs
}

fn pairs_completely(
    matcher: &[&KeyAndValue],
    matched: &[&KeyAndValue],
    ctx: &MatchContext,
) -> bool {
    if matcher.len() != matched.len() {
        return false;
    }
    let adjacency: Vec<Vec<usize>> = matcher
        .iter()
        .map(|matcher_entry| {
            matched
                .iter()
                .enumerate()
                .filter(|(_, matched_entry)| matcher_entry.matches(matched_entry, ctx))
                .map(|(i, _)| i)
                .collect()
        })
        .collect();
    maximum_pairing(&adjacency, matched.len()) == matcher.len()
}

/// Whether `matcher` and `matched` pair up one-to-one.
pub fn lists_equal(matcher: &[KeyAndValue], matched: &[KeyAndValue], ctx: &MatchContext) -> bool {
    let matcher: Vec<&KeyAndValue> = matcher.iter().collect();
    let matched: Vec<&KeyAndValue> = matched.iter().collect();
    pairs_completely(&matcher, &matched, ctx)
}

/// Like [`lists_equal`], except that an entry with an optional key that is
/// absent from the other side is skipped instead of requiring a partner.
pub fn lists_equal_with_optionals(
    matcher: &[KeyAndValue],
    matched: &[KeyAndValue],
    ctx: &MatchContext,
) -> bool {
    let required_matcher: Vec<&KeyAndValue> = matcher
        .iter()
        .filter(|matcher_entry| {
            !matcher_entry.key.is_optional()
                || matched.iter().any(|matched_entry| {
                    matcher::matches_key(&matcher_entry.key, &matched_entry.key, ctx)
                })
        })
        .collect();
    let required_matched: Vec<&KeyAndValue> = matched
        .iter()
        .filter(|matched_entry| {
            !matched_entry.key.is_optional()
                || matcher.iter().any(|matcher_entry| {
                    matcher::matches_key(&matcher_entry.key, &matched_entry.key, ctx)
                })
        })
        .collect();
    pairs_completely(&required_matcher, &required_matched, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<KeyAndValue> {
        pairs.iter().map(|(k, v)| KeyAndValue::new(*k, *v)).collect()
    }

    #[test]
    fn test_lists_equal_any_order() {
        let ctx = MatchContext::data_plane();
        assert!(lists_equal(
            &entries(&[("one", "1"), ("two", "2")]),
            &entries(&[("two", "2"), ("one", "1")]),
            &ctx
        ));
        assert!(lists_equal(&[], &[], &ctx));
    }

    #[test]
    fn test_lists_equal_requires_same_size() {
        let ctx = MatchContext::data_plane();
        assert!(!lists_equal(
            &entries(&[("one", "1")]),
            &entries(&[("one", "1"), ("two", "2")]),
            &ctx
        ));
        assert!(!lists_equal(
            &entries(&[("one", "1"), ("two", "2")]),
            &entries(&[("one", "1")]),
            &ctx
        ));
    }

    #[test]
    fn test_lists_equal_needs_distinct_partners() {
        let ctx = MatchContext::data_plane();
        // both regex entries accept only the first matched entry
        assert!(!lists_equal(
            &entries(&[("id.*", "1"), ("id.*", "[0-9]")]),
            &entries(&[("id", "1"), ("name", "x")]),
            &ctx
        ));
    }

    #[test]
    fn test_lists_equal_reassigns_greedy_choice() {
        let ctx = MatchContext::data_plane();
        // the first matcher entry could take either matched entry; only one
        // assignment leaves a partner for the second
        assert!(lists_equal(
            &entries(&[("id", "[0-9]+"), ("id", "7")]),
            &entries(&[("id", "7"), ("id", "12")]),
            &ctx
        ));
    }

    #[test]
    fn test_optional_absent_on_matcher_side() {
        let ctx = MatchContext::data_plane();
        let matcher = entries(&[("one", "1"), ("?two", "2")]);

        assert!(lists_equal_with_optionals(&matcher, &entries(&[("one", "1")]), &ctx));
        assert!(lists_equal_with_optionals(
            &matcher,
            &entries(&[("one", "1"), ("two", "2")]),
            &ctx
        ));
        assert!(!lists_equal_with_optionals(
            &matcher,
            &entries(&[("one", "1"), ("two", "3")]),
            &ctx
        ));
        assert!(!lists_equal(&matcher, &entries(&[("one", "1")]), &ctx));
    }

    #[test]
    fn test_optional_absent_on_matched_side() {
        let ctx = MatchContext::data_plane();
        assert!(lists_equal_with_optionals(
            &entries(&[("one", "1")]),
            &entries(&[("one", "1"), ("?two", "2")]),
            &ctx
        ));
        assert!(!lists_equal_with_optionals(
            &entries(&[("one", "1")]),
            &entries(&[("one", "1"), ("two", "2")]),
            &ctx
        ));
    }
}
