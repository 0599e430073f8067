//! Ordered multi-value containers of pattern-string keys and values.
//!
//! Keys may be regexes or schemas, so lookup is a linear scan through the
//! pattern matcher rather than a hash lookup. Attribute groups are small
//! (typically fewer than fifty entries), which keeps the scan cheap.

use crate::context::MatchContext;
use crate::error::MatchingError;
use crate::matcher;
use crate::model::KeyToMultiValue;
use crate::pattern::PatternString;

/// One matcher clause or one fact extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyAndValue {
    pub key: PatternString,
    pub value: PatternString,
}

impl KeyAndValue {
    pub fn new(key: impl Into<PatternString>, value: impl Into<PatternString>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether this entry, as a matcher clause, is satisfied by `matched`.
    ///
    /// This is the matching predicate, not structural equality.
    pub fn matches(&self, matched: &KeyAndValue, ctx: &MatchContext) -> bool {
        matcher::matches_key(&self.key, &matched.key, ctx)
            && matcher::matches(&self.value, &matched.value, ctx)
    }
}

/// An insertion-ordered one-to-many mapping of pattern keys to pattern values.
#[derive(Debug, Clone)]
pub struct MultiValueContainer {
    groups: Vec<(PatternString, Vec<PatternString>)>,
    ctx: MatchContext,
}

/// Same flags, same kind, same text ignoring case.
fn same_key(left: &PatternString, right: &PatternString) -> bool {
    left.kind() == right.kind()
        && left.is_not() == right.is_not()
        && left.is_optional() == right.is_optional()
        && left.cached_value().lower == right.cached_value().lower
}

impl MultiValueContainer {
    pub fn new(ctx: MatchContext) -> Self {
        Self {
            groups: Vec::new(),
            ctx,
        }
    }

    pub fn from_entries<I, K, V>(ctx: MatchContext, entries: I) -> Result<Self, MatchingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PatternString>,
        V: Into<PatternString>,
    {
        let mut container = Self::new(ctx);
        for (key, value) in entries {
            container.put(key.into(), value.into())?;
        }
        Ok(container)
    }

    pub fn from_multi_values(
        ctx: MatchContext,
        multi_values: &[KeyToMultiValue],
    ) -> Result<Self, MatchingError> {
        let mut container = Self::new(ctx);
        for multi_value in multi_values {
            container.put_all(multi_value.name.clone(), multi_value.effective_values())?;
        }
        Ok(container)
    }

    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    /// Append `value` to the group for `key`, creating the group if needed.
    ///
    /// Keys share a group only when kind and flags are equal and their text
    /// is equal ignoring case; a regex key never absorbs a literal key.
    pub fn put(&mut self, key: PatternString, value: PatternString) -> Result<(), MatchingError> {
        match self.groups.iter_mut().find(|(k, _)| same_key(k, &key)) {
            Some((existing, values)) => {
                if existing.is_optional() {
                    let mut texts: Vec<String> = values.iter().map(PatternString::to_text).collect();
                    texts.push(value.to_text());
                    return Err(MatchingError::MultipleValuesForOptionalKey {
                        key: existing.to_text(),
                        values: texts,
                    });
                }
                values.push(value);
            }
            None => self.groups.push((key, vec![value])),
        }
        Ok(())
    }

    pub fn put_all<I>(&mut self, key: PatternString, values: I) -> Result<(), MatchingError>
    where
        I: IntoIterator<Item = PatternString>,
    {
        let values: Vec<PatternString> = values.into_iter().collect();
        if key.is_optional() && values.len() > 1 {
            return Err(MatchingError::MultipleValuesForOptionalKey {
                key: key.to_text(),
                values: values.iter().map(PatternString::to_text).collect(),
            });
        }
        for value in values {
            self.put(key.clone(), value)?;
        }
        Ok(())
    }

    fn key_matches(&self, query: &PatternString, group_key: &PatternString) -> bool {
        matcher::matches_key(query, group_key, &self.ctx)
    }

    /// First value of the first group whose key matches `key`.
    pub fn get(&self, key: &PatternString) -> Option<&PatternString> {
        self.groups
            .iter()
            .find(|(k, _)| self.key_matches(key, k))
            .and_then(|(_, values)| values.first())
    }

    /// Values of every group whose key matches `key`, in container order.
    pub fn get_all(&self, key: &PatternString) -> Vec<&PatternString> {
        self.groups
            .iter()
            .filter(|(k, _)| self.key_matches(key, k))
            .flat_map(|(_, values)| values.iter())
            .collect()
    }

    /// Remove the first value of the first group whose key matches `key`.
    pub fn remove(&mut self, key: &PatternString) -> Option<PatternString> {
        let index = self
            .groups
            .iter()
            .position(|(k, _)| self.key_matches(key, k))?;
        let values = &mut self.groups[index].1;
        let removed = if values.is_empty() {
            None
        } else {
            Some(values.remove(0))
        };
        if values.is_empty() {
            self.groups.remove(index);
        }
        removed
    }

    /// Remove every group whose key matches `key`, returning their values.
    pub fn remove_all(&mut self, key: &PatternString) -> Vec<PatternString> {
        let ctx = self.ctx.clone();
        let mut removed = Vec::new();
        self.groups.retain_mut(|(k, values)| {
            if matcher::matches_key(key, k, &ctx) {
                removed.append(values);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn contains_key(&self, key: &PatternString) -> bool {
        self.groups.iter().any(|(k, _)| self.key_matches(key, k))
    }

    pub fn contains_key_value(&self, key: &PatternString, value: &PatternString) -> bool {
        self.groups.iter().any(|(k, values)| {
            self.key_matches(key, k) && values.iter().any(|v| matcher::matches(value, v, &self.ctx))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of key groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn all_keys_notted(&self) -> bool {
        self.groups.iter().all(|(k, _)| k.is_not())
    }

    pub fn all_keys_optional(&self) -> bool {
        self.groups.iter().all(|(k, _)| k.is_optional())
    }

    pub fn has_optionals(&self) -> bool {
        self.groups.iter().any(|(k, _)| k.is_optional())
    }

    pub fn keys(&self) -> impl Iterator<Item = &PatternString> {
        self.groups.iter().map(|(k, _)| k)
    }

    /// Key groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (&PatternString, &[PatternString])> {
        self.groups.iter().map(|(k, values)| (k, values.as_slice()))
    }

    /// One entry per key/value pair, in container order.
    pub fn entry_list(&self) -> Vec<KeyAndValue> {
        self.groups
            .iter()
            .flat_map(|(k, values)| {
                values.iter().map(move |v| KeyAndValue {
                    key: k.clone(),
                    value: v.clone(),
                })
            })
            .collect()
    }

    pub fn to_multi_values(&self) -> Vec<KeyToMultiValue> {
        self.groups
            .iter()
            .map(|(k, values)| KeyToMultiValue {
                name: k.clone(),
                values: values.clone(),
            })
            .collect()
    }
}

/// Structural equality of the groups; the context is not compared.
impl PartialEq for MultiValueContainer {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl Eq for MultiValueContainer {}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(entries: &[(&str, &str)]) -> MultiValueContainer {
        MultiValueContainer::from_entries(
            MatchContext::data_plane(),
            entries.iter().map(|(k, v)| (*k, *v)),
        )
        .unwrap()
    }

    #[test]
    fn test_put_groups_case_insensitive_keys() {
        let c = container(&[("keyOne", "one"), ("KEYONE", "two"), ("keyTwo", "three")]);

        assert_eq!(c.len(), 2);
        assert_eq!(c.entry_list().len(), 3);
        let values: Vec<&str> = c
            .get_all(&PatternString::literal("keyone"))
            .into_iter()
            .map(PatternString::value)
            .collect();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[test]
    fn test_put_keeps_regex_keys_apart() {
        let c = container(&[("key.*", "one"), ("keyOne", "two")]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_get_with_regex_key() {
        let c = container(&[("keyOne", "one"), ("keyTwo", "two"), ("other", "three")]);

        assert_eq!(c.get(&PatternString::regex("key.*")).map(PatternString::value), Some("one"));
        assert_eq!(c.get_all(&PatternString::regex("key.*")).len(), 2);
        assert!(c.get(&PatternString::literal("missing")).is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let c = container(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
        let keys: Vec<&str> = c.keys().map(PatternString::value).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_remove_first_value() {
        let mut c = container(&[("keyOne", "one"), ("keyOne", "two")]);

        assert_eq!(
            c.remove(&PatternString::literal("keyOne")).map(|p| p.value().to_string()),
            Some("one".to_string())
        );
        assert_eq!(c.entry_list().len(), 1);
        assert!(c.remove(&PatternString::literal("keyOne")).is_some());
        assert!(c.is_empty());
        assert!(c.remove(&PatternString::literal("keyOne")).is_none());
    }

    #[test]
    fn test_remove_all_matching_groups() {
        let mut c = container(&[("keyOne", "one"), ("keyTwo", "two"), ("other", "three")]);

        let removed = c.remove_all(&PatternString::regex("key.*"));
        assert_eq!(removed.len(), 2);
        assert_eq!(c.len(), 1);
        assert!(c.contains_key(&PatternString::literal("other")));
    }

    #[test]
    fn test_contains_key_value() {
        let c = container(&[("keyOne", "valueOne")]);

        assert!(c.contains_key_value(
            &PatternString::literal("keyOne"),
            &PatternString::regex("value.*")
        ));
        assert!(!c.contains_key_value(
            &PatternString::literal("keyOne"),
            &PatternString::literal("valueTwo")
        ));
    }

    #[test]
    fn test_derived_predicates() {
        let notted = container(&[("!keyOne", "one"), ("!keyTwo", "two")]);
        assert!(notted.all_keys_notted());
        assert!(!notted.all_keys_optional());

        let optional = container(&[("?keyOne", "one"), ("keyTwo", "two")]);
        assert!(optional.has_optionals());
        assert!(!optional.all_keys_optional());
        assert!(!optional.all_keys_notted());
    }

    #[test]
    fn test_optional_key_rejects_multiple_values() {
        let result = MultiValueContainer::from_entries(
            MatchContext::data_plane(),
            [("?keyOne", "one"), ("?keyOne", "two")],
        );
        assert!(matches!(
            result,
            Err(MatchingError::MultipleValuesForOptionalKey { .. })
        ));

        let result = MultiValueContainer::from_multi_values(
            MatchContext::data_plane(),
            &[KeyToMultiValue::new("?keyOne", ["one", "two"])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_values_become_empty_literal() {
        let c = MultiValueContainer::from_multi_values(
            MatchContext::data_plane(),
            &[KeyToMultiValue::new("keyOne", Vec::<&str>::new())],
        )
        .unwrap();

        assert_eq!(c.get(&PatternString::literal("keyOne")), Some(&PatternString::literal("")));
    }

    #[test]
    fn test_key_and_value_matches_is_predicate() {
        let ctx = MatchContext::data_plane();
        let clause = KeyAndValue::new("key.*", "value.*");
        let fact = KeyAndValue::new("keyOne", "valueOne");

        assert_ne!(clause, fact);
        assert!(clause.matches(&fact, &ctx));
        assert!(!fact.matches(&clause, &ctx));
    }
}
