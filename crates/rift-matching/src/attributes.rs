//! Attribute-group matching for a whole request.
//!
//! An expectation configures up to four multi-valued groups (headers,
//! cookies, query string parameters, path parameters). Each group is checked
//! with [`contains_all`](crate::subset::contains_all) and the verdicts are
//! ANDed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::container::MultiValueContainer;
use crate::context::{KeyMatchStyle, MatchContext};
use crate::error::MatchingError;
use crate::model::{KeyToMultiValue, KeysToMultiValues};
use crate::observer::{MatchEvent, MatchObserver, RecordingObserver, TracingObserver};
use crate::pattern::PatternString;
use crate::subset::contains_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeGroup {
    Headers,
    Cookies,
    QueryStringParameters,
    PathParameters,
}

impl AttributeGroup {
    pub const ALL: [AttributeGroup; 4] = [
        AttributeGroup::Headers,
        AttributeGroup::Cookies,
        AttributeGroup::QueryStringParameters,
        AttributeGroup::PathParameters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeGroup::Headers => "headers",
            AttributeGroup::Cookies => "cookies",
            AttributeGroup::QueryStringParameters => "queryStringParameters",
            AttributeGroup::PathParameters => "pathParameters",
        }
    }
}

impl fmt::Display for AttributeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The multi-valued attribute groups of a request or an expectation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAttributes {
    #[serde(default, skip_serializing_if = "KeysToMultiValues::is_empty")]
    pub headers: KeysToMultiValues,
    #[serde(default, skip_serializing_if = "KeysToMultiValues::is_empty")]
    pub cookies: KeysToMultiValues,
    #[serde(default, skip_serializing_if = "KeysToMultiValues::is_empty")]
    pub query_string_parameters: KeysToMultiValues,
    #[serde(default, skip_serializing_if = "KeysToMultiValues::is_empty")]
    pub path_parameters: KeysToMultiValues,
}

impl RequestAttributes {
    pub fn group(&self, group: AttributeGroup) -> &KeysToMultiValues {
        match group {
            AttributeGroup::Headers => &self.headers,
            AttributeGroup::Cookies => &self.cookies,
            AttributeGroup::QueryStringParameters => &self.query_string_parameters,
            AttributeGroup::PathParameters => &self.path_parameters,
        }
    }

    /// First value of the first header named `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .entries
            .iter()
            .find(|entry| entry.name.raw_text().eq_ignore_ascii_case(name))
            .and_then(|entry| entry.values.first())
            .map(|value| value.raw_text().into_owned())
    }
}

/// Live request data is never a pattern: `!x` is the text `!x`, kept exactly
/// as the client sent it.
fn as_plain_text(entries: &[KeyToMultiValue]) -> Vec<KeyToMultiValue> {
    entries
        .iter()
        .map(|entry| KeyToMultiValue {
            name: PatternString::literal(entry.name.raw_text()),
            values: entry
                .values
                .iter()
                .map(|value| PatternString::literal(value.raw_text()))
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct GroupMatcher {
    group: AttributeGroup,
    style: KeyMatchStyle,
    container: MultiValueContainer,
}

/// Per-group verdict of a match evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub group: AttributeGroup,
    pub style: KeyMatchStyle,
    pub matched: bool,
    /// Failure events raised while evaluating the group.
    pub reasons: Vec<MatchEvent>,
}

/// Result of evaluating every configured group against one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub groups: Vec<GroupReport>,
}

impl MatchReport {
    pub fn matched(&self) -> bool {
        self.groups.iter().all(|g| g.matched)
    }

    pub fn group(&self, group: AttributeGroup) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == group)
    }

    pub fn failures(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter(|g| !g.matched)
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.groups {
            if report.matched {
                writeln!(f, "{} matched ({})", report.group, report.style)?;
            } else {
                writeln!(f, "{} didn't match ({})", report.group, report.style)?;
                for reason in &report.reasons {
                    writeln!(f, "  {reason}")?;
                }
            }
        }
        Ok(())
    }
}

/// The attribute-group matchers of one expectation.
///
/// Groups the expectation leaves empty are not evaluated.
#[derive(Clone)]
pub struct AttributesMatcher {
    groups: Vec<GroupMatcher>,
    config: MatchingConfig,
    observer: Arc<dyn MatchObserver>,
}

impl AttributesMatcher {
    pub fn new(
        expectation: &RequestAttributes,
        config: MatchingConfig,
    ) -> Result<Self, MatchingError> {
        let mut groups = Vec::new();
        for group in AttributeGroup::ALL {
            let attributes = expectation.group(group);
            if attributes.is_empty() {
                continue;
            }
            let style = attributes
                .key_match_style
                .unwrap_or_else(|| config.group_styles.style_for(group));
            let ctx = MatchContext::new(config.control_plane, style);
            let container = MultiValueContainer::from_multi_values(ctx, &attributes.entries)?;
            groups.push(GroupMatcher {
                group,
                style,
                container,
            });
        }
        Ok(Self {
            groups,
            config,
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Configured groups in evaluation order.
    pub fn groups(&self) -> impl Iterator<Item = (AttributeGroup, KeyMatchStyle)> + '_ {
        self.groups.iter().map(|g| (g.group, g.style))
    }

    fn context(
        &self,
        matcher: &GroupMatcher,
        observer: Arc<dyn MatchObserver>,
        correlation_id: Option<&str>,
    ) -> MatchContext {
        let ctx =
            MatchContext::new(self.config.control_plane, matcher.style).with_observer(observer);
        match correlation_id {
            Some(id) => ctx.with_correlation_id(id),
            None => ctx,
        }
    }

    fn correlation_id(&self, request: &RequestAttributes) -> Option<String> {
        self.config
            .correlation_id_header
            .as_deref()
            .and_then(|header| request.header(header))
    }

    fn matched_container(
        &self,
        request: &RequestAttributes,
        matcher: &GroupMatcher,
        ctx: &MatchContext,
    ) -> Result<MultiValueContainer, MatchingError> {
        let entries = &request.group(matcher.group).entries;
        if ctx.control_plane {
            MultiValueContainer::from_multi_values(ctx.clone(), entries)
        } else {
            MultiValueContainer::from_multi_values(ctx.clone(), &as_plain_text(entries))
        }
    }

    fn evaluate(
        &self,
        matcher: &GroupMatcher,
        request: &RequestAttributes,
        ctx: &MatchContext,
    ) -> bool {
        let verdict = match self.matched_container(request, matcher, ctx) {
            Ok(matched) => contains_all(Some(&matcher.container), Some(&matched), ctx),
            Err(e) => {
                ctx.emit(MatchEvent::MalformedGroup {
                    group: matcher.group.as_str(),
                    error: e.to_string(),
                });
                false
            }
        };
        ctx.emit(MatchEvent::GroupVerdict {
            group: matcher.group.as_str(),
            matched: verdict,
        });
        verdict
    }

    /// Whether every configured group is satisfied by `request`.
    pub fn matches(&self, request: &RequestAttributes) -> bool {
        let correlation_id = self.correlation_id(request);
        let mut all = true;
        for matcher in &self.groups {
            let ctx = self.context(matcher, self.observer.clone(), correlation_id.as_deref());
            if !self.evaluate(matcher, request, &ctx) {
                all = false;
                if self.config.fail_fast {
                    break;
                }
            }
        }
        all
    }

    /// Evaluate every configured group and collect per-group verdicts.
    ///
    /// Failure reasons are collected when `detailedMatchFailures` is set.
    pub fn matches_with_report(&self, request: &RequestAttributes) -> MatchReport {
        let correlation_id = self.correlation_id(request);
        let mut report = MatchReport::default();
        for matcher in &self.groups {
            let recorder = Arc::new(RecordingObserver::new());
            let ctx = self.context(matcher, recorder.clone(), correlation_id.as_deref());
            let matched = self.evaluate(matcher, request, &ctx);

            let events = recorder.take();
            for event in &events {
                self.observer.on_event(correlation_id.as_deref(), event);
            }
            let reasons = if self.config.detailed_match_failures && !matched {
                events
                    .into_iter()
                    .filter(|e| e.is_failure() && !matches!(e, MatchEvent::GroupVerdict { .. }))
                    .collect()
            } else {
                Vec::new()
            };
            report.groups.push(GroupReport {
                group: matcher.group,
                style: matcher.style,
                matched,
                reasons,
            });
        }
        report
    }
}

impl fmt::Debug for AttributesMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributesMatcher")
            .field("groups", &self.groups)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
