//! Matching configuration.
//!
//! Loaded from YAML (JSON is accepted too, being a YAML subset):
//!
//! ```yaml
//! controlPlane: false
//! failFast: true
//! detailedMatchFailures: true
//! correlationIdHeader: X-Request-Id
//! groupStyles:
//!   headers: SUB_SET
//!   pathParameters: MATCHING_KEY
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeGroup;
use crate::context::KeyMatchStyle;
use crate::error::MatchingError;

fn default_fail_fast() -> bool {
    true
}

fn default_path_parameters_style() -> KeyMatchStyle {
    KeyMatchStyle::MatchingKey
}

/// Containment style per attribute group, used unless the expectation
/// sets its own `keyMatchStyle` for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupStyles {
    #[serde(default)]
    pub headers: KeyMatchStyle,
    #[serde(default)]
    pub cookies: KeyMatchStyle,
    #[serde(default)]
    pub query_string_parameters: KeyMatchStyle,
    #[serde(default = "default_path_parameters_style")]
    pub path_parameters: KeyMatchStyle,
}

impl Default for GroupStyles {
    fn default() -> Self {
        Self {
            headers: KeyMatchStyle::SubSet,
            cookies: KeyMatchStyle::SubSet,
            query_string_parameters: KeyMatchStyle::SubSet,
            path_parameters: default_path_parameters_style(),
        }
    }
}

impl GroupStyles {
    pub fn style_for(&self, group: AttributeGroup) -> KeyMatchStyle {
        match group {
            AttributeGroup::Headers => self.headers,
            AttributeGroup::Cookies => self.cookies,
            AttributeGroup::QueryStringParameters => self.query_string_parameters,
            AttributeGroup::PathParameters => self.path_parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchingConfig {
    /// Compare expectation definitions with each other rather than
    /// matching live traffic.
    #[serde(default)]
    pub control_plane: bool,
    #[serde(default)]
    pub group_styles: GroupStyles,
    /// Stop at the first attribute group that does not match.
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
    /// Include the reasons of failed groups in reports.
    #[serde(default)]
    pub detailed_match_failures: bool,
    /// Request header whose value tags match events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id_header: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            control_plane: false,
            group_styles: GroupStyles::default(),
            fail_fast: default_fail_fast(),
            detailed_match_failures: false,
            correlation_id_header: None,
        }
    }
}

impl MatchingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MatchingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, anyhow::Error> {
        let config: MatchingConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(header) = &self.correlation_id_header {
            if header.trim().is_empty() {
                anyhow::bail!("correlationIdHeader must not be empty");
            }
            if header.starts_with(['!', '?']) {
                anyhow::bail!(
                    "correlationIdHeader '{header}' must be a plain header name, not a negated or optional key"
                );
            }
            if !header
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
            {
                anyhow::bail!("correlationIdHeader '{header}' is not a valid header name");
            }
        }
        Ok(())
    }
}
