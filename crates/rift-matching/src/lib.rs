//! Rift expectation-matching engine.
//!
//! Decides whether a request's headers, cookies, query string parameters and
//! path parameters satisfy the matchers configured on an expectation.
//!
//! # Module Structure
//!
//! - [`pattern`]: pattern strings (literal, regex, JSON schema) with `not` /
//!   `optional` flags
//! - [`matcher`]: pattern evaluation in data-plane and control-plane mode
//! - [`container`]: ordered multi-value containers of pattern keys and values
//! - [`subset`]: `SUB_SET` and `MATCHING_KEY` containment
//! - [`list_equality`]: one-to-one list comparison for positional attributes
//! - [`attributes`]: whole-request matching across attribute groups
//! - [`shared`]: copy-on-write publication of matcher state
//! - [`observer`]: match events and their sinks
//!
//! # Example
//!
//! ```
//! use rift_matching::{contains_subset, KeyAndValue, MatchContext};
//!
//! let matcher = vec![KeyAndValue::new("key.*", "valueOne")];
//! let request = vec![KeyAndValue::new("keyOne", "valueOne")];
//!
//! let ctx = MatchContext::data_plane();
//! assert!(contains_subset(&matcher, &request, &ctx));
//! assert!(!contains_subset(&request, &matcher, &ctx));
//! ```

pub mod attributes;
pub mod config;
pub mod container;
pub mod context;
pub mod error;
pub mod list_equality;
pub mod matcher;
pub mod model;
pub mod observer;
pub mod pattern;
pub mod shared;
pub mod subset;

mod schema;

pub use attributes::{
    AttributeGroup, AttributesMatcher, GroupReport, MatchReport, RequestAttributes,
};
pub use config::{GroupStyles, MatchingConfig};
pub use container::{KeyAndValue, MultiValueContainer};
pub use context::{KeyMatchStyle, MatchContext};
pub use error::MatchingError;
pub use list_equality::{lists_equal, lists_equal_with_optionals};
pub use matcher::{accepts, accepts_key};
pub use model::{KeyToMultiValue, KeysToMultiValues};
pub use observer::{
    MatchEvent, MatchObserver, RecordingObserver, SilentObserver, TracingObserver,
};
pub use pattern::{CachedValue, PatternKind, PatternString};
pub use shared::{SharedAttributes, SharedContainer, SharedSnapshot};
pub use subset::{contains_all, contains_matching_key, contains_subset};
