pub mod matcher;
pub mod scopes;

pub use matcher::{UrlMatcher, UrlSpan, URL_PATTERN};
pub use scopes::{group_by_scope, marker_key, scopes_to_remove, MARKER_NAMESPACE};
