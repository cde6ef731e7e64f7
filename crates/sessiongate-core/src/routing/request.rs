//! Navigation requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arbitrary props travelling with a navigation request.
pub type Props = serde_json::Map<String, Value>;

/// A location in the client, as preserved across a login redirect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
}

impl Location {
    /// Create a location from a path, normalizing it.
    pub fn new(path: &str) -> Self {
        Self {
            pathname: normalize(path),
        }
    }

    /// Returns the path.
    pub fn as_str(&self) -> &str {
        &self.pathname
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pathname)
    }
}

/// One navigation attempt: a path plus the props the caller wants rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub path: String,
    pub props: Props,
    /// Where the user was headed before being sent here.
    pub redirected_from: Option<Location>,
}

impl RouteRequest {
    /// A request for `path` with no props.
    ///
    /// The path is reduced to its pathname: a leading `/` is added if missing,
    /// query and fragment are dropped, and a trailing `/` is removed.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize(path),
            props: Props::new(),
            redirected_from: None,
        }
    }

    /// Attach a prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Returns the location this request points at.
    pub fn location(&self) -> Location {
        Location {
            pathname: self.path.clone(),
        }
    }
}

fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
