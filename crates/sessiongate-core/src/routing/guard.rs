//! The authentication guard for protected views.

use serde_json::Value;

use super::LOGIN_PATH;
use super::request::{Location, Props, RouteRequest};
use crate::state::SessionState;

/// The outcome of evaluating a route.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<V> {
    /// Render `view` with `props`.
    Render { view: V, props: Props },
    /// Navigate to `to` instead. `from` is the location the user asked for,
    /// kept so the login flow can send them back.
    Redirect { to: String, from: Option<Location> },
}

impl<V> Decision<V> {
    /// Returns true for [`Decision::Render`].
    pub fn is_render(&self) -> bool {
        matches!(self, Decision::Render { .. })
    }

    /// Maps the rendered view, leaving redirects untouched.
    pub fn map_view<W>(self, f: impl FnOnce(V) -> W) -> Decision<W> {
        match self {
            Decision::Render { view, props } => Decision::Render {
                view: f(view),
                props,
            },
            Decision::Redirect { to, from } => Decision::Redirect { to, from },
        }
    }
}

/// Render `view` only if `state` holds a token, otherwise redirect to the
/// login path carrying the requested location.
///
/// Pure: the same request and state always produce the same decision.
pub fn guard<V>(view: V, request: &RouteRequest, state: &SessionState) -> Decision<V> {
    if state.is_authenticated() {
        Decision::Render {
            view,
            props: render_props(request),
        }
    } else {
        Decision::Redirect {
            to: LOGIN_PATH.to_string(),
            from: Some(request.location()),
        }
    }
}

/// The request's own props, overlaid with routing metadata.
pub(crate) fn render_props(request: &RouteRequest) -> Props {
    let mut props = request.props.clone();
    props.insert("location".to_string(), location_value(&request.location()));
    if let Some(from) = &request.redirected_from {
        props.insert("from".to_string(), location_value(from));
    }
    props
}

fn location_value(location: &Location) -> Value {
    serde_json::json!({ "pathname": location.pathname })
}
