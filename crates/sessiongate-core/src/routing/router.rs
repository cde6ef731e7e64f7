//! The client's route table.

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use super::guard::{Decision, guard, render_props};
use super::request::{Location, Props, RouteRequest};
use super::{DASHBOARD_PATH, LOGIN_PATH};
use crate::state::SessionState;

/// The views the client can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// The login form.
    Login,
    /// The protected dashboard.
    Dashboard,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Login => f.write_str("login"),
            View::Dashboard => f.write_str("dashboard"),
        }
    }
}

/// One redirect taken while settling a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub from: Location,
    pub to: Location,
}

/// The settled result of a navigation: the view that renders and how we got
/// there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    pub view: View,
    pub location: Location,
    pub props: Props,
    pub redirects: Vec<Hop>,
}

/// Route table:
///
/// - `/login` renders the login form, or redirects to `/dashboard` when
///   already signed in
/// - `/dashboard` (and anything below it) is guarded
/// - everything else redirects to `/dashboard`
#[derive(Debug, Clone, Copy, Default)]
pub struct Router;

impl Router {
    /// Evaluate a single request without following redirects.
    pub fn resolve(&self, request: &RouteRequest, state: &SessionState) -> Decision<View> {
        if matches_route(LOGIN_PATH, &request.path) {
            if state.is_authenticated() {
                Decision::Redirect {
                    to: DASHBOARD_PATH.to_string(),
                    from: None,
                }
            } else {
                Decision::Render {
                    view: View::Login,
                    props: render_props(request),
                }
            }
        } else if matches_route(DASHBOARD_PATH, &request.path) {
            guard((), request, state).map_view(|()| View::Dashboard)
        } else {
            Decision::Redirect {
                to: DASHBOARD_PATH.to_string(),
                from: None,
            }
        }
    }

    /// Evaluate a request and follow redirects until a view renders.
    ///
    /// A location preserved by a redirect travels with the follow-up request
    /// and shows up as the `from` prop of the rendered view.
    #[instrument(skip(self, request, state), fields(path = %request.path))]
    pub fn navigate(&self, request: &RouteRequest, state: &SessionState) -> Navigation {
        let mut request = request.clone();
        let mut redirects = Vec::new();

        // The table above settles after at most two redirects.
        loop {
            match self.resolve(&request, state) {
                Decision::Render { view, props } => {
                    debug!(%view, hops = redirects.len(), "navigation settled");
                    return Navigation {
                        view,
                        location: request.location(),
                        props,
                        redirects,
                    };
                }
                Decision::Redirect { to, from } => {
                    let next = RouteRequest {
                        path: to,
                        props: request.props.clone(),
                        redirected_from: from.or(request.redirected_from.take()),
                    };
                    debug!(from = %request.path, to = %next.path, "redirect");
                    redirects.push(Hop {
                        from: request.location(),
                        to: next.location(),
                    });
                    request = next;
                }
            }
        }
    }
}

fn matches_route(pattern: &str, path: &str) -> bool {
    path.strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
