//! Resolve an app path against the current session.

use crate::app::AppState;
use crate::output;
use serde::Serialize;
use session_auth::{resolve_route, Navigator, RouteResolution};
use std::fmt;

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum RouteView {
    Render { route: String },
    Pending { route: String },
    Redirect { to: String, replace: bool },
}

impl From<RouteResolution> for RouteView {
    fn from(resolution: RouteResolution) -> Self {
        match resolution {
            RouteResolution::Render(route) => RouteView::Render {
                route: route.path(),
            },
            RouteResolution::Pending(route) => RouteView::Pending {
                route: route.path(),
            },
            RouteResolution::Redirect { to, mode } => RouteView::Redirect {
                to: to.path(),
                replace: mode == session_auth::NavigationMode::Replace,
            },
        }
    }
}

impl fmt::Display for RouteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteView::Render { route } => write!(f, "Rendering {}", route),
            RouteView::Pending { route } => write!(f, "Waiting for session before rendering {}", route),
            RouteView::Redirect { to, .. } => write!(f, "Redirecting to {}", to),
        }
    }
}

pub async fn route(state: &AppState, path: &str) -> anyhow::Result<()> {
    let resolution = resolve_route(path, &state.manager.state());
    output::print(&RouteView::from(resolution), state.format);

    if let RouteResolution::Redirect { to, mode } = resolution {
        state.navigator.navigate(to, mode);
    }
    Ok(())
}
