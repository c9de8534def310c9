//! Route guard and router.

use crate::ports::{NavigationMode, Navigator, Route};
use crate::session::SessionManager;
use crate::session_fsm::SessionState;
use tokio::sync::watch;
use tracing::debug;

/// What a guarded view should do for a given session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a neutral waiting indicator; no content, no redirect.
    Pending,
    /// Leave the guarded route.
    Redirect { to: Route, mode: NavigationMode },
    /// Show the guarded content.
    Render,
}

/// Gate for protected views that follows the session as it changes.
pub struct RouteGuard {
    state_rx: watch::Receiver<SessionState>,
}

impl RouteGuard {
    pub fn new(manager: &SessionManager) -> Self {
        Self::from_receiver(manager.subscribe())
    }

    pub fn from_receiver(state_rx: watch::Receiver<SessionState>) -> Self {
        Self { state_rx }
    }

    pub fn evaluate(state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Loading => GuardDecision::Pending,
            SessionState::Unauthenticated => GuardDecision::Redirect {
                to: Route::Home,
                mode: NavigationMode::Replace,
            },
            SessionState::Authenticated(_) => GuardDecision::Render,
        }
    }

    /// Decision for the latest published state.
    pub fn decision(&self) -> GuardDecision {
        Self::evaluate(&self.state_rx.borrow())
    }

    /// Wait for the next session change and re-evaluate. Returns `None` once
    /// the session manager is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.state_rx.changed().await.ok()?;
        let decision = Self::evaluate(&self.state_rx.borrow_and_update());
        debug!(?decision, "Route guard re-evaluated");
        Some(decision)
    }

    /// Apply the current decision, navigating away when it is a redirect.
    pub fn enforce(&self, navigator: &dyn Navigator) -> GuardDecision {
        let decision = self.decision();
        if let GuardDecision::Redirect { to, mode } = decision {
            navigator.navigate(to, mode);
        }
        decision
    }
}

/// Result of routing a path for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteResolution {
    Render(Route),
    /// A protected route waiting on the initial session load.
    Pending(Route),
    Redirect { to: Route, mode: NavigationMode },
}

/// Route `path` the way the client's router does.
pub fn resolve_route(path: &str, state: &SessionState) -> RouteResolution {
    let Some(route) = Route::parse(path) else {
        return RouteResolution::Redirect {
            to: Route::Home,
            mode: NavigationMode::Replace,
        };
    };

    if route.is_protected() {
        return match RouteGuard::evaluate(state) {
            GuardDecision::Pending => RouteResolution::Pending(route),
            GuardDecision::Render => RouteResolution::Render(route),
            GuardDecision::Redirect { to, mode } => RouteResolution::Redirect { to, mode },
        };
    }

    match route {
        Route::Home if state.is_authenticated() => RouteResolution::Redirect {
            to: Route::Dashboard,
            mode: NavigationMode::Replace,
        },
        _ => RouteResolution::Render(route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credential_store::{SessionRecord, TokenSet, UserProfile};

    fn authenticated() -> SessionState {
        SessionState::Authenticated(SessionRecord::new(
            TokenSet::new("x", 3600, "bearer"),
            UserProfile::new("alice"),
        ))
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(RouteGuard::evaluate(&SessionState::Loading), GuardDecision::Pending);
        assert_eq!(RouteGuard::evaluate(&authenticated()), GuardDecision::Render);
        assert_eq!(
            RouteGuard::evaluate(&SessionState::Unauthenticated),
            GuardDecision::Redirect {
                to: Route::Home,
                mode: NavigationMode::Replace
            }
        );
    }

    #[test]
    fn test_guard_follows_receiver() {
        let (tx, rx) = watch::channel(SessionState::Loading);
        let guard = RouteGuard::from_receiver(rx);
        assert_eq!(guard.decision(), GuardDecision::Pending);

        tx.send_replace(authenticated());
        assert_eq!(guard.decision(), GuardDecision::Render);
    }

    #[test]
    fn test_protected_routes_go_through_the_guard() {
        for path in ["/dashboard", "/dashboard/settings", "/dashboard/"] {
            let route = Route::parse(path).unwrap();
            assert!(route.is_protected());
            assert_eq!(
                resolve_route(path, &SessionState::Loading),
                RouteResolution::Pending(route)
            );
        }
        assert_eq!(
            resolve_route("/callback", &SessionState::Unauthenticated),
            RouteResolution::Render(Route::Callback)
        );
    }
}
