//! Collaborators the session layer drives but does not implement:
//! page navigation and user-visible notifications.

use std::fmt;
use std::time::Duration;
use url::Url;

const SUCCESS_DURATION: Duration = Duration::from_millis(5000);
const ERROR_DURATION: Duration = Duration::from_millis(6000);

/// Pages under the dashboard that share its guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardPage {
    Scheduled,
    Settings,
}

impl DashboardPage {
    fn segment(&self) -> &'static str {
        match self {
            DashboardPage::Scheduled => "scheduled",
            DashboardPage::Settings => "settings",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "scheduled" => Some(DashboardPage::Scheduled),
            "settings" => Some(DashboardPage::Settings),
            _ => None,
        }
    }
}

/// In-app navigation destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Public landing page (`/`).
    Home,
    /// OAuth redirect target (`/callback`).
    Callback,
    /// Protected dashboard (`/dashboard`).
    Dashboard,
    /// Protected dashboard sub-page (`/dashboard/<page>`).
    DashboardPage(DashboardPage),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Callback => "/callback".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::DashboardPage(page) => format!("/dashboard/{}", page.segment()),
        }
    }

    /// Parse a path; query string and fragment are ignored, a trailing slash
    /// is tolerated. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Some(Route::Home),
            "/callback" => Some(Route::Callback),
            "/dashboard" => Some(Route::Dashboard),
            other => other
                .strip_prefix("/dashboard/")
                .and_then(DashboardPage::from_segment)
                .map(Route::DashboardPage),
        }
    }

    /// Whether the route is behind the route guard.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::DashboardPage(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// How a navigation affects history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Push,
    /// Replace the current entry so "back" cannot return to it.
    Replace,
}

/// Performs page navigation.
pub trait Navigator: Send + Sync {
    /// In-app navigation.
    fn navigate(&self, route: Route, mode: NavigationMode);

    /// Full-page navigation away from the app (the provider's authorization page).
    fn redirect_external(&self, url: &Url);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            duration: SUCCESS_DURATION,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            duration: ERROR_DURATION,
        }
    }
}

/// Displays notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths_roundtrip() {
        for route in [
            Route::Home,
            Route::Callback,
            Route::Dashboard,
            Route::DashboardPage(DashboardPage::Scheduled),
            Route::DashboardPage(DashboardPage::Settings),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn test_route_parse_tolerates_query_and_trailing_slash() {
        assert_eq!(Route::parse("/callback?code=abc"), Some(Route::Callback));
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/#top"), Some(Route::Home));
        assert_eq!(Route::parse(""), Some(Route::Home));
    }

    #[test]
    fn test_route_parse_unknown() {
        assert_eq!(Route::parse("/nope"), None);
        assert_eq!(Route::parse("/dashboard/billing"), None);
        assert_eq!(Route::parse("/dashboard/settings/extra"), None);
    }

    #[test]
    fn test_protected_routes() {
        assert!(Route::Dashboard.is_protected());
        assert!(Route::DashboardPage(DashboardPage::Settings).is_protected());
        assert!(!Route::Home.is_protected());
        assert!(!Route::Callback.is_protected());
    }

    #[test]
    fn test_notification_durations() {
        assert_eq!(Notification::success("ok").duration, Duration::from_secs(5));
        assert_eq!(Notification::error("no").duration, Duration::from_secs(6));
        assert_eq!(Notification::error("no").level, NotificationLevel::Error);
    }
}
