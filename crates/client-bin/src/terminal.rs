//! Terminal implementations of the session layer's navigation and
//! notification ports.

use crate::output::{self, OutputFormat};
use session_auth::{NavigationMode, Navigator, Notification, NotificationLevel, Notifier, Route};
use tracing::{debug, warn};
use url::Url;

/// Prints notifications the way the CLI prints any other result.
pub struct TerminalNotifier {
    format: OutputFormat,
}

impl TerminalNotifier {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => output::print_success(&notification.message, self.format),
            NotificationLevel::Error => output::print_error(&notification.message, self.format),
        }
    }
}

/// Reports in-app navigation and sends external redirects to the browser.
pub struct TerminalNavigator {
    format: OutputFormat,
    open_browser: bool,
}

impl TerminalNavigator {
    pub fn new(format: OutputFormat, open_browser: bool) -> Self {
        Self {
            format,
            open_browser,
        }
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route, mode: NavigationMode) {
        debug!(route = %route, ?mode, "Navigating");
        if self.format == OutputFormat::Text {
            println!("-> {}", route);
        }
    }

    fn redirect_external(&self, url: &Url) {
        match self.format {
            OutputFormat::Text => {
                println!("Open this URL to authorize pinsched:");
                println!();
                println!("  {}", url);
                println!();
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "authorization_url": url.as_str() }));
            }
        }

        if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                warn!(error = %e, "Failed to open browser");
            }
        }
    }
}
