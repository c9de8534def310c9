//! Client session lifecycle for pinsched.
//!
//! - [`SessionManager`]: the single owner of session state (FSM-driven)
//! - [`CallbackHandler`]: one-shot processing of the OAuth redirect
//! - [`RouteGuard`] and [`resolve_route`]: gating of protected views
//!
//! Navigation and notifications go through the [`Navigator`] and
//! [`Notifier`] traits so the same core drives a browser shell or a terminal.

mod callback;
mod error;
mod guard;
mod idempotency;
pub mod messages;
mod ports;
mod session;
mod session_fsm;

pub use callback::{CallbackHandler, CallbackOutcome, CallbackParams};
pub use error::{AuthError, AuthResult};
pub use guard::{resolve_route, GuardDecision, RouteGuard, RouteResolution};
pub use ports::{
    DashboardPage, NavigationMode, Navigator, Notification, NotificationLevel, Notifier, Route,
};
pub use session::{InitiateOutcome, RefreshOutcome, SessionManager};
pub use session_fsm::{
    RefreshConfig, SessionMachine, SessionMachineInput, SessionMachineState, SessionState,
    SessionStateChangedPayload, SessionStatus,
};
