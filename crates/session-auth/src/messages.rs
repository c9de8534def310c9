//! User-visible notification text.

pub const INITIATE_FAILED: &str = "Failed to initiate authentication. Please try again.";
pub const LOGGED_OUT: &str = "Successfully logged out";
pub const AUTHORIZATION_DENIED: &str = "Authentication was denied";
pub const NO_AUTHORIZATION_CODE: &str = "Authentication failed: No authorization code received";
pub const EXCHANGE_FAILED: &str = "Failed to complete authentication";
pub const GENERIC_FAILURE: &str = "Authentication failed. Please try again.";

/// Shown in the welcome message when the provider sent no username.
pub const FALLBACK_USERNAME: &str = "Pinterest User";

/// Personalized success message after a completed callback.
pub fn welcome(username: &str) -> String {
    let name = match username.trim() {
        "" => FALLBACK_USERNAME,
        name => name,
    };
    format!("Welcome, {}!", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_uses_username() {
        assert_eq!(welcome("bob"), "Welcome, bob!");
    }

    #[test]
    fn test_welcome_falls_back_when_blank() {
        assert_eq!(welcome(""), "Welcome, Pinterest User!");
        assert_eq!(welcome("   "), "Welcome, Pinterest User!");
    }
}
