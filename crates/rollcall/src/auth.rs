//! Single-credential admin gate.

use tracing::{debug, warn};

use crate::config::AdminConfig;
use crate::error::{Error, Result};

/// Hash a password the way `admin.password_hash` expects it.
#[must_use]
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// Check a credential against the configured admin.
///
/// # Errors
///
/// Returns [`Error::Unauthorized`] if the email is not the admin's, the
/// password does not match, or no password hash is configured.
pub fn authorize(admin: &AdminConfig, email: &str, password: &str) -> Result<()> {
    if !email.trim().eq_ignore_ascii_case(admin.email.trim()) {
        warn!(email = %email.trim(), "Admin login refused for non-admin email");
        return Err(Error::unauthorized("Only the authorized admin can log in."));
    }

    let Some(expected) = admin.password_hash.as_deref() else {
        warn!("Admin login refused, no password hash configured");
        return Err(Error::unauthorized(
            "No admin password is configured. Set admin.password_hash first.",
        ));
    };

    let expected = blake3::Hash::from_hex(expected.trim())
        .map_err(|_| Error::unauthorized("The configured admin password hash is invalid."))?;

    // blake3::Hash equality is constant-time.
    if blake3::hash(password.as_bytes()) != expected {
        warn!("Admin login refused, wrong password");
        return Err(Error::unauthorized("Invalid email or password."));
    }

    debug!("Admin authorized");
    Ok(())
}
