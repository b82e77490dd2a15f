//! Operator identity precondition.

use std::process::Command;

use crate::error::IdentityError;

/// Source of the current user name.
pub trait IdentityProvider {
    fn current_user(&self) -> Result<String, IdentityError>;
}

/// Asks the system via `id -un`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityProvider for SystemIdentity {
    fn current_user(&self) -> Result<String, IdentityError> {
        let output = Command::new("id")
            .arg("-un")
            .output()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IdentityError::Unavailable(stderr.trim().to_string()));
        }
        let user = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if user.is_empty() {
            return Err(IdentityError::Unavailable("id -un printed nothing".into()));
        }
        Ok(user)
    }
}

/// Always reports the same user.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}

/// Fail unless the current user is `operator`.
pub fn ensure_operator(
    provider: &dyn IdentityProvider,
    operator: &str,
) -> Result<(), IdentityError> {
    let actual = provider.current_user()?;
    if actual != operator {
        return Err(IdentityError::Mismatch {
            expected: operator.to_string(),
            actual,
        });
    }
    Ok(())
}
