//! Participant identity.
//!
//! Authentication is an injected collaborator. The rest of the crate only
//! consumes the verified `Identity` (participant id and cohort) and never
//! re-validates it.

pub mod memory;
pub mod remote;

use crate::config::config::{IdentityConfig, IdentityMode};
use crate::config::types::{Cohort, IdentityError, ParticipantId};
use serde::{Deserialize, Serialize};

pub use memory::MemoryIdentityProvider;
pub use remote::RemoteIdentityProvider;

/// Verified participant identity. Cohort is fixed for the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub participant_id: ParticipantId,
    pub email: String,
    pub cohort: Cohort,
}

impl Identity {
    pub fn from_email(email: &str, cohort: Cohort) -> Self {
        Self {
            participant_id: ParticipantId::from_verified_email(email),
            email: email.to_string(),
            cohort,
        }
    }
}

/// Two-step email verification
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ask the provider to send a one-time code to `email`
    fn request_code(&self, email: &str) -> Result<(), IdentityError>;

    /// Exchange the code for a verified identity
    fn verify(&self, email: &str, code: &str) -> Result<Identity, IdentityError>;
}

/// Trim and lowercase, then check the `local@domain` shape and the
/// optional domain restriction.
pub fn normalize_email(email: &str, allowed_domain: Option<&str>) -> Result<String, IdentityError> {
    let email = email.trim().to_ascii_lowercase();
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| IdentityError::InvalidEmail(email.clone()))?;

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'));
    if !local_ok || !domain_ok {
        return Err(IdentityError::InvalidEmail(email));
    }

    if let Some(allowed) = allowed_domain {
        if !domain.eq_ignore_ascii_case(allowed.trim()) {
            return Err(IdentityError::Rejected(format!(
                "sign-in is limited to @{} addresses",
                allowed.trim()
            )));
        }
    }
    Ok(email)
}

/// Entry-year heuristic: a two-digit roll prefix of 24 or later is the
/// second-year cohort, anything else the first-year cohort.
pub fn cohort_for_email(email: &str) -> Cohort {
    let prefix: String = email.trim().chars().take(2).collect();
    let year = if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix.parse::<u32>().ok()
    } else {
        None
    };
    match year {
        Some(y) if y >= 24 => Cohort::CohortB,
        _ => Cohort::CohortA,
    }
}

pub fn provider_from_config(config: &IdentityConfig) -> Box<dyn IdentityProvider> {
    match config.mode {
        IdentityMode::Memory => Box::new(MemoryIdentityProvider::new(config.allowed_domain.clone())),
        IdentityMode::Remote => Box::new(RemoteIdentityProvider::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohort_from_roll_prefix() {
        assert_eq!(cohort_for_email("24z368@psgtech.ac.in"), Cohort::CohortB);
        assert_eq!(cohort_for_email("25z001@psgtech.ac.in"), Cohort::CohortB);
        assert_eq!(cohort_for_email("23z368@psgtech.ac.in"), Cohort::CohortA);
        assert_eq!(cohort_for_email("z368@psgtech.ac.in"), Cohort::CohortA);
        assert_eq!(cohort_for_email("2z@x.io"), Cohort::CohortA);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  24Z368@PSGTech.ac.in ", None).unwrap(),
            "24z368@psgtech.ac.in"
        );
        assert!(matches!(
            normalize_email("not-an-email", None),
            Err(IdentityError::InvalidEmail(_))
        ));
        assert!(normalize_email("a b@x.io", None).is_err());
        assert!(normalize_email("ab@localhost", None).is_err());
    }

    #[test]
    fn test_domain_restriction() {
        assert!(normalize_email("24z368@psgtech.ac.in", Some("psgtech.ac.in")).is_ok());
        assert!(matches!(
            normalize_email("24z368@gmail.com", Some("psgtech.ac.in")),
            Err(IdentityError::Rejected(_))
        ));
    }
}
