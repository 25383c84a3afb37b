use crate::config::types::IdentityError;
use crate::identity::{cohort_for_email, normalize_email, Identity, IdentityProvider};

/// Deterministic stand-in: any six-digit code verifies, cohort comes from
/// the email's roll prefix.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityProvider {
    allowed_domain: Option<String>,
}

impl MemoryIdentityProvider {
    pub fn new(allowed_domain: Option<String>) -> Self {
        Self { allowed_domain }
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn request_code(&self, email: &str) -> Result<(), IdentityError> {
        let email = normalize_email(email, self.allowed_domain.as_deref())?;
        log::info!("Verification code requested for {} (memory provider)", email);
        Ok(())
    }

    fn verify(&self, email: &str, code: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email, self.allowed_domain.as_deref())?;
        let code = code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdentityError::InvalidCode);
        }
        Ok(Identity::from_email(&email, cohort_for_email(&email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Cohort;

    #[test]
    fn test_any_six_digits_verify() {
        let provider = MemoryIdentityProvider::default();
        provider.request_code("24z368@psgtech.ac.in").unwrap();
        let identity = provider.verify("24Z368@psgtech.ac.in", "123456").unwrap();
        assert_eq!(identity.cohort, Cohort::CohortB);
        assert_eq!(identity.email, "24z368@psgtech.ac.in");
    }

    #[test]
    fn test_bad_codes_rejected() {
        let provider = MemoryIdentityProvider::default();
        for code in ["12345", "1234567", "12a456", ""] {
            assert_eq!(
                provider.verify("23z001@psgtech.ac.in", code),
                Err(IdentityError::InvalidCode)
            );
        }
    }

    #[test]
    fn test_identity_is_stable() {
        let provider = MemoryIdentityProvider::default();
        let a = provider.verify("23z001@psgtech.ac.in", "000000").unwrap();
        let b = provider.verify(" 23Z001@psgtech.ac.in", "999999").unwrap();
        assert_eq!(a.participant_id, b.participant_id);
    }
}
