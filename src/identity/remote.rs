use crate::config::config::IdentityConfig;
use crate::config::types::{Cohort, IdentityError};
use crate::identity::{cohort_for_email, normalize_email, Identity, IdentityProvider};
use serde::Deserialize;
use serde_json::json;

/// Network-backed auth service (`/auth/check-email`, `/auth/verify-otp`)
pub struct RemoteIdentityProvider {
    agent: ureq::Agent,
    base_url: String,
    allowed_domain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    token: Option<String>,
    user: Option<RemoteUser>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    #[serde(default)]
    year: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl RemoteIdentityProvider {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(config.timeout()).build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            allowed_domain: config.allowed_domain.clone(),
        }
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<String, (u16, String)> {
        let url = format!("{}{}", self.base_url, path);
        match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(response) => response.into_string().map_err(|e| (0, e.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                let message = serde_json::from_str::<ErrorBody>(&text)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| format!("Request failed ({})", status));
                Err((status, message))
            }
            Err(ureq::Error::Transport(transport)) => Err((0, transport.to_string())),
        }
    }
}

fn failure(status: u16, message: String) -> IdentityError {
    if status == 0 || status >= 500 {
        IdentityError::Unavailable(message)
    } else {
        IdentityError::Rejected(message)
    }
}

impl IdentityProvider for RemoteIdentityProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn request_code(&self, email: &str) -> Result<(), IdentityError> {
        let email = normalize_email(email, self.allowed_domain.as_deref())?;
        self.post("/auth/check-email", json!({ "email": email }))
            .map_err(|(status, message)| failure(status, message))?;
        log::info!("Verification code sent to {}", email);
        Ok(())
    }

    fn verify(&self, email: &str, code: &str) -> Result<Identity, IdentityError> {
        let email = normalize_email(email, self.allowed_domain.as_deref())?;
        let text = self
            .post("/auth/verify-otp", json!({ "email": email, "otp": code.trim() }))
            .map_err(|(status, message)| match status {
                400 | 401 | 403 => IdentityError::InvalidCode,
                _ => failure(status, message),
            })?;

        let response: VerifyResponse = serde_json::from_str(&text)
            .map_err(|e| IdentityError::Unavailable(format!("invalid response from server: {}", e)))?;
        let user = match (response.token, response.user) {
            (Some(_), Some(user)) => user,
            _ => {
                return Err(IdentityError::Unavailable(
                    "invalid response from server".to_string(),
                ))
            }
        };

        let cohort = user
            .year
            .and_then(Cohort::from_year)
            .unwrap_or_else(|| cohort_for_email(&email));
        Ok(Identity::from_email(&email, cohort))
    }
}
