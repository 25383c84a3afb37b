/// Network-backed execution service
///
/// Posts JSON to `<base_url><route>` with a blocking agent bounded by the
/// configured timeout, and folds transport and status failures into
/// `DispatchError`.
use crate::config::config::JudgeServiceConfig;
use crate::config::types::{DispatchError, Language};
use crate::judge::adapter::{ExecutionService, JudgeRequest, JudgeResponse};
use std::collections::HashMap;
use std::io;
use std::time::Duration;

pub struct HttpExecutionService {
    agent: ureq::Agent,
    base_url: String,
    routes: HashMap<Language, String>,
    timeout: Duration,
}

impl HttpExecutionService {
    pub fn from_config(config: &JudgeServiceConfig) -> Self {
        let timeout = config.timeout();
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            routes: config.routes.clone(),
            timeout,
        }
    }

    fn url_for(&self, language: Language) -> Result<String, DispatchError> {
        let route = self.routes.get(&language).ok_or_else(|| {
            DispatchError::ServiceUnavailable(format!("no route configured for {}", language))
        })?;
        Ok(format!("{}{}", self.base_url, route))
    }

    fn transport_error(&self, transport: ureq::Transport) -> DispatchError {
        let timed_out = std::error::Error::source(&transport)
            .and_then(|source| source.downcast_ref::<io::Error>())
            .map(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
            .unwrap_or(false);

        if timed_out {
            DispatchError::Timeout(self.timeout)
        } else {
            DispatchError::ServiceUnavailable(transport.to_string())
        }
    }
}

/// Map a non-2xx status and its (possibly undecodable) body
pub fn status_error(status: u16, body: Option<&JudgeResponse>, timeout: Duration) -> DispatchError {
    if status == 408 || status == 504 {
        return DispatchError::Timeout(timeout);
    }

    if let Some(message) = body.and_then(|b| b.compiler_message.as_deref()) {
        return DispatchError::CompileError(message.to_string());
    }

    let diagnostic = body.and_then(JudgeResponse::diagnostic);
    match diagnostic {
        Some(d) if status < 500 => DispatchError::RuntimeError(d.to_string()),
        Some(d) => DispatchError::ServiceUnavailable(format!("HTTP {}: {}", status, d)),
        None => DispatchError::ServiceUnavailable(format!("HTTP {} without diagnostic", status)),
    }
}

impl ExecutionService for HttpExecutionService {
    fn name(&self) -> &'static str {
        "http"
    }

    fn execute(
        &self,
        language: Language,
        request: &JudgeRequest,
    ) -> Result<JudgeResponse, DispatchError> {
        let url = self.url_for(language)?;
        let body = serde_json::to_string(request)
            .map_err(|e| DispatchError::ServiceUnavailable(format!("encode request: {}", e)))?;

        log::debug!(
            "POST {} submission={} cases={}",
            url,
            request.submission_id,
            request.test_cases.len()
        );

        match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(response) => {
                let text = response.into_string().map_err(|e| {
                    DispatchError::ServiceUnavailable(format!("read response body: {}", e))
                })?;
                serde_json::from_str(&text).map_err(|e| {
                    DispatchError::ServiceUnavailable(format!("malformed response: {}", e))
                })
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                let parsed = serde_json::from_str::<JudgeResponse>(&text).ok();
                let err = status_error(status, parsed.as_ref(), self.timeout);
                log::warn!(
                    "Execution service answered HTTP {} for {}: {}",
                    status,
                    request.submission_id,
                    err
                );
                Err(err)
            }
            Err(ureq::Error::Transport(transport)) => Err(self.transport_error(transport)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> JudgeResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_gateway_timeout_maps_to_timeout() {
        let timeout = Duration::from_secs(3);
        assert_eq!(status_error(504, None, timeout), DispatchError::Timeout(timeout));
        assert_eq!(status_error(408, None, timeout), DispatchError::Timeout(timeout));
    }

    #[test]
    fn test_compiler_message_wins() {
        let err = status_error(
            500,
            Some(&body(r#"{ "compilerMessage": "expected ';'", "error": "Compilation failed" }"#)),
            Duration::from_secs(1),
        );
        assert_eq!(err, DispatchError::CompileError("expected ';'".to_string()));
    }

    #[test]
    fn test_client_error_with_details_is_runtime_error() {
        let err = status_error(
            400,
            Some(&body(r#"{ "details": "Traceback: IndexError" }"#)),
            Duration::from_secs(1),
        );
        assert_eq!(err, DispatchError::RuntimeError("Traceback: IndexError".to_string()));
    }

    #[test]
    fn test_server_error_is_unavailable() {
        let err = status_error(503, Some(&body(r#"{ "message": "overloaded" }"#)), Duration::from_secs(1));
        assert!(matches!(err, DispatchError::ServiceUnavailable(m) if m.contains("overloaded")));
        assert!(matches!(
            status_error(400, None, Duration::from_secs(1)),
            DispatchError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_missing_route() {
        let mut config = JudgeServiceConfig::default();
        config.routes.remove(&Language::C);
        let service = HttpExecutionService::from_config(&config);
        assert!(matches!(
            service.url_for(Language::C),
            Err(DispatchError::ServiceUnavailable(_))
        ));
        assert_eq!(
            service.url_for(Language::Python).unwrap(),
            "http://127.0.0.1:8080/submit-python"
        );
    }
}
