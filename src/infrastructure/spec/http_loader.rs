//! HTTP reader with a login-on-demand retry
//!
//! Reads are attempted anonymously first. Any failure other than a timeout
//! triggers one retry wrapped in an explicit login/logout pair. No session
//! survives between reads.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::core::SdkConfig;
use crate::infrastructure::spec::SpecError;

/// Body text the API server returns when a call needs a session
pub const AUTH_REQUIRED_MARKER: &str = "Requires authentication";

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

pub struct AuthenticatedReader {
    client: Client,
    base_url: Option<Url>,
    client_id: Option<String>,
    client_secret: Option<String>,
    api_version: String,
}

impl AuthenticatedReader {
    pub fn new(config: &SdkConfig) -> Result<Self, SpecError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| SpecError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_version: config.auth_api_version().to_string(),
        })
    }

    /// Read `url`, logging in for a single retry when the anonymous read fails
    pub async fn read(&self, url: &str) -> Result<String, SpecError> {
        match self.get(url, None).await {
            Ok(body) if !requires_authentication(&body) => return Ok(body),
            Ok(_) => debug!(url = %url, "Anonymous read requires authentication"),
            Err(SpecError::Timeout(target)) => return Err(SpecError::Timeout(target)),
            Err(e) => debug!(url = %url, error = %e, "Anonymous read failed, retrying with login"),
        }

        let token = self.login().await?;
        let result = self.get(url, Some(&token)).await;
        if let Err(e) = self.logout(&token).await {
            warn!(error = %e, "Logout after authenticated read failed");
        }

        result
    }

    async fn get(&self, url: &str, token: Option<&str>) -> Result<String, SpecError> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;

        // refused even with a session
        let refused = status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || requires_authentication(&body);
        if token.is_some() && refused {
            return Err(SpecError::Authentication(format!(
                "{url} still requires authentication after login (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(SpecError::Http(format!("HTTP {status} when fetching {url}")));
        }
        Ok(body)
    }

    async fn login(&self) -> Result<String, SpecError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(SpecError::Authentication(
                "client_id and client_secret are required to log in".to_string(),
            ));
        };
        let url = self.api_url("login")?;

        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpecError::Authentication(format!(
                "login rejected with HTTP {status}"
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| SpecError::Authentication(format!("invalid login response: {e}")))?;
        debug!("Logged in for authenticated read");
        Ok(token.access_token)
    }

    async fn logout(&self, token: &str) -> Result<(), SpecError> {
        let url = self.api_url("logout")?;
        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("token {token}"))
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => Err(SpecError::Http(format!("HTTP {status} when logging out"))),
        }
    }

    fn api_url(&self, endpoint: &str) -> Result<String, SpecError> {
        let base = self.base_url.as_ref().ok_or_else(|| {
            SpecError::Authentication("base_url is required to log in".to_string())
        })?;
        Ok(format!(
            "{}/api/{}/{}",
            base.as_str().trim_end_matches('/'),
            self.api_version,
            endpoint
        ))
    }
}

fn requires_authentication(body: &str) -> bool {
    body.contains(AUTH_REQUIRED_MARKER)
}

fn transport_error(url: &str, e: reqwest::Error) -> SpecError {
    if e.is_timeout() {
        SpecError::Timeout(url.to_string())
    } else {
        SpecError::Http(format!("Failed to fetch {url}: {e}"))
    }
}
