use base64::Engine;
use serde::Deserialize;
use ureq::{http::Request, Agent};

use super::{QBContext, TOKEN_ENDPOINT};
use crate::error::APIError;

pub struct RefreshableQBContext {
    pub(crate) context: QBContext,
    pub(crate) refresh_token: String,
}

impl RefreshableQBContext {
    /// Exchanges the refresh token for a new access/refresh token pair and
    /// updates the wrapped context in place.
    pub fn refresh_access_token(
        &mut self,
        client_id: &str,
        client_secret: &str,
        client: &Agent,
    ) -> Result<(), APIError> {
        let auth_string = format!("{client_id}:{client_secret}");
        let auth_string = base64::engine::general_purpose::STANDARD.encode(auth_string);

        let request = Request::post(TOKEN_ENDPOINT)
            .header("Authorization", format!("Basic {auth_string}"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(format!(
                "grant_type=refresh_token&refresh_token={}",
                &self.refresh_token
            ))?;

        let response = client.run(request)?;

        if !response.status().is_success() {
            return Err(APIError::InvalidClient);
        }

        let TokenResponse {
            access_token,
            refresh_token,
            expires_in,
            ..
        } = response.into_body().read_json()?;

        self.refresh_token = refresh_token;
        self.context.access_token = access_token;
        self.context.expires_in =
            chrono::Utc::now() + chrono::Duration::seconds(i64::try_from(expires_in).unwrap_or(0));

        Ok(())
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    #[must_use]
    pub fn into_inner(self) -> QBContext {
        self.context
    }
}

impl std::ops::Deref for RefreshableQBContext {
    type Target = QBContext;
    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// Token payload returned by Intuit's bearer-token endpoint, both for
/// refreshes and for the initial authorization-code exchange.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub x_refresh_token_expires_in: u64,
    pub access_token: String,
}
