//! Authenticated per-company handle for the `QuickBooks` Online API.
//!
//! A [`QBContext`] carries the environment, company ID and access token for
//! one company, plus the client-side rate limiter. Every API call goes
//! through [`QBContext::with_permission`] so the 500 requests/minute
//! budget is respected before the request leaves the process. Wrap a
//! context with [`QBContext::with_refresh`] to renew expired tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ureq::Agent;

use super::refresh::RefreshableQBContext;
use crate::{limiter::RateLimiter, APIResult, Environment};

// QuickBooks allows 500 requests per minute per realm and asks for a
// 60 second pause after a throttle.
const RATE_LIMIT: usize = 500;
const RESET_DURATION: Duration = Duration::from_secs(60);

pub struct QBContext {
    pub(crate) environment: Environment,
    pub(crate) company_id: String,
    pub(crate) access_token: String,
    pub(crate) expires_in: DateTime<Utc>,
    pub(crate) limiter: RateLimiter,
}

impl QBContext {
    #[must_use]
    pub fn new(environment: Environment, company_id: String, access_token: String) -> Self {
        Self {
            environment,
            company_id,
            access_token,
            // Unknown until a refresh tells us; assume valid and let the
            // userinfo probe decide.
            expires_in: Utc::now() + chrono::Duration::hours(999),
            limiter: RateLimiter::new(RATE_LIMIT, RESET_DURATION),
        }
    }

    #[must_use]
    pub fn with_refresh(self, refresh_token: String) -> RefreshableQBContext {
        RefreshableQBContext {
            context: self,
            refresh_token,
        }
    }

    #[must_use]
    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_in
    }

    /// Acquires a permit from the rate limiter and executes the given
    /// function with the context.
    pub(crate) fn with_permission<'a, F, T>(&'a self, f: F) -> APIResult<T>
    where
        F: FnOnce(&'a Self) -> APIResult<T>,
    {
        self.limiter.acquire();
        f(self)
    }

    /// Probes the OpenID userinfo endpoint to check whether the current
    /// access token is still accepted.
    pub fn check_authorized(&self, client: &Agent) -> APIResult<bool> {
        let response = client
            .get(self.environment.user_info_url())
            .header("Authorization", format!("Bearer {}", &self.access_token))
            .header("Accept", "application/json")
            .call()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!(
                "access token for company {} rejected: {} - {}",
                self.company_id,
                status,
                response
                    .into_body()
                    .read_to_string()
                    .unwrap_or_default()
            );
            return Ok(false);
        }
        Ok(true)
    }
}
