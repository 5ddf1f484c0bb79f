//! One-shot, one-directional copy of accounting entities between two
//! `QuickBooks` Online companies.
//!
//! The library is split along the seams of the job: a blocking API client
//! ([`client`], [`functions`]), the ID-mapping store that preserves
//! referential relationships across companies ([`mapping`]), a uniform
//! retry policy ([`retry`]) and the per-entity transfer phases driven in a
//! fixed dependency order ([`transfer`]).
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod error;
pub mod functions;
mod limiter;
pub mod mapping;
pub mod retry;
pub mod transfer;

pub use client::{QBContext, RefreshableQBContext};
pub use error::{APIError, APIResult};

pub mod types {
    pub use qb_types::*;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(alias = "Production")]
    Production,
    #[default]
    #[serde(alias = "Sandbox")]
    Sandbox,
}

impl Environment {
    #[inline]
    #[must_use]
    pub fn endpoint_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://quickbooks.api.intuit.com/v3/",
            Environment::Sandbox => "https://sandbox-quickbooks.api.intuit.com/v3/",
        }
    }

    #[inline]
    #[must_use]
    pub fn user_info_url(&self) -> &'static str {
        match self {
            Environment::Production => {
                "https://accounts.platform.intuit.com/v1/openid_connect/userinfo"
            }
            Environment::Sandbox => {
                "https://sandbox-accounts.platform.intuit.com/v1/openid_connect/userinfo"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;

    #[test]
    fn environment_accepts_both_casings() {
        let env: Environment = serde_yaml::from_str("sandbox").unwrap();
        assert_eq!(env, Environment::Sandbox);
        let env: Environment = serde_yaml::from_str("Production").unwrap();
        assert_eq!(env, Environment::Production);
        assert_eq!(serde_yaml::to_string(&env).unwrap().trim(), "production");
    }
}
