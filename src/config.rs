//! Credentials file handling.
//!
//! The file mirrors what the Intuit developer portal hands out: one app
//! (client id/secret) and one block per company. Tokens are written back
//! after a refresh so the next run starts from live credentials.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Environment;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write credentials file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub source: CompanyCredentials,
    pub target: CompanyCredentials,
    /// How accounts are matched against the target company, see
    /// [`MatchStrategy`].
    #[serde(default)]
    pub account_match: MatchStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCredentials {
    pub environment: Environment,
    pub redirect_uri: String,
    pub company_id: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Which side of the transfer a company block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyRole {
    Source,
    Target,
}

impl std::fmt::Display for CompanyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompanyRole::Source => write!(f, "source"),
            CompanyRole::Target => write!(f, "target"),
        }
    }
}

impl std::str::FromStr for CompanyRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(CompanyRole::Source),
            "target" => Ok(CompanyRole::Target),
            other => Err(format!("unknown company `{other}`, expected source or target")),
        }
    }
}

/// Existing-entity matching strategy. Name-only exact match is what the
/// rest of the tool assumes; number-and-name additionally keys accounts by
/// `{AcctNum}_{Name}` and falls back to the bare name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    #[default]
    NameOnly,
    NameAndNumber,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn company(&self, role: CompanyRole) -> &CompanyCredentials {
        match role {
            CompanyRole::Source => &self.source,
            CompanyRole::Target => &self.target,
        }
    }

    pub fn company_mut(&mut self, role: CompanyRole) -> &mut CompanyCredentials {
        match role {
            CompanyRole::Source => &mut self.source,
            CompanyRole::Target => &mut self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Environment;

    const FIXTURE: &str = "\
client_id: ABt4Zs1Mxyz
client_secret: shhh
source:
  environment: sandbox
  redirect_uri: http://localhost:5000/callback
  company_id: '4620816365257778210'
  access_token: old-access
  refresh_token: old-refresh
target:
  environment: production
  redirect_uri: http://localhost:5000/callback
  company_id: '9130357849211789'
  access_token: ''
  refresh_token: ''
";

    #[test]
    fn parses_credentials_file() {
        let creds: Credentials = serde_yaml::from_str(FIXTURE).unwrap();
        assert_eq!(creds.source.environment, Environment::Sandbox);
        assert_eq!(creds.target.environment, Environment::Production);
        assert_eq!(creds.company(CompanyRole::Source).company_id, "4620816365257778210");
        assert_eq!(creds.account_match, MatchStrategy::NameOnly);
    }

    #[test]
    fn save_and_reload_round_trips_tokens() {
        let mut creds: Credentials = serde_yaml::from_str(FIXTURE).unwrap();
        creds.company_mut(CompanyRole::Source).access_token = "new-access".into();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.yml");
        creds.save(&path).unwrap();

        let reloaded = Credentials::load(&path).unwrap();
        assert_eq!(reloaded.source.access_token, "new-access");
        assert_eq!(reloaded.source.refresh_token, "old-refresh");
    }

    #[test]
    fn match_strategy_is_configurable() {
        let with_strategy = format!("{FIXTURE}account_match: name-and-number\n");
        let creds: Credentials = serde_yaml::from_str(&with_strategy).unwrap();
        assert_eq!(creds.account_match, MatchStrategy::NameAndNumber);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Credentials::load(Path::new("/nonexistent/credentials.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/credentials.yml"));
    }
}
