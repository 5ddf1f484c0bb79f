//! Run orchestration: wiring credentials to authenticated contexts and
//! driving the phases in the fixed dependency order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use ureq::Agent;

use super::accounts::AccountTransfer;
use super::classes::ClassTransfer;
use super::customers::CustomerTransfer;
use super::employees::EmployeeTransfer;
use super::journals::JournalTransfer;
use super::vendors::VendorTransfer;
use super::{run_phase, EntityType, PhaseSummary, TransferCtx};
use crate::client;
use crate::config::{CompanyRole, ConfigError, Credentials};
use crate::error::APIError;
use crate::mapping::IdMap;
use crate::retry::RetryPolicy;
use crate::QBContext;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Api(#[from] APIError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid entity selection: {0}")]
    Selection(String),
    #[error("authentication failed for {company} company: {source}")]
    Auth {
        company: CompanyRole,
        #[source]
        source: APIError,
    },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub credentials_path: PathBuf,
    /// Entity types to move; empty means all of them.
    pub entities: BTreeSet<EntityType>,
    /// Where to dump the final ID mapping as JSON, if anywhere.
    pub mapping_out: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub phases: Vec<PhaseSummary>,
}

impl RunSummary {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.phases.iter().map(|phase| phase.failed).sum()
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.phases.iter().map(|phase| phase.created).sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Transfer Summary ===")?;
        for phase in &self.phases {
            writeln!(f, "{:<13} {}", format!("{}:", phase.entity_type), phase)?;
        }
        Ok(())
    }
}

/// A selection is valid when every selected type's references are also
/// selected; otherwise the later phase could only fail record by record.
pub fn validate_selection(selection: &BTreeSet<EntityType>) -> Result<(), RunError> {
    for entity_type in selection {
        for dependency in entity_type.references() {
            if !selection.contains(dependency) {
                return Err(RunError::Selection(format!(
                    "{} requires {} (its references resolve through the {} mapping)",
                    entity_type.lower(),
                    dependency.lower(),
                    dependency.lower(),
                )));
            }
        }
    }
    Ok(())
}

/// Runs the whole transfer. Record-level failures are accumulated in the
/// summary; configuration and authentication problems abort immediately.
pub fn run(options: &RunOptions) -> Result<RunSummary, RunError> {
    let mut selection = options.entities.clone();
    if selection.is_empty() {
        selection.extend(EntityType::ALL);
    }
    validate_selection(&selection)?;

    let mut credentials = Credentials::load(&options.credentials_path)?;
    let client = client::default_agent();

    let source = connect(
        &mut credentials,
        CompanyRole::Source,
        &options.credentials_path,
        &client,
    )?;
    let target = connect(
        &mut credentials,
        CompanyRole::Target,
        &options.credentials_path,
        &client,
    )?;

    let policy = RetryPolicy::default();
    let ctx = TransferCtx {
        source: &source,
        target: &target,
        client: &client,
        policy: &policy,
        strategy: credentials.account_match,
    };

    let mut ids = IdMap::new();
    let mut summary = RunSummary::default();
    for entity_type in EntityType::ALL {
        if !selection.contains(&entity_type) {
            continue;
        }
        let phase = match entity_type {
            EntityType::Account => run_phase::<AccountTransfer>(&ctx, &mut ids)?,
            EntityType::Employee => run_phase::<EmployeeTransfer>(&ctx, &mut ids)?,
            EntityType::Customer => run_phase::<CustomerTransfer>(&ctx, &mut ids)?,
            EntityType::Class => run_phase::<ClassTransfer>(&ctx, &mut ids)?,
            EntityType::Vendor => run_phase::<VendorTransfer>(&ctx, &mut ids)?,
            EntityType::JournalEntry => run_phase::<JournalTransfer>(&ctx, &mut ids)?,
        };
        summary.phases.push(phase);
    }

    if let Some(path) = &options.mapping_out {
        match ids.save(path) {
            Ok(()) => log::info!("wrote id mapping to {}", path.display()),
            Err(error) => log::warn!("could not write id mapping to {}: {error}", path.display()),
        }
    }

    log::info!("data transfer completed");
    Ok(summary)
}

/// Builds an authenticated context for one company, refreshing and
/// persisting tokens when the stored access token is no longer accepted.
fn connect(
    credentials: &mut Credentials,
    role: CompanyRole,
    credentials_path: &Path,
    client: &Agent,
) -> Result<QBContext, RunError> {
    let company = credentials.company(role);
    let context = QBContext::new(
        company.environment,
        company.company_id.clone(),
        company.access_token.clone(),
    );

    if context.check_authorized(client)? {
        log::info!("{role} company {} authorized", context.company_id());
        return Ok(context);
    }

    log::info!("access token for {role} company expired, refreshing");
    let mut refreshable = context.with_refresh(company.refresh_token.clone());
    refreshable
        .refresh_access_token(&credentials.client_id, &credentials.client_secret, client)
        .map_err(|source| RunError::Auth {
            company: role,
            source,
        })?;

    if !refreshable.check_authorized(client)? {
        return Err(RunError::Auth {
            company: role,
            source: APIError::InvalidClient,
        });
    }

    let company = credentials.company_mut(role);
    company.access_token = refreshable.access_token().to_string();
    company.refresh_token = refreshable.refresh_token().to_string();
    credentials.save(credentials_path)?;
    log::info!("refreshed tokens for {role} company saved to credentials file");

    Ok(refreshable.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_entries_require_their_reference_types() {
        let selection: BTreeSet<_> = [EntityType::JournalEntry].into_iter().collect();
        let error = validate_selection(&selection).unwrap_err();
        assert!(matches!(error, RunError::Selection(_)));
        assert!(error.to_string().contains("journal entry requires"));
    }

    #[test]
    fn closed_selections_pass() {
        let all: BTreeSet<_> = EntityType::ALL.into_iter().collect();
        validate_selection(&all).unwrap();

        let accounts_only: BTreeSet<_> = [EntityType::Account].into_iter().collect();
        validate_selection(&accounts_only).unwrap();

        let journal_closure: BTreeSet<_> = [
            EntityType::Account,
            EntityType::Class,
            EntityType::Employee,
            EntityType::Vendor,
            EntityType::JournalEntry,
        ]
        .into_iter()
        .collect();
        validate_selection(&journal_closure).unwrap();
    }

    #[test]
    fn summary_totals_span_phases() {
        let mut summary = RunSummary::default();
        let mut accounts = PhaseSummary::new(EntityType::Account);
        accounts.created = 2;
        accounts.failed = 1;
        let mut vendors = PhaseSummary::new(EntityType::Vendor);
        vendors.created = 1;
        summary.phases.push(accounts);
        summary.phases.push(vendors);

        assert_eq!(summary.created(), 3);
        assert_eq!(summary.failed(), 1);
        let rendered = summary.to_string();
        assert!(rendered.contains("=== Transfer Summary ==="));
        assert!(rendered.contains("Account:"));
    }
}
