//! Per-entity transfer phases and the generic engine that drives them.
//!
//! Each entity type implements [`TransferSpec`]: how it is keyed in the
//! target company, which records are excluded, and how a source object is
//! translated into a create payload with its references resolved through
//! the [`IdMap`]. The engine owns the shared per-record discipline:
//! mapping-store pre-check, existing-entity detection, create with retry,
//! and outcome accounting. One bad record never aborts a phase.

use std::collections::HashMap;

use qb_types::{QBCreatable, QBItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ureq::Agent;

use crate::config::MatchStrategy;
use crate::error::ErrorKind;
use crate::functions::query::{qb_query_single, QueryPager, DEFAULT_PAGE_SIZE};
use crate::functions::qb_create;
use crate::mapping::IdMap;
use crate::retry::RetryPolicy;
use crate::{APIResult, QBContext};

pub mod accounts;
pub mod classes;
pub mod customers;
pub mod employees;
pub mod journals;
pub mod runner;
pub mod vendors;

/// The entity types the tool knows how to move, in the fixed transfer
/// order. Referencing types come after everything they reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Account,
    Employee,
    Customer,
    Class,
    Vendor,
    JournalEntry,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Account,
        EntityType::Employee,
        EntityType::Customer,
        EntityType::Class,
        EntityType::Vendor,
        EntityType::JournalEntry,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Account => "Account",
            EntityType::Employee => "Employee",
            EntityType::Customer => "Customer",
            EntityType::Class => "Class",
            EntityType::Vendor => "Vendor",
            EntityType::JournalEntry => "JournalEntry",
        }
    }

    #[must_use]
    pub fn lower(self) -> &'static str {
        match self {
            EntityType::Account => "account",
            EntityType::Employee => "employee",
            EntityType::Customer => "customer",
            EntityType::Class => "class",
            EntityType::Vendor => "vendor",
            EntityType::JournalEntry => "journal entry",
        }
    }

    /// Entity types this type's records resolve references through. A
    /// selection must be closed over this relation before a run starts.
    #[must_use]
    pub fn references(self) -> &'static [EntityType] {
        match self {
            EntityType::JournalEntry => &[
                EntityType::Account,
                EntityType::Class,
                EntityType::Employee,
                EntityType::Vendor,
            ],
            _ => &[],
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "account" | "accounts" => Ok(EntityType::Account),
            "employee" | "employees" => Ok(EntityType::Employee),
            "customer" | "customers" => Ok(EntityType::Customer),
            "class" | "classes" => Ok(EntityType::Class),
            "vendor" | "vendors" => Ok(EntityType::Vendor),
            "journalentry" | "journalentries" => Ok(EntityType::JournalEntry),
            _ => Err(format!(
                "unknown entity type `{s}`, expected one of accounts, employees, customers, classes, vendors, journal-entries"
            )),
        }
    }
}

/// Outcome of one entity's transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { target_id: String },
    AlreadyExists { target_id: String },
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub entity_type: EntityType,
    pub source_id: String,
    /// The natural key the record was matched under, for log readability.
    pub key: String,
    pub outcome: Outcome,
}

/// Per-phase accounting; the run-end summary is built from these.
#[derive(Debug)]
pub struct PhaseSummary {
    pub entity_type: EntityType,
    pub created: usize,
    pub already_existing: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<TransferRecord>,
}

impl PhaseSummary {
    #[must_use]
    pub fn new(entity_type: EntityType) -> Self {
        PhaseSummary {
            entity_type,
            created: 0,
            already_existing: 0,
            failed: 0,
            skipped: 0,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TransferRecord) {
        match &record.outcome {
            Outcome::Created { target_id } => {
                self.created += 1;
                log::info!(
                    "created {} '{}' with id {target_id}",
                    record.entity_type.lower(),
                    record.key
                );
            }
            Outcome::AlreadyExists { .. } => self.already_existing += 1,
            Outcome::Failed { error } => {
                self.failed += 1;
                log::error!(
                    "failed to transfer {} {} ('{}'): {error}",
                    record.entity_type.lower(),
                    record.source_id,
                    record.key
                );
            }
            Outcome::Skipped { reason } => {
                self.skipped += 1;
                log::debug!(
                    "skipped {} {} ('{}'): {reason}",
                    record.entity_type.lower(),
                    record.source_id,
                    record.key
                );
            }
        }
        self.records.push(record);
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.records.len()
    }
}

impl std::fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} already existing, {} failed, {} skipped",
            self.created, self.already_existing, self.failed, self.skipped
        )
    }
}

/// Failure translating a source entity into a create payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing {} reference (source id {ref_id})", .kind.lower())]
    MissingReference { kind: EntityType, ref_id: String },
}

/// Keys of the target company's entities, as populated by a full paged
/// read before a phase and kept current as the phase creates records.
#[derive(Debug, Default)]
pub struct ExistingIndex {
    by_key: HashMap<String, String>,
}

impl ExistingIndex {
    pub fn insert(&mut self, key: String, target_id: String) {
        self.by_key.insert(key, target_id);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Shared clients and policy for one run, passed into every phase.
pub(crate) struct TransferCtx<'a> {
    pub source: &'a QBContext,
    pub target: &'a QBContext,
    pub client: &'a Agent,
    pub policy: &'a RetryPolicy,
    pub strategy: MatchStrategy,
}

/// Per-entity-type behavior the generic engine is instantiated with.
pub(crate) trait TransferSpec {
    type Entity: QBItem + QBCreatable;
    const ENTITY: EntityType;

    /// Candidate natural keys, most specific first. Empty means the
    /// entity cannot be matched against the target and is always created.
    fn keys(entity: &Self::Entity, strategy: MatchStrategy) -> Vec<String>;

    /// Exact-match query against the target company, used when the
    /// prefetched index misses; `None` for types only matched via index.
    fn match_clause(_entity: &Self::Entity) -> Option<String> {
        None
    }

    fn include(_entity: &Self::Entity) -> bool {
        true
    }

    fn skip_reason() -> &'static str {
        "inactive"
    }

    /// Order source records before transfer, e.g. parents before children.
    fn order(_entities: &mut [Self::Entity]) {}

    /// Translates the source entity into a create payload, resolving
    /// referenced IDs through the mapping store.
    fn build(
        entity: &Self::Entity,
        ids: &IdMap,
        index: &ExistingIndex,
    ) -> Result<Self::Entity, BuildError>;
}

/// Runs one phase: prefetch the target index, page through the source,
/// transfer record by record. Only authentication errors (and phase-level
/// fetch failures after retries) propagate.
pub(crate) fn run_phase<S: TransferSpec>(
    ctx: &TransferCtx,
    ids: &mut IdMap,
) -> APIResult<PhaseSummary> {
    log::info!("starting {} transfer", S::ENTITY.lower());

    let mut index = build_index::<S>(ctx)?;
    log::info!(
        "indexed {} existing {} key(s) in target company",
        index.len(),
        S::ENTITY.lower()
    );

    let mut entities = fetch_source::<S>(ctx)?;
    log::info!(
        "retrieved {} {}(s) from source company",
        entities.len(),
        S::ENTITY.lower()
    );
    S::order(&mut entities);

    let mut summary = PhaseSummary::new(S::ENTITY);
    for entity in &entities {
        let record = transfer_one::<S>(ctx, entity, ids, &mut index)?;
        summary.push(record);
    }
    log::info!("{} phase done: {summary}", S::ENTITY.lower());
    Ok(summary)
}

fn fetch_source<S: TransferSpec>(ctx: &TransferCtx) -> APIResult<Vec<S::Entity>> {
    let description = format!("fetch source {}s", S::ENTITY.lower());
    let mut pager = QueryPager::<S::Entity>::new("", DEFAULT_PAGE_SIZE, ctx.source, ctx.client);
    let mut entities = Vec::new();
    while let Some(page) = ctx.policy.run(&description, || pager.next_page())? {
        entities.extend(page);
    }
    Ok(entities)
}

fn build_index<S: TransferSpec>(ctx: &TransferCtx) -> APIResult<ExistingIndex> {
    let description = format!("fetch existing {}s", S::ENTITY.lower());
    let mut pager = QueryPager::<S::Entity>::new("", DEFAULT_PAGE_SIZE, ctx.target, ctx.client);
    let mut index = ExistingIndex::default();
    while let Some(page) = ctx.policy.run(&description, || pager.next_page())? {
        for entity in &page {
            let Some(target_id) = entity.id() else {
                continue;
            };
            for key in S::keys(entity, ctx.strategy) {
                index.insert(key, target_id.clone());
            }
        }
    }
    Ok(index)
}

/// Transfers a single record. Returns `Err` only for errors that must
/// abort the whole run (authentication); everything else is folded into
/// the record's outcome.
fn transfer_one<S: TransferSpec>(
    ctx: &TransferCtx,
    entity: &S::Entity,
    ids: &mut IdMap,
    index: &mut ExistingIndex,
) -> APIResult<TransferRecord> {
    let source_id = entity.id().cloned().unwrap_or_default();
    let keys = S::keys(entity, ctx.strategy);
    let display = keys.first().cloned().unwrap_or_else(|| source_id.clone());
    let record = |outcome: Outcome| TransferRecord {
        entity_type: S::ENTITY,
        source_id: source_id.clone(),
        key: display.clone(),
        outcome,
    };

    if !S::include(entity) {
        return Ok(record(Outcome::Skipped {
            reason: S::skip_reason().to_string(),
        }));
    }
    if source_id.is_empty() {
        return Ok(record(Outcome::Failed {
            error: "source entity carries no id".to_string(),
        }));
    }

    // Never create twice for the same source id within a run.
    if let Some(target_id) = ids.get(S::ENTITY, &source_id) {
        return Ok(record(Outcome::AlreadyExists {
            target_id: target_id.to_string(),
        }));
    }

    if let Some(target_id) = find_existing::<S>(ctx, index, entity, &keys)? {
        log::info!(
            "{} '{display}' already exists with id {target_id}",
            S::ENTITY.lower()
        );
        ids.put(S::ENTITY, source_id.clone(), target_id.clone());
        return Ok(record(Outcome::AlreadyExists { target_id }));
    }

    let payload = match S::build(entity, ids, index) {
        Ok(payload) => payload,
        Err(error) => {
            return Ok(record(Outcome::Failed {
                error: error.to_string(),
            }))
        }
    };

    let description = format!("create {} '{display}'", S::ENTITY.lower());
    match ctx
        .policy
        .run(&description, || qb_create(&payload, ctx.target, ctx.client))
    {
        Ok(created) => {
            let Some(target_id) = created.id().cloned() else {
                return Ok(record(Outcome::Failed {
                    error: "create response carried no id".to_string(),
                }));
            };
            ids.put(S::ENTITY, source_id.clone(), target_id.clone());
            for key in keys {
                index.insert(key, target_id.clone());
            }
            Ok(record(Outcome::Created { target_id }))
        }
        Err(error) if error.kind() == ErrorKind::Authentication => Err(error),
        Err(error) if error.kind() == ErrorKind::Duplicate => {
            // Someone holds the name but the prefetched index missed it
            // (e.g. an inactive record). Recover the id so the mapping is
            // still recorded.
            match query_existing::<S>(ctx, entity)? {
                Some(target_id) => {
                    log::info!(
                        "{} '{display}' reported as duplicate, mapped to existing id {target_id}",
                        S::ENTITY.lower()
                    );
                    ids.put(S::ENTITY, source_id.clone(), target_id.clone());
                    for key in keys {
                        index.insert(key, target_id.clone());
                    }
                    Ok(record(Outcome::AlreadyExists { target_id }))
                }
                None => Ok(record(Outcome::Failed {
                    error: error.to_string(),
                })),
            }
        }
        Err(error) => Ok(record(Outcome::Failed {
            error: error.to_string(),
        })),
    }
}

fn find_existing<S: TransferSpec>(
    ctx: &TransferCtx,
    index: &ExistingIndex,
    entity: &S::Entity,
    keys: &[String],
) -> APIResult<Option<String>> {
    for key in keys {
        if let Some(target_id) = index.get(key) {
            return Ok(Some(target_id.to_string()));
        }
    }
    query_existing::<S>(ctx, entity)
}

/// Direct exact-match lookup in the target company. Lookup failures are
/// not fatal for the record: a miss here only means a create is attempted,
/// and a genuine duplicate comes back as fault 6240.
fn query_existing<S: TransferSpec>(
    ctx: &TransferCtx,
    entity: &S::Entity,
) -> APIResult<Option<String>> {
    let Some(clause) = S::match_clause(entity) else {
        return Ok(None);
    };
    let description = format!("lookup existing {}", S::ENTITY.lower());
    match ctx.policy.run(&description, || {
        qb_query_single::<S::Entity>(&clause, ctx.target, ctx.client)
    }) {
        Ok(found) => Ok(found.and_then(|existing| existing.id().cloned())),
        Err(error) if error.kind() == ErrorKind::Authentication => Err(error),
        Err(error) => {
            log::warn!("existing-entity lookup failed ({clause}): {error}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_order_is_fixed() {
        assert_eq!(
            EntityType::ALL,
            [
                EntityType::Account,
                EntityType::Employee,
                EntityType::Customer,
                EntityType::Class,
                EntityType::Vendor,
                EntityType::JournalEntry,
            ]
        );
    }

    #[test]
    fn entity_type_parses_cli_spellings() {
        assert_eq!("accounts".parse(), Ok(EntityType::Account));
        assert_eq!("Classes".parse(), Ok(EntityType::Class));
        assert_eq!("journal-entries".parse(), Ok(EntityType::JournalEntry));
        assert_eq!("journal_entries".parse(), Ok(EntityType::JournalEntry));
        assert_eq!("vendor".parse(), Ok(EntityType::Vendor));
        assert!("invoices".parse::<EntityType>().is_err());
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = PhaseSummary::new(EntityType::Vendor);
        let record = |outcome| TransferRecord {
            entity_type: EntityType::Vendor,
            source_id: "7".into(),
            key: "Acme Corp".into(),
            outcome,
        };
        summary.push(record(Outcome::Created {
            target_id: "12".into(),
        }));
        summary.push(record(Outcome::AlreadyExists {
            target_id: "12".into(),
        }));
        summary.push(record(Outcome::Failed {
            error: "boom".into(),
        }));
        summary.push(record(Outcome::Skipped {
            reason: "inactive".into(),
        }));
        assert_eq!(summary.created, 1);
        assert_eq!(summary.already_existing, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed(), 4);
        assert_eq!(
            summary.to_string(),
            "1 created, 1 already existing, 1 failed, 1 skipped"
        );
    }

    #[test]
    fn missing_reference_message_names_the_type() {
        let error = BuildError::MissingReference {
            kind: EntityType::Account,
            ref_id: "99".into(),
        };
        assert_eq!(error.to_string(), "missing account reference (source id 99)");
    }

    #[test]
    fn index_lookup_is_exact_and_case_sensitive() {
        let mut index = ExistingIndex::default();
        index.insert("Acme Corp".into(), "12".into());
        assert_eq!(index.get("Acme Corp"), Some("12"));
        assert_eq!(index.get("acme corp"), None);
        assert_eq!(index.get("Acme"), None);
    }
}
