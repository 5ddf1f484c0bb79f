//! Journal-entry phase, the only one with cross-type references.
//!
//! Runs last: every line's `AccountRef` must resolve through the Account
//! mapping recorded by the earlier phases. An unresolvable account fails
//! that journal entry alone; class and payee references degrade to a
//! warning and are dropped from the payload.

use qb_types::{
    JournalEntity, JournalEntityType, JournalEntry, JournalEntryLine, JournalEntryLineDetail,
    NtRef, PostingType,
};

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::mapping::IdMap;

pub(crate) struct JournalTransfer;

/// Journal entries have no name; date plus document number is the
/// stand-in identity used for duplicate detection.
pub(crate) fn identifier(entry: &JournalEntry) -> Option<String> {
    let date = entry
        .txn_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let doc = entry.doc_number.clone().unwrap_or_default();
    if date.is_empty() && doc.is_empty() {
        None
    } else {
        Some(format!("{date}_{doc}"))
    }
}

impl TransferSpec for JournalTransfer {
    type Entity = JournalEntry;
    const ENTITY: EntityType = EntityType::JournalEntry;

    fn keys(entry: &JournalEntry, _strategy: MatchStrategy) -> Vec<String> {
        identifier(entry).map_or_else(Vec::new, |id| vec![id])
    }

    fn build(
        entry: &JournalEntry,
        ids: &IdMap,
        _index: &ExistingIndex,
    ) -> Result<JournalEntry, BuildError> {
        let mut lines = Vec::with_capacity(entry.line.len());
        for line in &entry.line {
            let Some(detail) = &line.journal_entry_line_detail else {
                continue;
            };
            lines.push(JournalEntryLine {
                description: line.description.clone(),
                amount: line.amount,
                detail_type: Some("JournalEntryLineDetail".to_string()),
                journal_entry_line_detail: Some(build_detail(line, detail, ids)?),
                ..JournalEntryLine::default()
            });
        }
        Ok(JournalEntry {
            doc_number: entry.doc_number.clone(),
            txn_date: entry.txn_date,
            private_note: entry.private_note.clone(),
            adjustment: entry.adjustment,
            exchange_rate: entry.exchange_rate,
            currency_ref: entry.currency_ref.clone(),
            line: lines,
            ..JournalEntry::default()
        })
    }
}

fn build_detail(
    line: &JournalEntryLine,
    detail: &JournalEntryLineDetail,
    ids: &IdMap,
) -> Result<JournalEntryLineDetail, BuildError> {
    let account_ref = detail
        .account_ref
        .as_ref()
        .ok_or_else(|| BuildError::MissingReference {
            kind: EntityType::Account,
            ref_id: "(none on line)".to_string(),
        })?;
    let mapped_account = ids
        .get(EntityType::Account, &account_ref.value)
        .ok_or_else(|| BuildError::MissingReference {
            kind: EntityType::Account,
            ref_id: account_ref.value.clone(),
        })?;

    Ok(JournalEntryLineDetail {
        posting_type: detail.posting_type.or_else(|| {
            // QuickBooks requires one; mirror the sign convention used
            // when the source omits it.
            Some(if line.amount.unwrap_or(0.0) >= 0.0 {
                PostingType::Debit
            } else {
                PostingType::Credit
            })
        }),
        account_ref: Some(NtRef {
            value: mapped_account.to_string(),
            name: account_ref.name.clone(),
        }),
        class_ref: detail.class_ref.as_ref().and_then(|class_ref| {
            match ids.get(EntityType::Class, &class_ref.value) {
                Some(target_id) => Some(NtRef {
                    value: target_id.to_string(),
                    name: class_ref.name.clone(),
                }),
                None => {
                    log::warn!(
                        "class {} not found in mapping, line continues without class",
                        class_ref.value
                    );
                    None
                }
            }
        }),
        entity: detail.entity.as_ref().and_then(|entity| map_entity(entity, ids)),
    })
}

/// Maps a line payee through its owning type's store. Unsupported or
/// unmapped payees are dropped with a warning, never fatal for the line.
fn map_entity(entity: &JournalEntity, ids: &IdMap) -> Option<JournalEntity> {
    let entity_type = entity.entity_type?;
    let entity_ref = entity.entity_ref.as_ref()?;
    let owner = match entity_type {
        JournalEntityType::Vendor => EntityType::Vendor,
        JournalEntityType::Employee => EntityType::Employee,
        JournalEntityType::Customer => EntityType::Customer,
    };
    match ids.get(owner, &entity_ref.value) {
        Some(target_id) => Some(JournalEntity {
            entity_type: Some(entity_type),
            entity_ref: Some(NtRef {
                value: target_id.to_string(),
                name: entity_ref.name.clone(),
            }),
        }),
        None => {
            log::warn!(
                "{} {} not found in mapping, line continues without payee",
                owner.lower(),
                entity_ref.value
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use qb_types::QBCreatable;

    use super::*;

    fn line(amount: f64, account: &str, posting: Option<PostingType>) -> JournalEntryLine {
        JournalEntryLine {
            amount: Some(amount),
            detail_type: Some("JournalEntryLineDetail".into()),
            journal_entry_line_detail: Some(JournalEntryLineDetail {
                posting_type: posting,
                account_ref: Some(NtRef {
                    value: account.into(),
                    name: None,
                }),
                ..JournalEntryLineDetail::default()
            }),
            ..JournalEntryLine::default()
        }
    }

    fn entry(doc: &str, lines: Vec<JournalEntryLine>) -> JournalEntry {
        JournalEntry {
            id: Some("227".into()),
            doc_number: Some(doc.into()),
            txn_date: NaiveDate::from_ymd_opt(2024, 11, 30),
            line: lines,
            ..JournalEntry::default()
        }
    }

    #[test]
    fn identifier_is_date_and_doc_number() {
        let journal = entry("JE-42", vec![]);
        assert_eq!(identifier(&journal).as_deref(), Some("2024-11-30_JE-42"));
        assert_eq!(identifier(&JournalEntry::default()), None);
    }

    #[test]
    fn unmapped_account_fails_the_record() {
        let journal = entry("JE-42", vec![line(10.0, "99", Some(PostingType::Debit))]);
        let error =
            JournalTransfer::build(&journal, &IdMap::new(), &ExistingIndex::default()).unwrap_err();
        assert_eq!(
            error,
            BuildError::MissingReference {
                kind: EntityType::Account,
                ref_id: "99".into(),
            }
        );
        assert_eq!(error.to_string(), "missing account reference (source id 99)");
    }

    #[test]
    fn mapped_references_are_rewritten() {
        let mut ids = IdMap::new();
        ids.put(EntityType::Account, "61", "501");
        ids.put(EntityType::Account, "62", "502");

        let journal = entry(
            "JE-42",
            vec![
                line(1250.55, "61", Some(PostingType::Debit)),
                line(1250.55, "62", Some(PostingType::Credit)),
            ],
        );
        let payload = JournalTransfer::build(&journal, &ids, &ExistingIndex::default()).unwrap();
        assert_eq!(payload.line.len(), 2);
        let first = payload.line[0].journal_entry_line_detail.as_ref().unwrap();
        assert_eq!(first.account_ref.as_ref().unwrap().value, "501");
        assert!(payload.id.is_none());
        assert!(payload.can_create());
    }

    #[test]
    fn unmapped_class_is_dropped_but_line_survives() {
        let mut ids = IdMap::new();
        ids.put(EntityType::Account, "61", "501");

        let mut journal = entry("JE-42", vec![line(10.0, "61", Some(PostingType::Debit))]);
        journal.line[0]
            .journal_entry_line_detail
            .as_mut()
            .unwrap()
            .class_ref = Some(NtRef {
            value: "7000".into(),
            name: Some("Ops".into()),
        });

        let payload = JournalTransfer::build(&journal, &ids, &ExistingIndex::default()).unwrap();
        let detail = payload.line[0].journal_entry_line_detail.as_ref().unwrap();
        assert!(detail.class_ref.is_none());
    }

    #[test]
    fn payee_maps_through_owning_store() {
        let mut ids = IdMap::new();
        ids.put(EntityType::Account, "61", "501");
        ids.put(EntityType::Vendor, "7", "12");

        let mut journal = entry("JE-42", vec![line(10.0, "61", Some(PostingType::Debit))]);
        journal.line[0]
            .journal_entry_line_detail
            .as_mut()
            .unwrap()
            .entity = Some(JournalEntity {
            entity_type: Some(JournalEntityType::Vendor),
            entity_ref: Some(NtRef {
                value: "7".into(),
                name: Some("Acme Corp".into()),
            }),
        });

        let payload = JournalTransfer::build(&journal, &ids, &ExistingIndex::default()).unwrap();
        let entity = payload.line[0]
            .journal_entry_line_detail
            .as_ref()
            .unwrap()
            .entity
            .as_ref()
            .unwrap();
        assert_eq!(entity.entity_ref.as_ref().unwrap().value, "12");
    }

    #[test]
    fn posting_type_defaults_from_amount_sign() {
        let mut ids = IdMap::new();
        ids.put(EntityType::Account, "61", "501");

        let journal = entry("JE-42", vec![line(-25.0, "61", None)]);
        let payload = JournalTransfer::build(&journal, &ids, &ExistingIndex::default()).unwrap();
        let detail = payload.line[0].journal_entry_line_detail.as_ref().unwrap();
        assert_eq!(detail.posting_type, Some(PostingType::Credit));
    }
}
