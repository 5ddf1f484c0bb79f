use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{impl_qb_item, MetaData, NtRef, QBCreatable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JournalEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<JournalEntryLine>,
}

impl_qb_item!(JournalEntry, "JournalEntry", "journalentry");

impl QBCreatable for JournalEntry {
    // A journal entry posts nothing without lines, and every line must
    // name the account it debits or credits.
    fn can_create(&self) -> bool {
        !self.line.is_empty()
            && self.line.iter().all(|line| {
                line.journal_entry_line_detail
                    .as_ref()
                    .is_some_and(|detail| detail.account_ref.is_some())
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JournalEntryLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_entry_line_detail: Option<JournalEntryLineDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JournalEntryLineDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_type: Option<PostingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<JournalEntity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingType {
    Debit,
    Credit,
}

/// Payee attached to a journal line; `Type` says which resource
/// `entity_ref` points into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JournalEntity {
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<JournalEntityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_ref: Option<NtRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntityType {
    Vendor,
    Employee,
    Customer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_shape() {
        let entry: JournalEntry = serde_json::from_str(
            r#"{
                "Id": "227",
                "SyncToken": "0",
                "DocNumber": "JE-42",
                "TxnDate": "2024-11-30",
                "Adjustment": false,
                "Line": [
                    {
                        "Id": "0",
                        "Description": "payroll accrual",
                        "Amount": 1250.55,
                        "DetailType": "JournalEntryLineDetail",
                        "JournalEntryLineDetail": {
                            "PostingType": "Debit",
                            "AccountRef": {"name": "Payroll Expenses", "value": "61"},
                            "ClassRef": {"name": "Operations", "value": "5000000000000137302"},
                            "Entity": {
                                "Type": "Employee",
                                "EntityRef": {"name": "Jane Doe", "value": "55"}
                            }
                        }
                    },
                    {
                        "Id": "1",
                        "Amount": 1250.55,
                        "DetailType": "JournalEntryLineDetail",
                        "JournalEntryLineDetail": {
                            "PostingType": "Credit",
                            "AccountRef": {"name": "Payroll Liabilities", "value": "62"}
                        }
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(entry.line.len(), 2);
        let detail = entry.line[0].journal_entry_line_detail.as_ref().unwrap();
        assert_eq!(detail.posting_type, Some(PostingType::Debit));
        assert_eq!(
            detail.entity.as_ref().unwrap().entity_type,
            Some(JournalEntityType::Employee)
        );
        assert!(entry.can_create());
    }

    #[test]
    fn create_rejected_without_account_refs() {
        let entry = JournalEntry {
            line: vec![JournalEntryLine {
                amount: Some(10.0),
                detail_type: Some("JournalEntryLineDetail".into()),
                journal_entry_line_detail: Some(JournalEntryLineDetail::default()),
                ..JournalEntryLine::default()
            }],
            ..JournalEntry::default()
        };
        assert!(!entry.can_create());
    }
}
