use serde::{Deserialize, Serialize};

use crate::{impl_qb_item, MetaData, NtRef, QBCreatable};

/// Chart-of-accounts entry.
///
/// `account_type` and `account_sub_type` are kept as strings rather than
/// enums; `QuickBooks` accepts a long, locale-dependent list of values and
/// the tool only ever copies them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Account {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acct_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_sub_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance_with_sub_accounts: Option<f64>,
}

impl_qb_item!(Account, "Account", "account");

impl QBCreatable for Account {
    fn can_create(&self) -> bool {
        self.name.is_some() && self.account_type.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_shape() {
        let account: Account = serde_json::from_str(
            r#"{
                "Id": "35",
                "SyncToken": "0",
                "Name": "Checking",
                "AcctNum": "1001",
                "AccountType": "Bank",
                "AccountSubType": "Checking",
                "Classification": "Asset",
                "Active": true,
                "SubAccount": false,
                "FullyQualifiedName": "Checking",
                "CurrencyRef": {"name": "United States Dollar", "value": "USD"},
                "CurrentBalance": 1201.0,
                "domain": "QBO",
                "sparse": false
            }"#,
        )
        .unwrap();
        assert_eq!(account.id.as_deref(), Some("35"));
        assert_eq!(account.account_type.as_deref(), Some("Bank"));
        assert_eq!(account.currency_ref.as_ref().unwrap().value, "USD");
    }

    #[test]
    fn create_payload_skips_absent_fields() {
        let account = Account {
            name: Some("Checking".into()),
            account_type: Some("Bank".into()),
            ..Account::default()
        };
        assert!(account.can_create());
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, r#"{"Name":"Checking","AccountType":"Bank"}"#);
    }

    #[test]
    fn create_requires_name_and_type() {
        let account = Account {
            name: Some("Checking".into()),
            ..Account::default()
        };
        assert!(!account.can_create());
    }
}
