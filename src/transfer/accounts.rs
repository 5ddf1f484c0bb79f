//! Chart-of-accounts phase.

use std::collections::HashMap;

use qb_types::Account;

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::mapping::IdMap;

/// Stock accounts every company already has; creating them again only
/// produces duplicate-name noise.
const STOCK_ACCOUNTS: &[&str] = &[
    "Accounts Payable",
    "Accounts Receivable",
    "Opening Balance Equity",
    "Retained Earnings",
    "Sales of Product Income",
    "Undeposited Funds",
    "Inventory Asset",
];

pub(crate) struct AccountTransfer;

impl TransferSpec for AccountTransfer {
    type Entity = Account;
    const ENTITY: EntityType = EntityType::Account;

    fn keys(account: &Account, strategy: MatchStrategy) -> Vec<String> {
        let Some(name) = account.name.as_deref() else {
            return Vec::new();
        };
        match strategy {
            MatchStrategy::NameOnly => vec![name.to_string()],
            MatchStrategy::NameAndNumber => {
                let mut keys = Vec::new();
                if let Some(number) = account.acct_num.as_deref() {
                    keys.push(format!("{number}_{name}"));
                }
                keys.push(name.to_string());
                keys
            }
        }
    }

    fn match_clause(account: &Account) -> Option<String> {
        let name = account.name.as_deref()?;
        Some(format!(
            "WHERE Name = '{}'",
            crate::functions::query::escape_query_value(name)
        ))
    }

    fn include(account: &Account) -> bool {
        account.active == Some(true) && !is_stock_account(account)
    }

    fn skip_reason() -> &'static str {
        "inactive or stock account"
    }

    /// Parents before children, so a sub-account's `ParentRef` can resolve
    /// through mappings recorded earlier in the same phase.
    fn order(accounts: &mut [Account]) {
        let depths = hierarchy_depths(accounts);
        accounts.sort_by_key(|account| {
            account
                .id
                .as_ref()
                .and_then(|id| depths.get(id))
                .copied()
                .unwrap_or(0)
        });
    }

    fn build(
        account: &Account,
        ids: &IdMap,
        _index: &ExistingIndex,
    ) -> Result<Account, BuildError> {
        let mut out = Account {
            name: account.name.clone(),
            acct_num: account.acct_num.clone(),
            account_type: account.account_type.clone(),
            account_sub_type: account.account_sub_type.clone(),
            classification: account.classification.clone(),
            description: account.description.clone(),
            active: account.active,
            sub_account: account.sub_account,
            currency_ref: account.currency_ref.clone(),
            ..Account::default()
        };
        if let Some(parent) = &account.parent_ref {
            match ids.get(EntityType::Account, &parent.value) {
                Some(target_id) => {
                    out.parent_ref = Some(qb_types::NtRef {
                        value: target_id.to_string(),
                        name: parent.name.clone(),
                    });
                }
                None => {
                    // The parent was filtered out or failed earlier; the
                    // account is still worth creating at top level.
                    log::warn!(
                        "parent account {} not found in mapping for '{}'",
                        parent.value,
                        account.name.as_deref().unwrap_or("?")
                    );
                }
            }
        }
        Ok(out)
    }
}

fn is_stock_account(account: &Account) -> bool {
    account
        .name
        .as_deref()
        .is_some_and(|name| STOCK_ACCOUNTS.iter().any(|stock| name.contains(stock)))
}

fn hierarchy_depths(accounts: &[Account]) -> HashMap<String, usize> {
    let parents: HashMap<&str, &str> = accounts
        .iter()
        .filter_map(|account| {
            let id = account.id.as_deref()?;
            let parent = account.parent_ref.as_ref()?;
            Some((id, parent.value.as_str()))
        })
        .collect();

    let mut depths = HashMap::new();
    for account in accounts {
        let Some(id) = account.id.as_deref() else {
            continue;
        };
        let mut depth = 0;
        let mut current = id;
        // Depth cap guards against a broken parent cycle in source data.
        while let Some(parent) = parents.get(current) {
            depth += 1;
            if depth > accounts.len() {
                break;
            }
            current = parent;
        }
        depths.insert(id.to_string(), depth);
    }
    depths
}

#[cfg(test)]
mod tests {
    use qb_types::NtRef;

    use super::*;

    fn account(id: &str, name: &str, parent: Option<&str>) -> Account {
        Account {
            id: Some(id.into()),
            name: Some(name.into()),
            account_type: Some("Bank".into()),
            active: Some(true),
            parent_ref: parent.map(|value| NtRef {
                value: value.into(),
                name: None,
            }),
            ..Account::default()
        }
    }

    #[test]
    fn stock_and_inactive_accounts_are_excluded() {
        let stock = account("1", "Accounts Payable (A/P)", None);
        assert!(!AccountTransfer::include(&stock));

        let mut inactive = account("2", "Old Savings", None);
        inactive.active = Some(false);
        assert!(!AccountTransfer::include(&inactive));

        assert!(AccountTransfer::include(&account("3", "Checking", None)));
    }

    #[test]
    fn name_and_number_strategy_adds_composite_key() {
        let mut checking = account("1", "Checking", None);
        checking.acct_num = Some("1001".into());

        assert_eq!(
            AccountTransfer::keys(&checking, MatchStrategy::NameOnly),
            vec!["Checking"]
        );
        assert_eq!(
            AccountTransfer::keys(&checking, MatchStrategy::NameAndNumber),
            vec!["1001_Checking", "Checking"]
        );
    }

    #[test]
    fn parents_sort_before_children() {
        let mut accounts = vec![
            account("3", "Grandchild", Some("2")),
            account("2", "Child", Some("1")),
            account("1", "Parent", None),
        ];
        AccountTransfer::order(&mut accounts);
        let names: Vec<_> = accounts.iter().map(|a| a.name.clone().unwrap()).collect();
        assert_eq!(names, ["Parent", "Child", "Grandchild"]);
    }

    #[test]
    fn build_maps_parent_through_store() {
        let mut ids = IdMap::new();
        ids.put(EntityType::Account, "1", "101");
        let child = account("2", "Child", Some("1"));

        let payload = AccountTransfer::build(&child, &ids, &ExistingIndex::default()).unwrap();
        assert_eq!(payload.parent_ref.as_ref().unwrap().value, "101");
        assert!(payload.id.is_none(), "source id must not leak into create");
    }

    #[test]
    fn build_without_mapped_parent_drops_the_ref() {
        let child = account("2", "Child", Some("1"));
        let payload =
            AccountTransfer::build(&child, &IdMap::new(), &ExistingIndex::default()).unwrap();
        assert!(payload.parent_ref.is_none());
    }
}
