//! Data models for the `QuickBooks` Online v3 accounting API.
//!
//! Only the resources the migration tool moves are modelled: Account,
//! Employee, Customer, Class, Vendor and `JournalEntry`, plus the shared
//! reference and contact types they embed. Wire names are `QuickBooks`'
//! PascalCase; every field `QuickBooks` may omit is an `Option` and is
//! skipped on serialization when absent, so partially-filled objects
//! round-trip as sparse create payloads.

use serde::{de::DeserializeOwned, Serialize};

/// A resource that can be read from and written to the `QuickBooks` API.
pub trait QBItem: Clone + Default + std::fmt::Debug + Serialize + DeserializeOwned {
    fn id(&self) -> Option<&String>;
    fn sync_token(&self) -> Option<&String>;
    fn meta_data(&self) -> Option<&MetaData>;
    /// Resource name as it appears in queries and response envelopes.
    fn name() -> &'static str;
    /// Path segment of the resource endpoint.
    fn qb_id() -> &'static str;
}

/// A resource that can be sent to the create endpoint. `can_create`
/// checks the fields `QuickBooks` rejects a create without.
pub trait QBCreatable: QBItem {
    fn can_create(&self) -> bool;
}

macro_rules! impl_qb_item {
    ($ty:ty, $name:literal, $qb_id:literal) => {
        impl crate::QBItem for $ty {
            fn id(&self) -> Option<&String> {
                self.id.as_ref()
            }
            fn sync_token(&self) -> Option<&String> {
                self.sync_token.as_ref()
            }
            fn meta_data(&self) -> Option<&crate::MetaData> {
                self.meta_data.as_ref()
            }
            fn name() -> &'static str {
                $name
            }
            fn qb_id() -> &'static str {
                $qb_id
            }
        }
    };
}
pub(crate) use impl_qb_item;

mod account;
mod class;
mod common;
mod customer;
mod employee;
mod journal_entry;
mod vendor;

pub use account::Account;
pub use class::Class;
pub use common::{Addr, Email, MetaData, NtRef, PhoneNumber, WebsiteAddr};
pub use customer::Customer;
pub use employee::Employee;
pub use journal_entry::{
    JournalEntity, JournalEntityType, JournalEntry, JournalEntryLine, JournalEntryLineDetail,
    PostingType,
};
pub use vendor::Vendor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_match_endpoints() {
        assert_eq!(Account::name(), "Account");
        assert_eq!(Account::qb_id(), "account");
        assert_eq!(JournalEntry::name(), "JournalEntry");
        assert_eq!(JournalEntry::qb_id(), "journalentry");
        assert_eq!(Class::qb_id(), "class");
    }
}
