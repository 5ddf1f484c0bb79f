//! Vendor phase, keyed by display name.

use qb_types::Vendor;

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::functions::query::escape_query_value;
use crate::mapping::IdMap;

pub(crate) struct VendorTransfer;

impl TransferSpec for VendorTransfer {
    type Entity = Vendor;
    const ENTITY: EntityType = EntityType::Vendor;

    fn keys(vendor: &Vendor, _strategy: MatchStrategy) -> Vec<String> {
        vendor
            .display_name
            .clone()
            .map_or_else(Vec::new, |name| vec![name])
    }

    fn match_clause(vendor: &Vendor) -> Option<String> {
        let name = vendor.display_name.as_deref()?;
        Some(format!(
            "WHERE DisplayName = '{}'",
            escape_query_value(name)
        ))
    }

    fn build(
        vendor: &Vendor,
        _ids: &IdMap,
        _index: &ExistingIndex,
    ) -> Result<Vendor, BuildError> {
        Ok(Vendor {
            display_name: vendor.display_name.clone(),
            title: vendor.title.clone(),
            given_name: vendor.given_name.clone(),
            middle_name: vendor.middle_name.clone(),
            family_name: vendor.family_name.clone(),
            suffix: vendor.suffix.clone(),
            company_name: vendor.company_name.clone(),
            active: vendor.active,
            primary_phone: vendor.primary_phone.clone(),
            mobile: vendor.mobile.clone(),
            primary_email_addr: vendor.primary_email_addr.clone(),
            web_addr: vendor.web_addr.clone(),
            bill_addr: vendor.bill_addr.clone(),
            tax_identifier: vendor.tax_identifier.clone(),
            acct_num: vendor.acct_num.clone(),
            print_on_check_name: vendor.print_on_check_name.clone(),
            currency_ref: vendor.currency_ref.clone(),
            ..Vendor::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendors_are_not_filtered_by_active_flag() {
        let inactive = Vendor {
            display_name: Some("Mothballed Supplies".into()),
            active: Some(false),
            ..Vendor::default()
        };
        assert!(VendorTransfer::include(&inactive));
    }

    #[test]
    fn build_drops_source_identity() {
        let vendor = Vendor {
            id: Some("7".into()),
            sync_token: Some("3".into()),
            display_name: Some("Acme Corp".into()),
            company_name: Some("Acme Corporation".into()),
            ..Vendor::default()
        };
        let payload = VendorTransfer::build(&vendor, &IdMap::new(), &ExistingIndex::default()).unwrap();
        assert!(payload.id.is_none());
        assert!(payload.sync_token.is_none());
        assert_eq!(payload.display_name.as_deref(), Some("Acme Corp"));
    }
}
