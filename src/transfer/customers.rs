//! Customer phase, keyed by display name.

use qb_types::Customer;

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::functions::query::escape_query_value;
use crate::mapping::IdMap;

pub(crate) struct CustomerTransfer;

impl TransferSpec for CustomerTransfer {
    type Entity = Customer;
    const ENTITY: EntityType = EntityType::Customer;

    fn keys(customer: &Customer, _strategy: MatchStrategy) -> Vec<String> {
        customer
            .display_name
            .clone()
            .map_or_else(Vec::new, |name| vec![name])
    }

    fn match_clause(customer: &Customer) -> Option<String> {
        let name = customer.display_name.as_deref()?;
        Some(format!(
            "WHERE DisplayName = '{}'",
            escape_query_value(name)
        ))
    }

    fn include(customer: &Customer) -> bool {
        customer.active.unwrap_or(true)
    }

    fn build(
        customer: &Customer,
        _ids: &IdMap,
        _index: &ExistingIndex,
    ) -> Result<Customer, BuildError> {
        Ok(Customer {
            display_name: customer.display_name.clone(),
            title: customer.title.clone(),
            given_name: customer.given_name.clone(),
            middle_name: customer.middle_name.clone(),
            family_name: customer.family_name.clone(),
            suffix: customer.suffix.clone(),
            company_name: customer.company_name.clone(),
            active: Some(true),
            primary_phone: customer.primary_phone.clone(),
            mobile: customer.mobile.clone(),
            primary_email_addr: customer.primary_email_addr.clone(),
            web_addr: customer.web_addr.clone(),
            bill_addr: customer.bill_addr.clone(),
            ship_addr: customer.ship_addr.clone(),
            notes: customer.notes.clone(),
            print_on_check_name: customer.print_on_check_name.clone(),
            currency_ref: customer.currency_ref.clone(),
            ..Customer::default()
        })
    }
}
