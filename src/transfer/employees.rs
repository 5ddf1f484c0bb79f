//! Employee phase. Employees are matched by "Given Family" name, the way
//! `QuickBooks` displays them; there is no reliable queryable key, so
//! matching is index-only.

use qb_types::Employee;

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::mapping::IdMap;

pub(crate) struct EmployeeTransfer;

pub(crate) fn full_name(employee: &Employee) -> String {
    let given = employee.given_name.as_deref().unwrap_or("");
    let family = employee.family_name.as_deref().unwrap_or("");
    format!("{given} {family}").trim().to_string()
}

impl TransferSpec for EmployeeTransfer {
    type Entity = Employee;
    const ENTITY: EntityType = EntityType::Employee;

    fn keys(employee: &Employee, _strategy: MatchStrategy) -> Vec<String> {
        let name = full_name(employee);
        if name.is_empty() {
            employee
                .display_name
                .clone()
                .map_or_else(Vec::new, |display| vec![display])
        } else {
            vec![name]
        }
    }

    fn include(employee: &Employee) -> bool {
        employee.active == Some(true)
    }

    fn build(
        employee: &Employee,
        _ids: &IdMap,
        _index: &ExistingIndex,
    ) -> Result<Employee, BuildError> {
        Ok(Employee {
            given_name: employee.given_name.clone(),
            middle_name: employee.middle_name.clone(),
            family_name: employee.family_name.clone(),
            suffix: employee.suffix.clone(),
            display_name: employee.display_name.clone(),
            print_on_check_name: employee.print_on_check_name.clone(),
            active: employee.active,
            primary_phone: employee.primary_phone.clone(),
            mobile: employee.mobile.clone(),
            primary_email_addr: employee.primary_email_addr.clone(),
            employee_number: employee.employee_number.clone(),
            hired_date: employee.hired_date,
            released_date: employee.released_date,
            billable_time: employee.billable_time,
            bill_rate: employee.bill_rate,
            primary_addr: employee.primary_addr.clone(),
            ..Employee::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_given_plus_family() {
        let employee = Employee {
            id: Some("55".into()),
            given_name: Some("Jane".into()),
            family_name: Some("Doe".into()),
            active: Some(true),
            ..Employee::default()
        };
        assert_eq!(
            EmployeeTransfer::keys(&employee, MatchStrategy::NameOnly),
            vec!["Jane Doe"]
        );
    }

    #[test]
    fn display_name_is_the_fallback_key() {
        let employee = Employee {
            display_name: Some("J. Doe".into()),
            ..Employee::default()
        };
        assert_eq!(
            EmployeeTransfer::keys(&employee, MatchStrategy::NameOnly),
            vec!["J. Doe"]
        );
        assert!(EmployeeTransfer::keys(&Employee::default(), MatchStrategy::NameOnly).is_empty());
    }
}
