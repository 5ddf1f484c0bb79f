use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{impl_qb_item, Addr, Email, MetaData, PhoneNumber, QBCreatable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Employee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_on_check_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<PhoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_addr: Option<Addr>,
}

impl_qb_item!(Employee, "Employee", "employee");

impl QBCreatable for Employee {
    // QuickBooks derives DisplayName when only the name parts are given,
    // but at least one naming field has to be present.
    fn can_create(&self) -> bool {
        self.given_name.is_some() || self.family_name.is_some() || self.display_name.is_some()
    }
}
