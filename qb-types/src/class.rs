use serde::{Deserialize, Serialize};

use crate::{impl_qb_item, MetaData, NtRef, QBCreatable};

/// Tracking class. Sub-classes carry a colon-separated
/// `fully_qualified_name` ("Parent:Child") and a `parent_ref`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Class {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_class: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<NtRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl_qb_item!(Class, "Class", "class");

impl QBCreatable for Class {
    fn can_create(&self) -> bool {
        self.name.is_some()
    }
}
