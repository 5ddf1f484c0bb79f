//! Tracking-class phase.
//!
//! Classes form a hierarchy expressed through colon-separated
//! fully-qualified names ("Region:West"). Parents are created first and a
//! sub-class resolves its parent by the leading segments of its
//! fully-qualified name against the target index.

use qb_types::Class;

use super::{BuildError, EntityType, ExistingIndex, TransferSpec};
use crate::config::MatchStrategy;
use crate::functions::query::escape_query_value;
use crate::mapping::IdMap;

pub(crate) struct ClassTransfer;

fn qualified_name(class: &Class) -> Option<String> {
    class
        .fully_qualified_name
        .clone()
        .or_else(|| class.name.clone())
}

fn hierarchy_level(class: &Class) -> usize {
    qualified_name(class).map_or(0, |name| name.split(':').count())
}

impl TransferSpec for ClassTransfer {
    type Entity = Class;
    const ENTITY: EntityType = EntityType::Class;

    fn keys(class: &Class, _strategy: MatchStrategy) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(qualified) = qualified_name(class) {
            keys.push(qualified);
        }
        if let Some(name) = &class.name {
            if !keys.contains(name) {
                keys.push(name.clone());
            }
        }
        keys
    }

    fn match_clause(class: &Class) -> Option<String> {
        let qualified = qualified_name(class)?;
        Some(format!(
            "WHERE FullyQualifiedName = '{}'",
            escape_query_value(&qualified)
        ))
    }

    fn include(class: &Class) -> bool {
        class.active.unwrap_or(true)
    }

    /// Shallow levels first so parents exist before their sub-classes.
    fn order(classes: &mut [Class]) {
        classes.sort_by_key(hierarchy_level);
    }

    fn build(class: &Class, _ids: &IdMap, index: &ExistingIndex) -> Result<Class, BuildError> {
        let mut out = Class {
            name: class.name.clone(),
            sub_class: class.sub_class,
            active: class.active,
            ..Class::default()
        };
        if let Some(qualified) = qualified_name(class) {
            if let Some((parent_name, _)) = qualified.rsplit_once(':') {
                match index.get(parent_name) {
                    Some(parent_id) => {
                        out.parent_ref = Some(qb_types::NtRef {
                            value: parent_id.to_string(),
                            name: Some(parent_name.to_string()),
                        });
                    }
                    None => {
                        // Left for the API to decide; a sub-class without
                        // parent comes back as a validation fault and is
                        // recorded against this record.
                        log::warn!(
                            "parent class '{parent_name}' not found in target for '{qualified}'"
                        );
                    }
                }
            }
        }
        Ok(out)
    }
}
