//! Item type definitions carrying pocket layouts
//!
//! Definitions are a JSON array of objects, each naming an item type and
//! the `item_contents` every new item of that type starts with:
//!
//! ```json
//! [
//!   { "id": "backpack", "item_contents": { "contents": [ ... ] } }
//! ]
//! ```
//!
//! A malformed entry fails the whole load, naming the definition at fault.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::aggregates::ItemContents;
use stowage_domain::{DomainError, ItemTypeId};

/// Pocket layouts keyed by item type.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentsCatalog<I> {
    layouts: BTreeMap<ItemTypeId, ItemContents<I>>,
}

impl<I> Default for ContentsCatalog<I> {
    fn default() -> Self {
        Self {
            layouts: BTreeMap::new(),
        }
    }
}

impl<I> ContentsCatalog<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layout by hand. Fails if `item_type` is already known.
    pub fn register(
        &mut self,
        item_type: ItemTypeId,
        contents: ItemContents<I>,
    ) -> Result<(), DomainError> {
        if self.layouts.contains_key(&item_type) {
            return Err(DomainError::validation(format!(
                "Duplicate contents definition '{}'",
                item_type
            )));
        }
        self.layouts.insert(item_type, contents);
        Ok(())
    }

    pub fn get(&self, item_type: &ItemTypeId) -> Option<&ItemContents<I>> {
        self.layouts.get(item_type)
    }

    pub fn contains(&self, item_type: &ItemTypeId) -> bool {
        self.layouts.contains_key(item_type)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Known item types, sorted.
    pub fn item_types(&self) -> impl Iterator<Item = &ItemTypeId> {
        self.layouts.keys()
    }
}

impl<I: DeserializeOwned> ContentsCatalog<I> {
    /// Parse a definitions document.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let entries: Vec<Value> = serde_json::from_str(json)?;
        let mut catalog = Self::new();

        for (index, mut entry) in entries.into_iter().enumerate() {
            let id = match entry.get("id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => {
                    return Err(DomainError::load(
                        format!("#{}", index),
                        "missing string field 'id'",
                    ))
                }
            };
            let item_type =
                ItemTypeId::new(id.as_str()).map_err(|err| DomainError::load(&id, err))?;

            let layout = match entry.get_mut("item_contents") {
                Some(value) => value.take(),
                None => {
                    return Err(DomainError::load(&id, "missing field 'item_contents'"));
                }
            };
            let contents: ItemContents<I> =
                serde_json::from_value(layout).map_err(|err| DomainError::load(&id, err))?;

            if catalog.contains(&item_type) {
                return Err(DomainError::load(&id, "duplicate definition"));
            }
            catalog.register(item_type, contents)?;
        }

        tracing::info!(definitions = catalog.len(), "Loaded contents definitions");
        Ok(catalog)
    }
}

impl<I: Clone> ContentsCatalog<I> {
    /// Fresh contents for a new item of `item_type`.
    pub fn instantiate(&self, item_type: &ItemTypeId) -> Result<ItemContents<I>, DomainError> {
        self.layouts
            .get(item_type)
            .cloned()
            .ok_or_else(|| DomainError::not_found("ContentsDefinition", item_type.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PocketKind;
    use crate::testing::{capture_logs, TestItem};

    const DEFINITIONS: &str = r#"[
        {
            "id": "backpack",
            "item_contents": {
                "contents": [
                    { "max_contains_volume": "15 L", "max_contains_weight": "30 kg", "moves": 300 },
                    { "max_contains_volume": "500 ml", "max_contains_weight": "1 kg", "hook": true }
                ]
            }
        },
        {
            "id": "canteen",
            "item_contents": {
                "nestable": true,
                "contents": [
                    { "max_contains_volume": "1500 ml", "max_contains_weight": "2 kg", "watertight": true, "rigid": true }
                ]
            }
        },
        { "id": "rock", "item_contents": { "contents": [] } }
    ]"#;

    fn item_type(id: &str) -> ItemTypeId {
        ItemTypeId::new(id).unwrap()
    }

    #[test]
    fn loads_every_definition() {
        let (catalog, logs) =
            capture_logs(|| ContentsCatalog::<TestItem>::from_json(DEFINITIONS).unwrap());

        assert_eq!(catalog.len(), 3);
        assert!(logs.contains("Loaded contents definitions"));

        let types: Vec<&str> = catalog.item_types().map(ItemTypeId::as_str).collect();
        assert_eq!(types, vec!["backpack", "canteen", "rock"]);

        let backpack = catalog.get(&item_type("backpack")).unwrap();
        assert_eq!(backpack.pocket_count(), 2);
        assert_eq!(backpack.pockets()[0].moves(), 300);
        assert!(backpack.pockets()[1].is_hook());
        assert!(catalog.get(&item_type("rock")).unwrap().is_empty());
    }

    #[test]
    fn instantiate_hands_out_independent_copies() {
        let catalog = ContentsCatalog::<TestItem>::from_json(DEFINITIONS).unwrap();

        let mut first = catalog.instantiate(&item_type("canteen")).unwrap();
        first.pockets_mut()[0].add(TestItem::liquid(
            "water",
            crate::testing::ml(500),
        ));
        let second = catalog.instantiate(&item_type("canteen")).unwrap();

        assert_eq!(first.num_item_stacks(), 1);
        assert_eq!(second.num_item_stacks(), 0);
        assert!(second.pockets()[0].is_type(PocketKind::Container));
    }

    #[test]
    fn unknown_type_is_not_found() {
        let catalog = ContentsCatalog::<TestItem>::from_json(DEFINITIONS).unwrap();
        let err = catalog.instantiate(&item_type("anvil")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn malformed_entry_names_the_definition() {
        let err = ContentsCatalog::<TestItem>::from_json(
            r#"[
                { "id": "ok", "item_contents": { "contents": [] } },
                { "id": "broken", "item_contents": { "contents": [ { "max_contains_volume": "1 L" } ] } }
            ]"#,
        )
        .unwrap_err();

        match err {
            DomainError::Load { definition, reason } => {
                assert_eq!(definition, "broken");
                assert!(reason.contains("max_contains_weight"));
            }
            other => panic!("expected load error, got {:?}", other),
        }
    }

    #[test]
    fn missing_fields_fail_the_load() {
        let no_id = ContentsCatalog::<TestItem>::from_json(
            r#"[ { "item_contents": { "contents": [] } } ]"#,
        );
        assert!(matches!(no_id, Err(DomainError::Load { .. })));

        let no_contents = ContentsCatalog::<TestItem>::from_json(r#"[ { "id": "empty" } ]"#);
        assert!(matches!(
            no_contents,
            Err(DomainError::Load { ref definition, .. }) if definition == "empty"
        ));
    }

    #[test]
    fn duplicate_ids_fail_the_load() {
        let err = ContentsCatalog::<TestItem>::from_json(
            r#"[
                { "id": "box", "item_contents": { "contents": [] } },
                { "id": "box", "item_contents": { "contents": [] } }
            ]"#,
        )
        .unwrap_err();

        match err {
            DomainError::Load { definition, reason } => {
                assert_eq!(definition, "box");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected load error, got {:?}", other),
        }
    }

    #[test]
    fn register_rejects_known_type() {
        let mut catalog = ContentsCatalog::<TestItem>::new();
        assert!(catalog.register(item_type("crate"), ItemContents::default()).is_ok());

        let err = catalog
            .register(item_type("crate"), ItemContents::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ContentsCatalog::<TestItem>::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }
}
