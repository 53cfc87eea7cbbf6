use std::collections::BTreeMap;

use crate::types::{ItemCategory, ItemDefinition};

/// Item definitions keyed by category. A category without a definition
/// cannot be spawned.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    items: BTreeMap<ItemCategory, ItemDefinition>,
}

impl ItemCatalog {
    pub fn new(definitions: &[ItemDefinition]) -> Self {
        let mut items = BTreeMap::new();
        for definition in definitions {
            if items.insert(definition.category, *definition).is_some() {
                log::warn!(
                    "[catalog] duplicate definition for {}; keeping the last one",
                    definition.category.key()
                );
            }
        }
        Self { items }
    }

    pub fn get(&self, category: ItemCategory) -> Option<ItemDefinition> {
        self.items.get(&category).copied()
    }

    pub fn remove(&mut self, category: ItemCategory) -> Option<ItemDefinition> {
        self.items.remove(&category)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_items;

    #[test]
    fn default_items_cover_every_category() {
        let catalog = ItemCatalog::new(&default_items());
        for category in ItemCategory::ALL {
            assert_eq!(catalog.get(category).map(|item| item.category), Some(category));
        }
    }

    #[test]
    fn later_duplicate_wins() {
        let catalog = ItemCatalog::new(&[
            ItemDefinition {
                category: ItemCategory::Gold,
                amount: 1,
            },
            ItemDefinition {
                category: ItemCategory::Gold,
                amount: 9,
            },
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(ItemCategory::Gold).map(|item| item.amount), Some(9));
        assert!(catalog.get(ItemCategory::Fuel).is_none());
    }
}
