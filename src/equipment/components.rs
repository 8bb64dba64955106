use bevy::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::storage::PrefsStore;
use crate::data::ItemDatabase;
use crate::inventory::components::{InventoryError, InventoryManager, PLAYER};

pub const EQUIPPED_KEY: &str = "equipped_items";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlotType {
    Weapon,
    Helmet,
    Legs,
    Boots,
    Backpack,
}

impl EquipmentSlotType {
    pub const ALL: [EquipmentSlotType; 5] = [
        EquipmentSlotType::Weapon,
        EquipmentSlotType::Helmet,
        EquipmentSlotType::Legs,
        EquipmentSlotType::Boots,
        EquipmentSlotType::Backpack,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentSlotType::Weapon => "weapon",
            EquipmentSlotType::Helmet => "helmet",
            EquipmentSlotType::Legs => "legs",
            EquipmentSlotType::Boots => "boots",
            EquipmentSlotType::Backpack => "backpack",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EquipmentSlotType::Weapon => "武器",
            EquipmentSlotType::Helmet => "头盔",
            EquipmentSlotType::Legs => "护腿",
            EquipmentSlotType::Boots => "靴子",
            EquipmentSlotType::Backpack => "背包",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EquipError {
    #[error("不存在物品 {0}")]
    UnknownItem(String),
    #[error("{0} 不是装备")]
    NotEquipment(String),
    #[error("背包里没有 {0}")]
    NotOwned(String),
    #[error("未知装备槽: {0}")]
    InvalidSlot(String),
    #[error("{} 槽位为空", .0.label())]
    SlotEmpty(EquipmentSlotType),
    #[error("背包已满，无法卸下装备")]
    ContainerFull,
    #[error(transparent)]
    Inventory(InventoryError),
}

impl From<InventoryError> for EquipError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ContainerFull { .. } => EquipError::ContainerFull,
            other => EquipError::Inventory(other),
        }
    }
}

/// 每个装备槽最多一件，记录物品 id
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    items: BTreeMap<EquipmentSlotType, String>,
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlotType) -> Option<&str> {
        self.items.get(&slot).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipmentSlotType, &str)> {
        self.items.iter().map(|(slot, id)| (*slot, id.as_str()))
    }

    /// 从背包穿上装备；槽位已有装备时先放回背包。返回被换下的物品 id
    pub fn equip(
        &mut self,
        item_id: &str,
        inventory: &mut InventoryManager,
        database: &ItemDatabase,
    ) -> Result<Option<String>, EquipError> {
        let entry = database
            .get(item_id)
            .ok_or_else(|| EquipError::UnknownItem(item_id.to_string()))?;
        let slot_name = entry
            .equip_slot
            .as_deref()
            .ok_or_else(|| EquipError::NotEquipment(entry.name.clone()))?;
        let slot = EquipmentSlotType::parse(slot_name)
            .ok_or_else(|| EquipError::InvalidSlot(slot_name.to_string()))?;
        if !inventory.has_item(PLAYER, &entry.id) {
            return Err(EquipError::NotOwned(entry.name.clone()));
        }

        let previous = self.items.get(&slot).cloned();
        if let Some(current) = &previous {
            inventory.add_item(PLAYER, current, 1, database.max_stack(current))?;
        }
        inventory.remove_item(PLAYER, &entry.id, 1)?;
        self.items.insert(slot, entry.id.clone());
        Ok(previous)
    }

    /// 卸下装备放回背包；背包满时保持原样
    pub fn unequip(
        &mut self,
        slot: EquipmentSlotType,
        inventory: &mut InventoryManager,
        database: &ItemDatabase,
    ) -> Result<String, EquipError> {
        let item_id = self.items.get(&slot).ok_or(EquipError::SlotEmpty(slot))?;
        inventory.add_item(PLAYER, item_id, 1, database.max_stack(item_id))?;
        Ok(self.items.remove(&slot).unwrap_or_default())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "{}".into())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self {
            items: serde_json::from_str(json)?,
        })
    }

    pub fn save(&self, prefs: &mut PrefsStore) {
        prefs.set_string(EQUIPPED_KEY, self.to_json());
        prefs.flush();
    }

    /// 读档并丢弃与物品表不符的条目
    pub fn load(prefs: &PrefsStore, database: &ItemDatabase) -> Self {
        let Some(json) = prefs.get_string(EQUIPPED_KEY) else {
            return Self::default();
        };
        let mut equipment = match Self::from_json(json) {
            Ok(equipment) => equipment,
            Err(err) => {
                warn!("装备存档损坏，已忽略: {err}");
                return Self::default();
            }
        };
        equipment.items.retain(|slot, id| {
            let valid = database
                .get(id)
                .and_then(|e| e.equip_slot.as_deref())
                .and_then(EquipmentSlotType::parse)
                == Some(*slot);
            if !valid {
                warn!("存档中的装备 {id} 与 {} 槽不符，已忽略", slot.as_str());
            }
            valid
        });
        equipment
    }
}

/// 装备面板里的单个槽位
#[derive(Component, Debug, Clone, Copy)]
pub struct EquipSlotWidget {
    pub slot: EquipmentSlotType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_database;

    fn setup(capacity: usize) -> (Equipment, InventoryManager, ItemDatabase) {
        let mut inventory = InventoryManager::default();
        inventory.create_container(PLAYER, capacity);
        (Equipment::default(), inventory, sample_database())
    }

    #[test]
    fn equip_then_unequip_restores_the_container() {
        let (mut equipment, mut inventory, db) = setup(4);
        inventory.add_item(PLAYER, "iron_sword", 1, 1).unwrap();
        inventory.add_item(PLAYER, "herb", 3, 99).unwrap();
        let before = inventory.container(PLAYER).unwrap().clone();

        assert_eq!(equipment.equip("iron_sword", &mut inventory, &db), Ok(None));
        assert_eq!(equipment.get(EquipmentSlotType::Weapon), Some("iron_sword"));
        assert!(!inventory.has_item(PLAYER, "iron_sword"));

        let returned = equipment
            .unequip(EquipmentSlotType::Weapon, &mut inventory, &db)
            .unwrap();
        assert_eq!(returned, "iron_sword");
        assert_eq!(inventory.container(PLAYER).unwrap(), &before);
        assert_eq!(equipment.get(EquipmentSlotType::Weapon), None);
    }

    #[test]
    fn equipping_an_unowned_item_fails_without_changes() {
        let (mut equipment, mut inventory, db) = setup(4);
        inventory.add_item(PLAYER, "herb", 1, 99).unwrap();
        let before = inventory.container(PLAYER).unwrap().clone();

        let err = equipment.equip("iron_sword", &mut inventory, &db).unwrap_err();
        assert!(matches!(err, EquipError::NotOwned(_)));
        assert_eq!(inventory.container(PLAYER).unwrap(), &before);
        assert_eq!(equipment, Equipment::default());
    }

    #[test]
    fn non_equipment_is_rejected() {
        let (mut equipment, mut inventory, db) = setup(4);
        inventory.add_item(PLAYER, "potion", 1, 20).unwrap();
        assert!(matches!(
            equipment.equip("potion", &mut inventory, &db),
            Err(EquipError::NotEquipment(_))
        ));
        assert!(matches!(
            equipment.equip("nothing", &mut inventory, &db),
            Err(EquipError::UnknownItem(_))
        ));
    }

    #[test]
    fn equipping_over_an_occupant_swaps_it_back() {
        let (mut equipment, mut inventory, db) = setup(2);
        inventory.add_item(PLAYER, "wood_sword", 1, 1).unwrap();
        inventory.add_item(PLAYER, "iron_sword", 1, 1).unwrap();
        equipment.equip("wood_sword", &mut inventory, &db).unwrap();

        let previous = equipment.equip("iron_sword", &mut inventory, &db).unwrap();
        assert_eq!(previous.as_deref(), Some("wood_sword"));
        assert_eq!(equipment.get(EquipmentSlotType::Weapon), Some("iron_sword"));
        assert!(inventory.has_item(PLAYER, "wood_sword"));
        assert!(!inventory.has_item(PLAYER, "iron_sword"));
    }

    #[test]
    fn full_container_blocks_the_swap() {
        let (mut equipment, mut inventory, db) = setup(1);
        inventory.add_item(PLAYER, "wood_sword", 1, 1).unwrap();
        equipment.equip("wood_sword", &mut inventory, &db).unwrap();
        inventory.add_item(PLAYER, "iron_sword", 1, 1).unwrap();

        assert_eq!(
            equipment.equip("iron_sword", &mut inventory, &db),
            Err(EquipError::ContainerFull)
        );
        assert_eq!(equipment.get(EquipmentSlotType::Weapon), Some("wood_sword"));
        assert!(inventory.has_item(PLAYER, "iron_sword"));
    }

    #[test]
    fn unequip_fails_on_empty_slot_or_full_container() {
        let (mut equipment, mut inventory, db) = setup(1);
        assert_eq!(
            equipment.unequip(EquipmentSlotType::Boots, &mut inventory, &db),
            Err(EquipError::SlotEmpty(EquipmentSlotType::Boots))
        );

        inventory.add_item(PLAYER, "leather_boots", 1, 1).unwrap();
        equipment.equip("leather_boots", &mut inventory, &db).unwrap();
        inventory.add_item(PLAYER, "herb", 1, 99).unwrap();
        assert_eq!(
            equipment.unequip(EquipmentSlotType::Boots, &mut inventory, &db),
            Err(EquipError::ContainerFull)
        );
        assert_eq!(equipment.get(EquipmentSlotType::Boots), Some("leather_boots"));
    }

    #[test]
    fn persisted_equipment_drops_mismatched_entries() {
        let db = sample_database();
        let mut prefs = PrefsStore::in_memory();
        prefs.set_string(
            EQUIPPED_KEY,
            r#"{"weapon":"iron_sword","helmet":"potion","boots":"ghost"}"#,
        );
        let equipment = Equipment::load(&prefs, &db);
        assert_eq!(
            equipment.iter().collect::<Vec<_>>(),
            vec![(EquipmentSlotType::Weapon, "iron_sword")]
        );

        let mut saved = PrefsStore::in_memory();
        equipment.save(&mut saved);
        assert_eq!(saved.get_string(EQUIPPED_KEY), Some(r#"{"weapon":"iron_sword"}"#));
    }

    #[test]
    fn slot_names_parse_case_insensitively() {
        assert_eq!(EquipmentSlotType::parse("HELMET"), Some(EquipmentSlotType::Helmet));
        assert_eq!(EquipmentSlotType::parse("ring"), None);
    }
}
