use bevy::asset::Asset;
use bevy::reflect::TypePath;
use serde_derive::Deserialize;

fn default_stack() -> u32 {
    1
}

/// 静态物品表条目
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ItemEntry {
    pub id: String,
    pub name: String,
    pub item_type: String,
    /// weapon / helmet / legs / boots / backpack，非装备为 None
    #[serde(default)]
    pub equip_slot: Option<String>,
    #[serde(default = "default_stack")]
    pub max_stack: u32,
    #[serde(default)] pub atk: i32,
    #[serde(default)] pub def: i32,
    #[serde(default)] pub max_hp: i32,
    #[serde(default)] pub heal: i32,
}

impl ItemEntry {
    pub fn is_equipment(&self) -> bool {
        self.equip_slot.is_some()
    }
}

#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct ItemList {
    pub items: Vec<ItemEntry>,
}
