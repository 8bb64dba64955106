use bevy::prelude::*;

/// 装备玩家背包中第 index 格的物品
#[derive(Event, Debug, Clone, Copy)]
pub struct EquipEvent {
    pub index: usize,
}

/// 按物品 id 装备
#[derive(Event, Debug, Clone)]
pub struct EquipItemEvent {
    pub item_id: String,
}

#[derive(Event, Debug, Clone)]
pub struct UnequipEvent {
    pub slot: String, // weapon / helmet / legs / boots / backpack
}
