use bevy::prelude::*;

/// 装备变更事件 - 触发属性重新计算
#[derive(Event, Debug, Default)]
pub struct EquipmentChanged;

/// 获得经验事件
#[derive(Event)]
pub struct GainExp {
    pub entity: Entity,
    pub amount: i32,
}

/// 治疗事件
#[derive(Event)]
pub struct Heal {
    pub entity: Entity,
    pub amount: i32,
}

/// 显示属性事件（用于命令行）
#[derive(Event)]
pub struct ShowStats;
