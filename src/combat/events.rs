use bevy::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemySpec {
    pub name: String,
    pub level: u32,
}

/// 开始一场遭遇，替换掉当前所有敌人
#[derive(Event, Debug, Clone)]
pub struct StartEncounterEvent {
    pub enemies: Vec<EnemySpec>,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct DamageEnemyEvent {
    pub index: usize,
    pub amount: i32,
}

#[derive(Event, Debug, Default)]
pub struct EndEncounterEvent;
