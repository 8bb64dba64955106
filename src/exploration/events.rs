use bevy::prelude::*;

#[derive(Event, Debug, Clone)]
pub struct StartExplorationEvent {
    pub area: String,
}

/// 跳过等待，立刻揭晓下一行
#[derive(Event, Debug, Default)]
pub struct StepExplorationEvent;

#[derive(Event, Debug, Default)]
pub struct CollectExplorationEvent;
