use bevy::prelude::*;

/// 容器内容变更通知，每帧每个容器最多一条
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ContainerChanged {
    pub container_id: String,
}

#[derive(Event)]
pub struct GiveItemEvent {
    pub container: String,
    pub id:        String,
    pub count:     u32,
}

#[derive(Event)]
pub struct ListInventoryEvent {
    pub container: String,
}

/// 使用玩家背包中的物品
#[derive(Event)]
pub struct UseItemEvent {
    pub index: usize,
}

/// 整格搬运（存入 / 取出银行）
#[derive(Event)]
pub struct TransferItemEvent {
    pub from:  String,
    pub to:    String,
    pub index: usize,
}

#[derive(Event)]
pub struct DropItemEvent {
    pub container: String,
    pub index:     usize,
}
