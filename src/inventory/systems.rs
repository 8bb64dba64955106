use super::{components::*, events::*};
use crate::character::components::Player;
use crate::character::events::Heal;
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::data::ItemDatabase;
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

pub fn setup_player_container(mut inventory: ResMut<InventoryManager>, config: Res<GameConfig>) {
    inventory.create_container(PLAYER, config.player_capacity);
}

/// 把脏容器转换成变更通知
pub fn flush_container_changes(
    mut inventory: ResMut<InventoryManager>,
    mut changed: EventWriter<ContainerChanged>,
) {
    if !inventory.has_pending_changes() {
        return;
    }
    for container_id in inventory.drain_changed() {
        changed.write(ContainerChanged { container_id });
    }
}

/// 处理"give"——往容器里塞物品
pub fn give_item(
    mut ev_give: EventReader<GiveItemEvent>,
    mut inventory: ResMut<InventoryManager>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
) {
    for ev in ev_give.read() {
        let Some(proto) = database.get(&ev.id) else {
            warn!("不存在物品 ID {}", ev.id);
            toast.write(ErrorToastEvent(format!("不存在物品 {}", ev.id)));
            continue;
        };

        match inventory.add_item(&ev.container, &proto.id, ev.count, proto.max_stack) {
            Ok(()) => {
                info!("{} 获得 {} ×{}", ev.container, proto.id, ev.count);
                log.write(LogEvent(format!("获得 {} ×{}", proto.name, ev.count)));
            }
            Err(err) => {
                warn!("无法获得 {}: {err}", proto.name);
                toast.write(ErrorToastEvent(format!("无法获得 {}: {err}", proto.name)));
            }
        }
    }
}

/// 打印容器内容
pub fn print_inventory(
    mut ev_list: EventReader<ListInventoryEvent>,
    mut log: EventWriter<LogEvent>,
    inventory: Res<InventoryManager>,
    database: Res<ItemDatabase>,
) {
    for ev in ev_list.read() {
        let Some(container) = inventory.container(&ev.container) else {
            let known: Vec<&str> = inventory.container_ids().collect();
            log.write(LogEvent(format!(
                "容器不存在: {}（可用: {}）",
                ev.container,
                known.join(", ")
            )));
            continue;
        };

        log.write(LogEvent(format!(
            "== {} ({}/{}) ==",
            ev.container,
            container.used_slots(),
            container.max_slots()
        )));
        for (idx, slot) in container.slots.iter().enumerate() {
            if let Some(id) = slot.item_id.as_deref().filter(|_| !slot.is_empty()) {
                log.write(LogEvent(format!(
                    "[{idx}] {} ×{} (id={id})",
                    database.display_name(id),
                    slot.quantity
                )));
            }
        }
        if container.used_slots() == 0 {
            log.write(LogEvent("  (empty)".into()));
        }
    }
}

/// 使用玩家背包中的物品
pub fn use_item(
    mut ev_use: EventReader<UseItemEvent>,
    mut inventory: ResMut<InventoryManager>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    mut heal_event: EventWriter<Heal>,
    database: Res<ItemDatabase>,
    player_query: Query<Entity, With<Player>>,
) {
    for ev in ev_use.read() {
        let Some(item_id) = inventory
            .slot(PLAYER, ev.index)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.item_id.clone())
        else {
            toast.write(ErrorToastEvent("该背包格为空".into()));
            continue;
        };
        let Some(item) = database.get(&item_id) else {
            error!("背包中存在未注册物品 {item_id}");
            continue;
        };

        // 只有药水会被消耗
        match item.item_type.as_str() {
            "potion" => {
                if let Err(err) = inventory.consume_at(PLAYER, ev.index, 1) {
                    toast.write(ErrorToastEvent(err.to_string()));
                    continue;
                }
                if item.heal > 0 {
                    log.write(LogEvent(format!("使用 {}，恢复 {} 点生命值", item.name, item.heal)));
                    if let Ok(player) = player_query.single() {
                        heal_event.write(Heal {
                            entity: player,
                            amount: item.heal,
                        });
                    }
                } else {
                    log.write(LogEvent(format!("使用 {}，但没有任何效果", item.name)));
                }
            }
            "key" => {
                log.write(LogEvent(format!("使用 {}，但这里没有门可以开启", item.name)));
            }
            _ => {
                toast.write(ErrorToastEvent(format!("{} 无法使用", item.name)));
            }
        }
    }
}

pub fn transfer_item(
    mut ev_transfer: EventReader<TransferItemEvent>,
    mut inventory: ResMut<InventoryManager>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
) {
    for ev in ev_transfer.read() {
        let max_stack = inventory
            .slot(&ev.from, ev.index)
            .and_then(|s| s.item_id.as_deref())
            .map_or(1, |id| database.max_stack(id));

        match inventory.transfer(&ev.from, &ev.to, ev.index, max_stack) {
            Ok(moved) => {
                let id = moved.item_id.as_deref().unwrap_or_default();
                log.write(LogEvent(format!(
                    "{} ×{}: {} → {}",
                    database.display_name(id),
                    moved.quantity,
                    ev.from,
                    ev.to
                )));
            }
            Err(err) => {
                warn!("搬运失败 {} → {}: {err}", ev.from, ev.to);
                toast.write(ErrorToastEvent(err.to_string()));
            }
        }
    }
}

pub fn drop_item(
    mut ev_drop: EventReader<DropItemEvent>,
    mut inventory: ResMut<InventoryManager>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
) {
    for ev in ev_drop.read() {
        match inventory.take_slot(&ev.container, ev.index) {
            Ok(slot) => {
                let id = slot.item_id.as_deref().unwrap_or_default();
                log.write(LogEvent(format!("丢弃 {} ×{}", database.display_name(id), slot.quantity)));
            }
            Err(err) => {
                toast.write(ErrorToastEvent(err.to_string()));
            }
        }
    }
}
