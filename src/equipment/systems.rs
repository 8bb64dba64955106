use super::{components::*, events::*};
use crate::character::events::EquipmentChanged;
use crate::core::events::LogEvent;
use crate::core::storage::PrefsStore;
use crate::data::ItemDatabase;
use crate::inventory::components::{InventoryManager, PLAYER};
use crate::panel::components::{ActionPopup, HitRect, PanelKind, PanelRoot};
use crate::panel::events::PointerPressed;
use crate::panel::systems::{under_popup, PANEL_COLOR};
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

const EQUIP_PANEL_ORIGIN: Vec2 = Vec2::new(20.0, 380.0);
const EQUIP_ROW: Vec2 = Vec2::new(180.0, 26.0);
const EQUIP_HEADER: f32 = 28.0;

fn equip_row_rect(index: usize) -> Rect {
    let min = EQUIP_PANEL_ORIGIN + Vec2::new(8.0, EQUIP_HEADER + index as f32 * (EQUIP_ROW.y + 2.0));
    Rect::from_corners(min, min + EQUIP_ROW)
}

pub fn load_equipment(
    mut equipment: ResMut<Equipment>,
    mut equipment_changed: EventWriter<EquipmentChanged>,
    prefs: Res<PrefsStore>,
    database: Res<ItemDatabase>,
) {
    *equipment = Equipment::load(&prefs, &database);
    info!("已读取装备: {}", equipment.to_json());
    equipment_changed.write(EquipmentChanged);
}

pub fn spawn_equipment_panel(mut commands: Commands) {
    let rows = EquipmentSlotType::ALL.len();
    let height = EQUIP_HEADER + rows as f32 * (EQUIP_ROW.y + 2.0) + 8.0;
    let bounds = Rect::from_corners(
        EQUIP_PANEL_ORIGIN,
        EQUIP_PANEL_ORIGIN + Vec2::new(EQUIP_ROW.x + 16.0, height),
    );

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(bounds.min.x),
                top: Val::Px(bounds.min.y),
                width: Val::Px(bounds.width()),
                height: Val::Px(bounds.height()),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            Visibility::Hidden,
            PanelRoot::closed(PanelKind::Equipment),
            HitRect(bounds),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("装备"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(8.0),
                    top: Val::Px(4.0),
                    ..default()
                },
            ));
            for (index, slot) in EquipmentSlotType::ALL.into_iter().enumerate() {
                let rect = equip_row_rect(index);
                let offset = rect.min - EQUIP_PANEL_ORIGIN;
                parent.spawn((
                    Node {
                        position_type: PositionType::Absolute,
                        left: Val::Px(offset.x),
                        top: Val::Px(offset.y),
                        width: Val::Px(EQUIP_ROW.x),
                        height: Val::Px(EQUIP_ROW.y),
                        ..default()
                    },
                    Text::new(format!("{}: 空", slot.label())),
                    TextFont {
                        font_size: 13.0,
                        ..default()
                    },
                    HitRect(rect),
                    EquipSlotWidget { slot },
                ));
            }
        });
}

/// 点击已穿戴的槽位即卸下
pub fn equipment_panel_clicks(
    mut ev_pointer: EventReader<PointerPressed>,
    mut ev_unequip: EventWriter<UnequipEvent>,
    panels: Query<&PanelRoot>,
    widgets: Query<(&EquipSlotWidget, &HitRect)>,
    popups: Query<&HitRect, With<ActionPopup>>,
    equipment: Res<Equipment>,
) {
    let open = panels
        .iter()
        .any(|root| root.kind == PanelKind::Equipment && root.open);
    for ev in ev_pointer.read() {
        if !open || under_popup(ev.position, &popups) {
            continue;
        }
        let Some((widget, _)) = widgets.iter().find(|(_, r)| r.contains(ev.position)) else {
            continue;
        };
        if equipment.get(widget.slot).is_some() {
            ev_unequip.write(UnequipEvent {
                slot: widget.slot.as_str().to_string(),
            });
        }
    }
}

pub fn equip_item(
    mut ev_equip: EventReader<EquipEvent>,
    mut ev_equip_item: EventReader<EquipItemEvent>,
    mut equipment: ResMut<Equipment>,
    mut inventory: ResMut<InventoryManager>,
    mut prefs: ResMut<PrefsStore>,
    mut equipment_changed: EventWriter<EquipmentChanged>,
    mut log_event: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
) {
    let mut requests: Vec<String> = Vec::new();
    for ev in ev_equip.read() {
        match inventory
            .slot(PLAYER, ev.index)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.item_id.clone())
        {
            Some(id) => requests.push(id),
            None => {
                toast.write(ErrorToastEvent("该背包格为空".into()));
            }
        }
    }
    requests.extend(ev_equip_item.read().map(|e| e.item_id.clone()));

    for item_id in requests {
        match equipment.equip(&item_id, &mut inventory, &database) {
            Ok(previous) => {
                equipment.save(&mut prefs);
                if let Some(previous) = previous {
                    log_event.write(LogEvent(format!("已卸下 {}", database.display_name(&previous))));
                }
                log_event.write(LogEvent(format!("已装备 {}", database.display_name(&item_id))));
                equipment_changed.write(EquipmentChanged);
            }
            Err(err) => {
                warn!("装备 {item_id} 失败: {err}");
                toast.write(ErrorToastEvent(format!("装备失败: {err}")));
            }
        }
    }
}

/// 卸下装备
pub fn unequip_item(
    mut ev_unequip: EventReader<UnequipEvent>,
    mut equipment: ResMut<Equipment>,
    mut inventory: ResMut<InventoryManager>,
    mut prefs: ResMut<PrefsStore>,
    mut equipment_changed: EventWriter<EquipmentChanged>,
    mut log_event: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
) {
    for ev in ev_unequip.read() {
        let Some(slot) = EquipmentSlotType::parse(&ev.slot) else {
            toast.write(ErrorToastEvent(format!("未知装备槽: {}", ev.slot)));
            continue;
        };

        match equipment.unequip(slot, &mut inventory, &database) {
            Ok(item_id) => {
                equipment.save(&mut prefs);
                log_event.write(LogEvent(format!(
                    "已卸下 {}: {}",
                    slot.label(),
                    database.display_name(&item_id)
                )));
                equipment_changed.write(EquipmentChanged);
            }
            Err(err) => {
                warn!("卸下 {} 失败: {err}", slot.as_str());
                toast.write(ErrorToastEvent(err.to_string()));
            }
        }
    }
}

pub fn refresh_equipment_panel(
    mut widgets: Query<(&EquipSlotWidget, &mut Text)>,
    equipment: Res<Equipment>,
    database: Res<ItemDatabase>,
) {
    if !equipment.is_changed() && !database.is_changed() {
        return;
    }
    for (widget, mut text) in &mut widgets {
        let name = equipment
            .get(widget.slot)
            .map_or("空", |id| database.display_name(id));
        text.0 = format!("{}: {}", widget.slot.label(), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_database;

    fn app() -> App {
        let mut app = App::new();
        let mut inventory = InventoryManager::default();
        inventory.create_container(PLAYER, 4);
        inventory.add_item(PLAYER, "herb", 2, 99).unwrap();
        inventory.add_item(PLAYER, "iron_helm", 1, 1).unwrap();
        app.insert_resource(inventory)
            .insert_resource(sample_database())
            .insert_resource(PrefsStore::in_memory())
            .init_resource::<Equipment>()
            .add_event::<EquipEvent>()
            .add_event::<EquipItemEvent>()
            .add_event::<UnequipEvent>()
            .add_event::<EquipmentChanged>()
            .add_event::<LogEvent>()
            .add_event::<ErrorToastEvent>()
            .add_systems(Update, (equip_item, unequip_item).chain());
        app
    }

    fn changed_count(app: &App) -> usize {
        app.world()
            .resource::<Events<EquipmentChanged>>()
            .iter_current_update_events()
            .count()
    }

    #[test]
    fn equip_by_slot_index_persists_the_mapping() {
        let mut app = app();
        app.world_mut().send_event(EquipEvent { index: 1 });
        app.update();

        let equipment = app.world().resource::<Equipment>();
        assert_eq!(equipment.get(EquipmentSlotType::Helmet), Some("iron_helm"));
        let prefs = app.world().resource::<PrefsStore>();
        assert_eq!(prefs.get_string(EQUIPPED_KEY), Some(r#"{"helmet":"iron_helm"}"#));
        assert_eq!(changed_count(&app), 1);
    }

    #[test]
    fn failures_toast_and_leave_state_alone() {
        let mut app = app();
        app.world_mut().send_event(EquipEvent { index: 0 });
        app.world_mut().send_event(EquipEvent { index: 3 });
        app.world_mut().send_event(UnequipEvent { slot: "ring".into() });
        app.update();

        let toasts = app
            .world()
            .resource::<Events<ErrorToastEvent>>()
            .iter_current_update_events()
            .count();
        assert_eq!(toasts, 3);
        assert_eq!(changed_count(&app), 0);
        assert_eq!(app.world().resource::<Equipment>(), &Equipment::default());
    }

    #[test]
    fn unequip_by_name_returns_the_item() {
        let mut app = app();
        app.world_mut().send_event(EquipItemEvent {
            item_id: "iron_helm".into(),
        });
        app.update();
        app.world_mut().send_event(UnequipEvent {
            slot: "Helmet".into(),
        });
        app.update();

        let inventory = app.world().resource::<InventoryManager>();
        assert!(inventory.has_item(PLAYER, "iron_helm"));
        let prefs = app.world().resource::<PrefsStore>();
        assert_eq!(prefs.get_string(EQUIPPED_KEY), Some("{}"));
    }
}
