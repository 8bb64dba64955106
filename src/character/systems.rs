use super::{components::*, events::*};
use crate::core::events::LogEvent;
use crate::data::ItemDatabase;
use crate::equipment::components::Equipment;
use crate::panel::components::{HitRect, PanelKind, PanelRoot};
use crate::panel::systems::PANEL_COLOR;
use bevy::prelude::*;

const CHARACTER_PANEL_ORIGIN: Vec2 = Vec2::new(220.0, 380.0);
const CHARACTER_PANEL_SIZE: Vec2 = Vec2::new(200.0, 130.0);

/// 初始化玩家实体
pub fn spawn_player(mut commands: Commands) {
    let stats = Stats::default();
    let base_stats = BaseStats::from(&stats);

    commands.spawn((Player, stats, base_stats));
}

pub fn spawn_character_panel(mut commands: Commands, player_query: Query<&Stats, With<Player>>) {
    let text = player_query
        .single()
        .map(Stats::panel_text)
        .unwrap_or_default();
    let bounds = Rect::from_corners(
        CHARACTER_PANEL_ORIGIN,
        CHARACTER_PANEL_ORIGIN + CHARACTER_PANEL_SIZE,
    );

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(bounds.min.x),
                top: Val::Px(bounds.min.y),
                width: Val::Px(bounds.width()),
                height: Val::Px(bounds.height()),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(8.0)),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            Visibility::Hidden,
            PanelRoot::closed(PanelKind::Character),
            HitRect(bounds),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("角色"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
            ));
            parent.spawn((
                Text::new(text),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                CharacterPanelText,
            ));
        });
}

/// 处理获得经验事件
pub fn handle_gain_exp(
    mut ev_gain_exp: EventReader<GainExp>,
    mut ev_log: EventWriter<LogEvent>,
    mut player_query: Query<(&mut Stats, &mut BaseStats), With<Player>>,
) {
    for ev in ev_gain_exp.read() {
        let Ok((mut stats, mut base_stats)) = player_query.get_mut(ev.entity) else {
            warn!("经验目标不是玩家: {:?}", ev.entity);
            continue;
        };
        let old_level = stats.lv;
        stats.gain_exp(ev.amount);
        ev_log.write(LogEvent(format!("获得 {} 经验", ev.amount)));

        if stats.lv > old_level {
            // 升级加成计入基础属性
            let gained = stats.lv - old_level;
            base_stats.max_hp += 2 * gained;
            base_stats.atk += gained;
            base_stats.def += gained;
            ev_log.write(LogEvent(format!(
                "升级！等级 {} → {}，生命值 +2，攻击力 +1，防御力 +1",
                old_level, stats.lv
            )));
        }
    }
}

/// 处理治疗事件
pub fn handle_heal(
    mut ev_heal: EventReader<Heal>,
    mut ev_log: EventWriter<LogEvent>,
    mut player_query: Query<&mut Stats, With<Player>>,
) {
    for ev in ev_heal.read() {
        let Ok(mut stats) = player_query.get_mut(ev.entity) else {
            continue;
        };
        let old_hp = stats.hp;
        stats.heal(ev.amount);
        let healed = stats.hp - old_hp;

        if healed > 0 {
            ev_log.write(LogEvent(format!(
                "恢复 {} 点生命值，当前生命值：{}/{}",
                healed, stats.hp, stats.max_hp
            )));
        }
    }
}

/// 装备变化后重新计算属性（基础属性 + 装备加成）
pub fn recalculate_stats(
    mut ev_equipment_changed: EventReader<EquipmentChanged>,
    mut stats_query: Query<(&mut Stats, &BaseStats), With<Player>>,
    equipment: Res<Equipment>,
    database: Res<ItemDatabase>,
) {
    if ev_equipment_changed.read().count() == 0 {
        return;
    }

    for (mut stats, base_stats) in &mut stats_query {
        let current_hp = stats.hp;
        let old_max_hp = stats.max_hp;
        stats.max_hp = base_stats.max_hp;
        stats.atk = base_stats.atk;
        stats.def = base_stats.def;

        for (_, item_id) in equipment.iter() {
            let Some(item) = database.get(item_id) else {
                warn!("装备中存在未注册物品 {item_id}");
                continue;
            };
            stats.max_hp += item.max_hp;
            stats.atk += item.atk;
            stats.def += item.def;
        }

        // 最大生命值提高时按比例恢复
        if stats.max_hp > old_max_hp && old_max_hp > 0 {
            let hp_ratio = current_hp as f32 / old_max_hp as f32;
            stats.hp = ((stats.max_hp as f32 * hp_ratio).ceil() as i32).min(stats.max_hp);
        } else {
            stats.hp = current_hp.min(stats.max_hp);
        }
    }
}

/// 显示属性信息
pub fn show_stats(
    mut ev_show_stats: EventReader<ShowStats>,
    mut ev_log: EventWriter<LogEvent>,
    player_query: Query<&Stats, With<Player>>,
) {
    for _ in ev_show_stats.read() {
        match player_query.single() {
            Ok(stats) => {
                ev_log.write(LogEvent(format!(
                    "=== 角色属性 ===\n{}\n================",
                    stats.panel_text()
                )));
            }
            Err(_) => {
                ev_log.write(LogEvent("未找到角色属性".to_string()));
            }
        }
    }
}

pub fn refresh_character_panel(
    player_query: Query<&Stats, (With<Player>, Changed<Stats>)>,
    mut texts: Query<&mut Text, With<CharacterPanelText>>,
) {
    let Ok(stats) = player_query.single() else {
        return;
    };
    for mut text in &mut texts {
        text.0 = stats.panel_text();
    }
}
