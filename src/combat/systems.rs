use super::{components::*, events::*};
use crate::character::components::Player;
use crate::character::events::GainExp;
use crate::core::events::LogEvent;
use crate::panel::systems::PANEL_COLOR;
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

const CARD_COLOR: Color = Color::srgb(0.2, 0.14, 0.14);
const HP_BAR_COLOR: Color = Color::srgb(0.1, 0.1, 0.1);
const HP_FILL_COLOR: Color = Color::srgb(0.8, 0.2, 0.2);

pub fn spawn_enemy_grid(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(720.0),
            top: Val::Px(60.0),
            width: Val::Px(260.0),
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::Wrap,
            padding: UiRect::all(Val::Px(4.0)),
            ..default()
        },
        BackgroundColor(PANEL_COLOR),
        Visibility::Hidden,
        EnemyGrid,
    ));
}

/// 清掉旧遭遇并生成新的敌人
pub fn start_encounter(
    mut commands: Commands,
    mut ev_start: EventReader<StartEncounterEvent>,
    mut encounter: ResMut<Encounter>,
    mut log: EventWriter<LogEvent>,
) {
    for ev in ev_start.read() {
        for entity in encounter.enemies.drain(..) {
            commands.entity(entity).despawn();
        }
        if ev.enemies.len() > MAX_ENCOUNTER_SIZE {
            warn!("敌人数 {} 超过上限，只取前 {} 个", ev.enemies.len(), MAX_ENCOUNTER_SIZE);
        }
        for entry in ev.enemies.iter().take(MAX_ENCOUNTER_SIZE) {
            let enemy = Enemy::new(&entry.name, entry.level);
            log.write(LogEvent(format!("遭遇 {} ({})", enemy.level_label(), enemy.hp_label())));
            encounter.enemies.push(commands.spawn(enemy).id());
        }
    }
}

pub fn damage_enemy(
    mut commands: Commands,
    mut ev_damage: EventReader<DamageEnemyEvent>,
    mut encounter: ResMut<Encounter>,
    mut enemies: Query<&mut Enemy>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    mut gain_exp: EventWriter<GainExp>,
    player_query: Query<Entity, With<Player>>,
) {
    for ev in ev_damage.read() {
        let Some(&entity) = encounter.enemies.get(ev.index) else {
            toast.write(ErrorToastEvent(format!("没有第 {} 个敌人", ev.index)));
            continue;
        };
        let Ok(mut enemy) = enemies.get_mut(entity) else {
            error!("遭遇列表里的敌人实体不存在: {entity:?}");
            encounter.enemies.remove(ev.index);
            continue;
        };

        if !enemy.take_damage(ev.amount) {
            log.write(LogEvent(format!("{} 受到 {} 点伤害，{}", enemy.name, ev.amount, enemy.hp_label())));
            continue;
        }

        log.write(LogEvent(format!("击败 {}", enemy.level_label())));
        if let Ok(player) = player_query.single() {
            gain_exp.write(GainExp {
                entity: player,
                amount: enemy.exp_reward(),
            });
        }
        commands.entity(entity).despawn();
        encounter.enemies.remove(ev.index);
        if encounter.enemies.is_empty() {
            log.write(LogEvent("战斗胜利".into()));
        }
    }
}

pub fn end_encounter(
    mut commands: Commands,
    mut ev_end: EventReader<EndEncounterEvent>,
    mut encounter: ResMut<Encounter>,
    mut log: EventWriter<LogEvent>,
) {
    if ev_end.read().count() == 0 {
        return;
    }
    for entity in encounter.enemies.drain(..) {
        commands.entity(entity).despawn();
    }
    log.write(LogEvent("脱离战斗".into()));
}

/// 按遭遇刷新敌人卡片；卡片循环复用，不够时才新建
pub fn sync_enemy_grid(
    mut commands: Commands,
    encounter: Res<Encounter>,
    enemies: Query<&Enemy>,
    changed: Query<(), Changed<Enemy>>,
    mut grids: Query<(Entity, &mut Visibility), With<EnemyGrid>>,
    mut cards: Query<(&EnemyCard, &mut Visibility), Without<EnemyGrid>>,
    mut level_texts: Query<(&EnemyLevelText, &mut Text), Without<EnemyHpText>>,
    mut hp_texts: Query<(&EnemyHpText, &mut Text), Without<EnemyLevelText>>,
    mut fills: Query<(&EnemyHpFill, &mut Node)>,
) {
    if !encounter.is_changed() && changed.is_empty() {
        return;
    }
    let Ok((grid, mut grid_visibility)) = grids.single_mut() else {
        error!("敌人面板不存在");
        return;
    };

    let shown: Vec<&Enemy> = encounter
        .enemies
        .iter()
        .filter_map(|&e| enemies.get(e).ok())
        .collect();
    *grid_visibility = if shown.is_empty() {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    };

    let plan = pool_plan(cards.iter().count(), shown.len());
    if plan.hide > 0 {
        debug!("隐藏 {} 张多余的敌人卡片", plan.hide);
    }
    for (card, mut visibility) in &mut cards {
        *visibility = if card.index < plan.reuse {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    for (label, mut text) in &mut level_texts {
        if let Some(enemy) = shown.get(label.0).filter(|_| label.0 < plan.reuse) {
            text.0 = enemy.level_label();
        }
    }
    for (label, mut text) in &mut hp_texts {
        if let Some(enemy) = shown.get(label.0).filter(|_| label.0 < plan.reuse) {
            text.0 = enemy.hp_label();
        }
    }
    for (fill, mut node) in &mut fills {
        if let Some(enemy) = shown.get(fill.0).filter(|_| fill.0 < plan.reuse) {
            node.width = Val::Percent(enemy.hp_percent());
        }
    }

    if plan.spawn > 0 {
        debug!("敌人卡片池扩充 {} 张", plan.spawn);
        commands.entity(grid).with_children(|parent| {
            for (index, enemy) in shown.iter().enumerate().skip(plan.reuse) {
                spawn_enemy_card(parent, index, enemy);
            }
        });
    }
}

fn spawn_enemy_card(parent: &mut ChildSpawnerCommands, index: usize, enemy: &Enemy) {
    parent
        .spawn((
            Node {
                width: Val::Px(120.0),
                height: Val::Px(64.0),
                margin: UiRect::all(Val::Px(4.0)),
                padding: UiRect::all(Val::Px(4.0)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(CARD_COLOR),
            Visibility::Inherited,
            EnemyCard { index },
        ))
        .with_children(|card| {
            card.spawn((
                Text::new(enemy.level_label()),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                EnemyLevelText(index),
            ));
            card.spawn((
                Text::new(enemy.hp_label()),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                EnemyHpText(index),
            ));
            card.spawn((
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Px(6.0),
                    ..default()
                },
                BackgroundColor(HP_BAR_COLOR),
            ))
            .with_children(|bar| {
                bar.spawn((
                    Node {
                        width: Val::Percent(enemy.hp_percent()),
                        height: Val::Percent(100.0),
                        ..default()
                    },
                    BackgroundColor(HP_FILL_COLOR),
                    EnemyHpFill(index),
                ));
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Encounter>()
            .add_event::<StartEncounterEvent>()
            .add_event::<DamageEnemyEvent>()
            .add_event::<EndEncounterEvent>()
            .add_event::<LogEvent>()
            .add_event::<ErrorToastEvent>()
            .add_event::<GainExp>()
            .add_systems(Startup, spawn_enemy_grid)
            .add_systems(
                Update,
                (start_encounter, damage_enemy, end_encounter, sync_enemy_grid).chain(),
            );
        app.update();
        app
    }

    fn start(app: &mut App, names: &[&str]) {
        app.world_mut().send_event(StartEncounterEvent {
            enemies: names
                .iter()
                .map(|name| EnemySpec {
                    name: name.to_string(),
                    level: 1,
                })
                .collect(),
        });
        app.update();
    }

    /// (卡片总数, 可见卡片数)
    fn cards(app: &mut App) -> (usize, usize) {
        let mut query = app.world_mut().query::<(&EnemyCard, &Visibility)>();
        let all: Vec<_> = query.iter(app.world()).map(|(_, v)| *v).collect();
        let visible = all.iter().filter(|v| **v != Visibility::Hidden).count();
        (all.len(), visible)
    }

    #[test]
    fn cards_are_reused_across_encounters() {
        let mut app = app();
        start(&mut app, &["哥布林", "狼", "蝙蝠"]);
        assert_eq!(cards(&mut app), (3, 3));

        start(&mut app, &["史莱姆"]);
        assert_eq!(cards(&mut app), (3, 1));

        let mut labels = app.world_mut().query::<(&EnemyLevelText, &Text)>();
        let first = labels
            .iter(app.world())
            .find(|(label, _)| label.0 == 0)
            .map(|(_, text)| text.0.clone());
        assert_eq!(first.as_deref(), Some("Lv.1 史莱姆"));

        start(&mut app, &["a", "b", "c", "d"]);
        assert_eq!(cards(&mut app), (4, 4));
    }

    #[test]
    fn oversized_encounters_are_truncated() {
        let mut app = app();
        let names: Vec<String> = (0..MAX_ENCOUNTER_SIZE + 5).map(|i| format!("e{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        start(&mut app, &names);
        assert_eq!(app.world().resource::<Encounter>().enemies.len(), MAX_ENCOUNTER_SIZE);
        assert_eq!(cards(&mut app), (MAX_ENCOUNTER_SIZE, MAX_ENCOUNTER_SIZE));
    }

    #[test]
    fn defeated_enemies_are_despawned() {
        let mut app = app();
        start(&mut app, &["哥布林", "狼"]);
        app.world_mut().send_event(DamageEnemyEvent { index: 0, amount: 100 });
        app.update();

        assert_eq!(app.world().resource::<Encounter>().enemies.len(), 1);
        let mut enemies = app.world_mut().query::<&Enemy>();
        let names: Vec<String> = enemies.iter(app.world()).map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["狼".to_string()]);
        assert_eq!(cards(&mut app), (2, 1));

        app.world_mut().send_event(DamageEnemyEvent { index: 5, amount: 1 });
        app.update();
        let toasts = app
            .world()
            .resource::<Events<ErrorToastEvent>>()
            .iter_current_update_events()
            .count();
        assert_eq!(toasts, 1);
    }
}
