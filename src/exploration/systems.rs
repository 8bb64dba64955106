use super::{components::*, events::*};
use crate::bank::components::Wallet;
use crate::character::components::Player;
use crate::character::events::GainExp;
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::core::storage::PrefsStore;
use crate::data::ItemDatabase;
use crate::inventory::components::{InventoryManager, PLAYER};
use crate::panel::systems::PANEL_COLOR;
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

pub fn spawn_exploration_panel(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(720.0),
                top: Val::Px(300.0),
                width: Val::Px(220.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(8.0)),
                row_gap: Val::Px(2.0),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            Visibility::Hidden,
            ExplorationPanel,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                ExplorationTitle,
            ));
            parent.spawn((
                Node {
                    flex_direction: FlexDirection::Column,
                    ..default()
                },
                ExplorationList,
            ));
        });
}

pub fn start_exploration(
    mut ev_start: EventReader<StartExplorationEvent>,
    mut stepper: ResMut<ExplorationStepper>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    config: Res<GameConfig>,
) {
    for ev in ev_start.read() {
        if !stepper.is_idle() {
            toast.write(ErrorToastEvent("请先领取上一次的探索结果".into()));
            continue;
        }
        let Some(table) = config.exploration_table(&ev.area) else {
            toast.write(ErrorToastEvent(format!("未知区域: {}", ev.area)));
            continue;
        };
        stepper.start(ExplorationResult::from(table), config.reveal_interval);
        log.write(LogEvent(format!("开始探索 {}", table.area)));
    }
}

/// 计时揭晓，或由事件手动跳到下一行
pub fn advance_exploration(
    mut ev_step: EventReader<StepExplorationEvent>,
    mut stepper: ResMut<ExplorationStepper>,
    time: Res<Time>,
) {
    let mut advanced = stepper.bypass_change_detection().tick(time.delta());
    for _ in ev_step.read() {
        advanced |= stepper.bypass_change_detection().step();
    }
    if advanced {
        stepper.set_changed();
    }
}

pub fn collect_exploration(
    mut ev_collect: EventReader<CollectExplorationEvent>,
    mut stepper: ResMut<ExplorationStepper>,
    mut inventory: ResMut<InventoryManager>,
    mut wallet: ResMut<Wallet>,
    mut prefs: ResMut<PrefsStore>,
    mut gain_exp: EventWriter<GainExp>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    database: Res<ItemDatabase>,
    player_query: Query<Entity, With<Player>>,
) {
    for _ in ev_collect.read() {
        if !stepper.is_complete() {
            toast.write(ErrorToastEvent("探索结果还没有全部揭晓".into()));
            continue;
        }
        let Some(result) = stepper.take_result() else {
            continue;
        };

        for reward in &result.rewards {
            let Some(proto) = database.get(&reward.item) else {
                warn!("探索奖励引用了不存在的物品 {}", reward.item);
                toast.write(ErrorToastEvent(format!("不存在物品 {}", reward.item)));
                continue;
            };
            match inventory.add_item(PLAYER, &proto.id, reward.count, proto.max_stack.max(1)) {
                Ok(()) => {
                    log.write(LogEvent(format!("获得 {} ×{}", proto.name, reward.count)));
                }
                Err(err) => {
                    warn!("探索奖励 {} 未能放入背包: {err}", proto.id);
                    toast.write(ErrorToastEvent(format!("{} 放不下了", proto.name)));
                }
            }
        }

        if result.gold > 0 {
            wallet.gold = wallet.gold.saturating_add(result.gold);
            wallet.save(&mut prefs);
            log.write(LogEvent(format!("金币 +{}", result.gold)));
        }
        if result.exp > 0 {
            if let Ok(player) = player_query.single() {
                gain_exp.write(GainExp {
                    entity: player,
                    amount: result.exp,
                });
            }
        }
        info!("领取探索结果: {}", result.area);
    }
}

pub fn render_exploration(
    mut commands: Commands,
    stepper: Res<ExplorationStepper>,
    mut panels: Query<&mut Visibility, With<ExplorationPanel>>,
    mut titles: Query<&mut Text, With<ExplorationTitle>>,
    lists: Query<Entity, With<ExplorationList>>,
    lines: Query<Entity, With<ExplorationLine>>,
    database: Res<ItemDatabase>,
) {
    if !stepper.is_changed() {
        return;
    }

    for mut visibility in &mut panels {
        *visibility = if stepper.is_idle() {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        };
    }
    let title = match stepper.result() {
        Some(result) if stepper.is_complete() => format!("{} 探索完成", result.area),
        Some(result) => format!("探索 {} ...", result.area),
        None => String::new(),
    };
    for mut text in &mut titles {
        text.0 = title.clone();
    }

    for entity in &lines {
        commands.entity(entity).despawn();
    }
    let Ok(list) = lists.single() else {
        return;
    };
    let revealed = stepper.revealed_lines();
    commands.entity(list).with_children(|parent| {
        for line in &revealed {
            parent.spawn((
                Text::new(line.label(&database)),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                ExplorationLine,
            ));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resources::{ExplorationTable, RewardEntry};
    use crate::data::test_support::sample_database;

    fn app() -> App {
        let mut app = App::new();
        let mut config = GameConfig::default();
        config.exploration.push(ExplorationTable {
            area: "forest".into(),
            gold: 25,
            exp: 12,
            rewards: vec![
                RewardEntry {
                    item: "herb".into(),
                    count: 3,
                },
                RewardEntry {
                    item: "old_key".into(),
                    count: 2,
                },
            ],
        });
        let mut inventory = InventoryManager::default();
        inventory.create_container(PLAYER, 2);
        inventory.add_item(PLAYER, "potion", 1, 20).unwrap();

        app.insert_resource(config)
            .insert_resource(inventory)
            .insert_resource(sample_database())
            .insert_resource(PrefsStore::in_memory())
            .insert_resource(Wallet { gold: 10 })
            .init_resource::<ExplorationStepper>()
            .init_resource::<Time>()
            .add_event::<StartExplorationEvent>()
            .add_event::<StepExplorationEvent>()
            .add_event::<CollectExplorationEvent>()
            .add_event::<GainExp>()
            .add_event::<LogEvent>()
            .add_event::<ErrorToastEvent>()
            .add_systems(Startup, (spawn_exploration_panel, |mut commands: Commands| {
                commands.spawn((Player, crate::character::components::Stats::default()));
            }))
            .add_systems(
                Update,
                (start_exploration, advance_exploration, collect_exploration, render_exploration)
                    .chain(),
            );
        app.update();
        app
    }

    fn toasts(app: &App) -> Vec<String> {
        app.world()
            .resource::<Events<ErrorToastEvent>>()
            .iter_current_update_events()
            .map(|e| e.0.clone())
            .collect()
    }

    fn line_count(app: &mut App) -> usize {
        let mut query = app.world_mut().query_filtered::<(), With<ExplorationLine>>();
        query.iter(app.world()).count()
    }

    #[test]
    fn reveal_then_collect_applies_rewards() {
        let mut app = app();
        app.world_mut().send_event(StartExplorationEvent { area: "Forest".into() });
        app.update();
        assert!(!app.world().resource::<ExplorationStepper>().is_idle());

        app.world_mut().send_event(CollectExplorationEvent);
        app.update();
        assert_eq!(toasts(&app), vec!["探索结果还没有全部揭晓".to_string()]);

        // herb, old_key, gold, exp
        for revealed in 1..=4 {
            app.world_mut().send_event(StepExplorationEvent);
            app.update();
            assert_eq!(line_count(&mut app), revealed);
        }
        assert!(app.world().resource::<ExplorationStepper>().is_complete());

        app.world_mut().send_event(CollectExplorationEvent);
        app.update();

        let world = app.world();
        assert!(world.resource::<ExplorationStepper>().is_idle());
        assert_eq!(world.resource::<Wallet>().gold, 35);
        let inventory = world.resource::<InventoryManager>();
        assert_eq!(inventory.count_item(PLAYER, "herb"), 3);
        // 背包只剩一格，钥匙放不下
        assert_eq!(inventory.count_item(PLAYER, "old_key"), 0);
        assert_eq!(toasts(&app).len(), 1);
        let exp: Vec<i32> = world
            .resource::<Events<GainExp>>()
            .iter_current_update_events()
            .map(|e| e.amount)
            .collect();
        assert_eq!(exp, vec![12]);
    }

    #[test]
    fn unregistered_reward_ids_are_skipped_with_a_toast() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<GameConfig>()
            .exploration
            .push(ExplorationTable {
                area: "cave".into(),
                gold: 0,
                exp: 0,
                rewards: vec![
                    RewardEntry {
                        item: "dragon_scale".into(),
                        count: 1,
                    },
                    RewardEntry {
                        item: "HERB".into(),
                        count: 2,
                    },
                ],
            });
        app.world_mut().send_event(StartExplorationEvent { area: "cave".into() });
        app.update();
        for _ in 0..2 {
            app.world_mut().send_event(StepExplorationEvent);
            app.update();
        }
        app.world_mut().send_event(CollectExplorationEvent);
        app.update();

        assert_eq!(toasts(&app), vec!["不存在物品 dragon_scale".to_string()]);
        let inventory = app.world().resource::<InventoryManager>();
        assert_eq!(inventory.count_item(PLAYER, "dragon_scale"), 0);
        // 大小写不同的 id 按物品表里的写法入库
        assert_eq!(inventory.count_item(PLAYER, "herb"), 2);
    }

    #[test]
    fn unknown_area_and_busy_stepper_are_rejected() {
        let mut app = app();
        app.world_mut().send_event(StartExplorationEvent { area: "moon".into() });
        app.world_mut().send_event(StartExplorationEvent { area: "forest".into() });
        app.world_mut().send_event(StartExplorationEvent { area: "forest".into() });
        app.update();
        assert_eq!(
            toasts(&app),
            vec!["未知区域: moon".to_string(), "请先领取上一次的探索结果".to_string()]
        );
    }
}
