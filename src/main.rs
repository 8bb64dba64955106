use bevy::prelude::*;

mod bank;
mod character;
mod combat;
mod core;
mod data;
mod equipment;
mod exploration;
mod interface;
mod inventory;
mod panel;
mod toast;
mod travel;

use crate::core::resources::{GameConfig, CONFIG_PATH};
use crate::core::states;
use crate::core::CorePlugin;
use interface::{debug_cli::DebugCliPlugin, pointer::PointerPlugin};

fn main() {
    let config = GameConfig::load_or_default(CONFIG_PATH);
    let visible = config.show_window;

    App::new()
        .insert_resource(config)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "RPG Panels".into(),
                visible,
                ..default()
            }), // 默认不显示窗口，只靠 CLI 操作
            ..default()
        }))
        .add_plugins(CorePlugin)
        .add_plugins(data::DataPlugin)
        .add_plugins((
            inventory::InventoryPlugin,
            panel::PanelPlugin,
            bank::BankPlugin,
            equipment::EquipmentPlugin,
            character::CharacterPlugin,
            combat::CombatPlugin,
            exploration::ExplorationPlugin,
            travel::TravelPlugin,
            toast::ToastPlugin,
        ))
        .add_plugins((PointerPlugin, DebugCliPlugin))
        .add_systems(Update, forward_log_event) // 简单打印
        .add_systems(Startup, |mut commands: Commands, mut next: ResMut<NextState<states::AppState>>| {
            commands.spawn(Camera2d);
            next.set(states::AppState::Loading);
        })
        .run();
}

fn forward_log_event(mut reader: EventReader<crate::core::events::LogEvent>) {
    for e in reader.read() {
        println!("> {}", e.0);
    }
}
