pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_event::<EquipmentChanged>()
            .add_event::<GainExp>()
            .add_event::<Heal>()
            .add_event::<ShowStats>()
            .add_systems(Startup, spawn_player)
            .add_systems(OnEnter(AppState::InGame), spawn_character_panel)
            .add_systems(
                Update,
                (
                    handle_gain_exp,
                    handle_heal,
                    recalculate_stats,
                    show_stats,
                    refresh_character_panel,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
