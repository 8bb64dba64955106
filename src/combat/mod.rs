pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::Encounter;
use events::*;
use systems::*;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Encounter>()
            .add_event::<StartEncounterEvent>()
            .add_event::<DamageEnemyEvent>()
            .add_event::<EndEncounterEvent>()
            .add_systems(OnEnter(AppState::InGame), spawn_enemy_grid)
            .add_systems(
                Update,
                (start_encounter, damage_enemy, end_encounter, sync_enemy_grid)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
