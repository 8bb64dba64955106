pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::ExplorationStepper;
use events::*;
use systems::*;

pub struct ExplorationPlugin;

impl Plugin for ExplorationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExplorationStepper>()
            .add_event::<StartExplorationEvent>()
            .add_event::<StepExplorationEvent>()
            .add_event::<CollectExplorationEvent>()
            .add_systems(OnEnter(AppState::InGame), spawn_exploration_panel)
            .add_systems(
                Update,
                (
                    start_exploration,
                    advance_exploration,
                    collect_exploration,
                    render_exploration,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
