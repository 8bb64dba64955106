pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use components::TravelState;
use events::*;
use systems::*;

pub struct TravelPlugin;

impl Plugin for TravelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TravelState>()
            .add_event::<StartTravelEvent>()
            .add_event::<CancelTravelEvent>()
            .add_event::<TravelArrived>()
            .add_systems(OnEnter(AppState::InGame), spawn_travel_bar)
            .add_systems(
                Update,
                (start_travel, cancel_travel, tick_travel, render_travel)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
