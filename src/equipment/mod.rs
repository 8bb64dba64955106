pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use crate::panel::systems::pointer_hit_test;
use bevy::prelude::*;
use components::*;
use events::*;
use systems::*;

pub struct EquipmentPlugin;
impl Plugin for EquipmentPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Equipment::default())
            .add_event::<EquipEvent>()
            .add_event::<EquipItemEvent>()
            .add_event::<UnequipEvent>()
            .add_systems(
                OnEnter(AppState::InGame),
                (load_equipment, spawn_equipment_panel),
            )
            .add_systems(
                Update,
                (
                    equipment_panel_clicks.before(pointer_hit_test),
                    equip_item,
                    unequip_item,
                    refresh_equipment_panel,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
