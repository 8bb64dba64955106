pub mod components;
pub mod events;
pub mod systems;

use bevy::prelude::*;
use crate::core::states::AppState;
use events::*;
use systems::*;

pub struct InventoryPlugin;
impl Plugin for InventoryPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<components::InventoryManager>()
            .add_event::<ContainerChanged>()
            .add_event::<GiveItemEvent>()
            .add_event::<ListInventoryEvent>()
            .add_event::<UseItemEvent>()
            .add_event::<TransferItemEvent>()
            .add_event::<DropItemEvent>()
            .add_systems(Startup, setup_player_container)
            .add_systems(
                Update,
                (
                    give_item,
                    print_inventory,
                    use_item,
                    transfer_item,
                    drop_item,
                ).run_if(in_state(AppState::InGame)),
            )
            .add_systems(PostUpdate, flush_container_changes);
    }
}
