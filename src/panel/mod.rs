//! 容器面板：格子控件与背包容器一一对应，负责选中、弹窗和面板外点击

pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct PanelPlugin;

impl Plugin for PanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<OpenPanelEvent>()
            .add_event::<ClosePanelEvent>()
            .add_event::<PointerPressed>()
            .add_event::<PointerScrolled>()
            .add_event::<SlotClicked>()
            .add_event::<ClearSelectionEvent>()
            .add_event::<SlotActionEvent>()
            .add_systems(OnEnter(AppState::InGame), spawn_inventory_panel)
            .add_systems(
                Update,
                (
                    open_close_panels,
                    activate_container_panels,
                    sync_container_panels,
                    pointer_hit_test,
                    scroll_container_panels,
                    dispatch_slot_action,
                    update_selection,
                    apply_slot_scroll,
                    sync_action_popups,
                    paint_slot_widgets,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
