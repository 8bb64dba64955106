pub mod components;
pub mod events;
pub mod systems;

use crate::core::resources::GameConfig;
use bevy::prelude::*;
use components::ToastQueue;
use events::ErrorToastEvent;
use systems::*;

pub struct ToastPlugin;

impl Plugin for ToastPlugin {
    fn build(&self, app: &mut App) {
        let seconds = app
            .world()
            .get_resource::<GameConfig>()
            .map_or(2.5, |config| config.toast_seconds);
        app.insert_resource(ToastQueue::new(seconds))
            .add_event::<ErrorToastEvent>()
            .add_systems(Startup, spawn_toast_overlay)
            .add_systems(Update, (enqueue_toasts, tick_toasts, render_toast).chain());
    }
}
