//! 银行面板：在容器面板之上增加整理 / 扩容按钮和银行信息

pub mod components;
pub mod events;
pub mod systems;

use crate::core::states::AppState;
use crate::panel::systems::pointer_hit_test;
use bevy::prelude::*;
use events::*;
use systems::*;

pub struct BankPlugin;

impl Plugin for BankPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ExpandBankEvent>()
            .add_event::<SortBankEvent>()
            .add_systems(Startup, setup_bank)
            .add_systems(OnEnter(AppState::InGame), spawn_bank_panel)
            .add_systems(
                Update,
                (
                    // 弹窗要在面板处理按下之前还在，才能挡住下层按钮
                    bank_button_clicks.before(pointer_hit_test),
                    handle_sort_bank,
                    handle_expand_bank,
                    refresh_bank_info,
                )
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
