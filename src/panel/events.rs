use bevy::prelude::*;

use super::components::{PanelKind, SlotAction};

#[derive(Event, Debug, Clone, Copy)]
pub struct OpenPanelEvent(pub PanelKind);

#[derive(Event, Debug, Clone, Copy)]
pub struct ClosePanelEvent(pub PanelKind);

/// 鼠标左键 / 触摸按下（屏幕坐标，左上角为原点）
#[derive(Event, Debug, Clone, Copy)]
pub struct PointerPressed {
    pub position: Vec2,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SlotClicked {
    pub panel: Entity,
    pub index: usize,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ClearSelectionEvent {
    pub panel: Entity,
}

/// 弹窗按钮被按下
#[derive(Event, Debug, Clone, Copy)]
pub struct SlotActionEvent {
    pub panel: Entity,
    pub index: usize,
    pub action: SlotAction,
}

/// 滚轮滚动，`rows` 为正表示向上翻
#[derive(Event, Debug, Clone, Copy)]
pub struct PointerScrolled {
    pub position: Vec2,
    pub rows: f32,
}
