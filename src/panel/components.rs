use bevy::prelude::*;

use crate::data::schema::ItemEntry;
use crate::inventory::components::{BANK, PLAYER};

/// 可开关的面板种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Inventory,
    Bank,
    Equipment,
    Character,
}

impl PanelKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "player" | "inv" | "inventory" => Some(Self::Inventory),
            "bank" => Some(Self::Bank),
            "equip" | "equipment" => Some(Self::Equipment),
            "char" | "character" | "stats" => Some(Self::Character),
            _ => None,
        }
    }
}

/// 所有面板根节点都带这个组件
#[derive(Component, Debug)]
pub struct PanelRoot {
    pub kind: PanelKind,
    pub open: bool,
}

impl PanelRoot {
    pub fn closed(kind: PanelKind) -> Self {
        Self { kind, open: false }
    }
}

/// 屏幕坐标系（左上角为原点，逻辑像素）下的点击区域
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct HitRect(pub Rect);

impl HitRect {
    pub fn contains(&self, point: Vec2) -> bool {
        self.0.contains(point)
    }
}

/// 点击位置不在任何受跟踪的区域内
pub fn is_outside(point: Vec2, rects: impl IntoIterator<Item = Rect>) -> bool {
    !rects.into_iter().any(|r| r.contains(point))
}

/// 容器面板：每个格子对应一个 `SlotWidget`，同一时间最多一个被选中
#[derive(Component, Debug)]
pub struct ContainerPanel {
    pub container_id: String,
    pub selected: Option<usize>,
    /// 格子区域向下滚动的像素
    pub scroll: f32,
}

impl ContainerPanel {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            selected: None,
            scroll: 0.0,
        }
    }

    /// 点击已选中的格子会取消选中
    pub fn click(&mut self, index: usize) {
        self.selected = if self.selected == Some(index) {
            None
        } else {
            Some(index)
        };
    }
}

/// 格子网格布局
#[derive(Component, Debug, Clone, Copy)]
pub struct PanelLayout {
    pub origin: Vec2,
    pub columns: usize,
    pub slot_size: f32,
    pub gap: f32,
    pub padding: f32,
    /// 标题 / 按钮栏高度
    pub header: f32,
    /// 超过这么多行就滚动，0 表示全部显示
    pub visible_rows: usize,
}

impl PanelLayout {
    /// 相对面板左上角的偏移
    pub fn slot_offset(&self, index: usize) -> Vec2 {
        let columns = self.columns.max(1);
        let col = (index % columns) as f32;
        let row = (index / columns) as f32;
        let step = self.slot_size + self.gap;
        Vec2::new(
            self.padding + col * step,
            self.header + self.padding + row * step,
        )
    }

    pub fn slot_rect(&self, index: usize) -> Rect {
        let min = self.origin + self.slot_offset(index);
        Rect::from_corners(min, min + Vec2::splat(self.slot_size))
    }

    pub fn rows(&self, slot_count: usize) -> usize {
        slot_count.div_ceil(self.columns.max(1)).max(1)
    }

    fn view_rows(&self, slot_count: usize) -> usize {
        match self.visible_rows {
            0 => self.rows(slot_count),
            n => self.rows(slot_count).min(n),
        }
    }

    fn span(&self, n: usize) -> f32 {
        n as f32 * self.slot_size + n.saturating_sub(1) as f32 * self.gap
    }

    pub fn size(&self, slot_count: usize) -> Vec2 {
        Vec2::new(
            self.padding * 2.0 + self.span(self.columns.max(1)),
            self.header + self.padding * 2.0 + self.span(self.view_rows(slot_count)),
        )
    }

    pub fn bounds(&self, slot_count: usize) -> Rect {
        Rect::from_corners(self.origin, self.origin + self.size(slot_count))
    }

    /// 格子区域（标题栏以下）
    pub fn viewport(&self, slot_count: usize) -> Rect {
        Rect::from_corners(
            self.origin + Vec2::new(0.0, self.header),
            self.origin + self.size(slot_count),
        )
    }

    pub fn max_scroll(&self, slot_count: usize) -> f32 {
        let hidden = self.rows(slot_count) - self.view_rows(slot_count);
        hidden as f32 * (self.slot_size + self.gap)
    }

    /// 让第 index 格完整露出所需的滚动量
    pub fn reveal(&self, index: usize, scroll: f32, slot_count: usize) -> f32 {
        let step = self.slot_size + self.gap;
        let top = (index / self.columns.max(1)) as f32 * step;
        let bottom = top + self.slot_size;
        let view = self.span(self.view_rows(slot_count));
        let scroll = if top < scroll {
            top
        } else if bottom > scroll + view {
            bottom - view
        } else {
            scroll
        };
        scroll.clamp(0.0, self.max_scroll(slot_count))
    }
}

/// 格子滚动后在屏幕上的可见部分，完全滚出视口时为 None
pub fn scrolled_rect(slot: Rect, scroll: f32, viewport: Rect) -> Option<Rect> {
    let offset = Vec2::new(0.0, scroll);
    let visible = Rect::from_corners(slot.min - offset, slot.max - offset).intersect(viewport);
    (!visible.is_empty()).then_some(visible)
}

/// 面板里承载格子的可滚动节点
#[derive(Component, Debug, Clone, Copy)]
pub struct SlotGrid {
    pub panel: Entity,
}

/// 一个格子的显示组件，只镜像数据，不持有物品
#[derive(Component, Debug, Clone, PartialEq)]
pub struct SlotWidget {
    pub panel: Entity,
    pub index: usize,
    pub item_id: Option<String>,
    pub quantity: u32,
    pub selected: bool,
}

impl SlotWidget {
    pub fn is_empty(&self) -> bool {
        self.item_id.is_none() || self.quantity == 0
    }

    pub fn label(&self, name: &str) -> String {
        match self.quantity {
            0 => String::new(),
            1 => name.to_string(),
            n => format!("{name}\n×{n}"),
        }
    }
}

/// 选中格子旁弹出的操作菜单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotAction {
    Equip,
    Use,
    Deposit,
    Withdraw,
    Drop,
}

impl SlotAction {
    pub fn label(self) -> &'static str {
        match self {
            SlotAction::Equip => "装备",
            SlotAction::Use => "使用",
            SlotAction::Deposit => "存入",
            SlotAction::Withdraw => "取出",
            SlotAction::Drop => "丢弃",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equip" => Some(Self::Equip),
            "use" => Some(Self::Use),
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            "drop" => Some(Self::Drop),
            _ => None,
        }
    }
}

/// 按容器和物品类型决定可用操作
pub fn available_actions(container_id: &str, item: &ItemEntry, bank_open: bool) -> Vec<SlotAction> {
    let mut actions = Vec::new();
    match container_id {
        PLAYER => {
            if item.is_equipment() {
                actions.push(SlotAction::Equip);
            }
            if item.item_type == "potion" {
                actions.push(SlotAction::Use);
            }
            if bank_open {
                actions.push(SlotAction::Deposit);
            }
        }
        BANK => actions.push(SlotAction::Withdraw),
        _ => {}
    }
    actions.push(SlotAction::Drop);
    actions
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct ActionPopup {
    pub panel: Entity,
    pub slot: usize,
    pub item_id: String,
    pub actions: Vec<SlotAction>,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct ActionButton {
    pub panel: Entity,
    pub slot: usize,
    pub action: SlotAction,
}

pub const POPUP_BUTTON_SIZE: Vec2 = Vec2::new(72.0, 24.0);
pub const POPUP_SPACING: f32 = 4.0;

/// 弹窗贴在格子右侧
pub fn popup_origin(slot_rect: Rect) -> Vec2 {
    Vec2::new(slot_rect.max.x + POPUP_SPACING, slot_rect.min.y)
}

pub fn popup_button_rect(origin: Vec2, index: usize) -> Rect {
    let min = origin
        + Vec2::new(
            POPUP_SPACING,
            POPUP_SPACING + index as f32 * (POPUP_BUTTON_SIZE.y + POPUP_SPACING),
        );
    Rect::from_corners(min, min + POPUP_BUTTON_SIZE)
}

pub fn popup_rect(origin: Vec2, button_count: usize) -> Rect {
    let size = Vec2::new(
        POPUP_BUTTON_SIZE.x + POPUP_SPACING * 2.0,
        POPUP_SPACING + button_count as f32 * (POPUP_BUTTON_SIZE.y + POPUP_SPACING),
    );
    Rect::from_corners(origin, origin + size)
}
