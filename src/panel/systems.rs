use super::{components::*, events::*};
use crate::data::ItemDatabase;
use crate::equipment::events::EquipEvent;
use crate::inventory::components::{Container, InventoryManager, BANK, PLAYER};
use crate::inventory::events::{ContainerChanged, DropItemEvent, TransferItemEvent, UseItemEvent};
use bevy::prelude::*;

pub const PANEL_COLOR: Color = Color::srgba(0.08, 0.08, 0.1, 0.92);
const SLOT_COLOR: Color = Color::srgb(0.18, 0.18, 0.2);
const SLOT_SELECTED_COLOR: Color = Color::srgb(0.32, 0.28, 0.12);
const BORDER_IDLE: Color = Color::srgb(0.3, 0.3, 0.32);
const BORDER_SELECTED: Color = Color::srgb(1.0, 0.85, 0.2);
const POPUP_COLOR: Color = Color::srgb(0.12, 0.12, 0.14);
pub const BUTTON_COLOR: Color = Color::srgb(0.25, 0.25, 0.3);

/// 背包面板位置固定在左侧
pub fn inventory_layout() -> PanelLayout {
    PanelLayout {
        origin: Vec2::new(20.0, 60.0),
        columns: 6,
        slot_size: 48.0,
        gap: 4.0,
        padding: 8.0,
        header: 28.0,
        visible_rows: 0,
    }
}

/// 生成容器面板根节点（默认关闭），返回实体
pub fn spawn_container_panel(
    commands: &mut Commands,
    kind: PanelKind,
    container_id: &str,
    layout: PanelLayout,
    slot_count: usize,
    title: &str,
) -> Entity {
    let size = layout.size(slot_count);
    let panel = commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(layout.origin.x),
                top: Val::Px(layout.origin.y),
                width: Val::Px(size.x),
                height: Val::Px(size.y),
                ..default()
            },
            BackgroundColor(PANEL_COLOR),
            Visibility::Hidden,
            PanelRoot::closed(kind),
            ContainerPanel::new(container_id),
            HitRect(layout.bounds(slot_count)),
            layout,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(title),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(layout.padding),
                    top: Val::Px(4.0),
                    ..default()
                },
            ));
        })
        .id();

    commands.entity(panel).with_children(|parent| {
        parent.spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                right: Val::Px(0.0),
                top: Val::Px(layout.header),
                bottom: Val::Px(0.0),
                flex_direction: FlexDirection::Row,
                flex_wrap: FlexWrap::Wrap,
                align_content: AlignContent::FlexStart,
                column_gap: Val::Px(layout.gap),
                row_gap: Val::Px(layout.gap),
                padding: UiRect::all(Val::Px(layout.padding)),
                overflow: Overflow::scroll_y(),
                ..default()
            },
            SlotGrid { panel },
        ));
    });
    panel
}

pub fn spawn_inventory_panel(mut commands: Commands, inventory: Res<InventoryManager>) {
    let slot_count = inventory.container(PLAYER).map_or(0, Container::max_slots);
    spawn_container_panel(
        &mut commands,
        PanelKind::Inventory,
        PLAYER,
        inventory_layout(),
        slot_count,
        "背包",
    );
}

/// 所有面板通用的开关
pub fn open_close_panels(
    mut ev_open: EventReader<OpenPanelEvent>,
    mut ev_close: EventReader<ClosePanelEvent>,
    mut panels: Query<(&mut PanelRoot, &mut Visibility)>,
) {
    let closed: Vec<PanelKind> = ev_close.read().map(|e| e.0).collect();
    let opened: Vec<PanelKind> = ev_open.read().map(|e| e.0).collect();
    if closed.is_empty() && opened.is_empty() {
        return;
    }

    for (mut root, mut visibility) in &mut panels {
        if closed.contains(&root.kind) {
            root.open = false;
            *visibility = Visibility::Hidden;
        }
        if opened.contains(&root.kind) {
            root.open = true;
            *visibility = Visibility::Inherited;
        }
    }
}

type PanelItem<'a> = (
    Entity,
    &'a PanelRoot,
    &'a mut ContainerPanel,
    &'a PanelLayout,
    &'a mut HitRect,
    Option<&'a mut Node>,
);

/// 打开时重建全部格子，关闭时清除选中
pub fn activate_container_panels(
    mut commands: Commands,
    mut ev_open: EventReader<OpenPanelEvent>,
    mut ev_close: EventReader<ClosePanelEvent>,
    mut ev_clear: EventWriter<ClearSelectionEvent>,
    mut panels: Query<PanelItem>,
    widgets: Query<(Entity, &SlotWidget)>,
    grids: Query<(Entity, &SlotGrid)>,
    inventory: Res<InventoryManager>,
    database: Res<ItemDatabase>,
) {
    let closed: Vec<PanelKind> = ev_close.read().map(|e| e.0).collect();
    let opened: Vec<PanelKind> = ev_open.read().map(|e| e.0).collect();

    for (entity, root, mut panel, layout, mut bounds, node) in &mut panels {
        if closed.contains(&root.kind) {
            ev_clear.write(ClearSelectionEvent { panel: entity });
        }
        if !opened.contains(&root.kind) {
            continue;
        }
        let Some(container) = inventory.container(&panel.container_id) else {
            error!("面板绑定的容器不存在: {}", panel.container_id);
            continue;
        };
        let stale = widgets
            .iter()
            .filter(|(_, w)| w.panel == entity)
            .map(|(e, _)| e)
            .collect();
        let Some(grid) = grid_of(&grids, entity) else {
            error!("{} 面板缺少格子区域", panel.container_id);
            continue;
        };
        panel.selected = None;
        panel.scroll = 0.0;
        rebuild_slot_widgets(&mut commands, entity, grid, layout, container, &database, stale);
        resize_panel(layout, container.max_slots(), &mut bounds, node);
    }
}

fn grid_of(grids: &Query<(Entity, &SlotGrid)>, panel: Entity) -> Option<Entity> {
    grids.iter().find(|(_, g)| g.panel == panel).map(|(e, _)| e)
}

/// 容器变更时同步格子；格子数量变化（扩容）则整体重建
pub fn sync_container_panels(
    mut commands: Commands,
    mut ev_changed: EventReader<ContainerChanged>,
    mut panels: Query<PanelItem>,
    mut widgets: Query<(Entity, &mut SlotWidget)>,
    grids: Query<(Entity, &SlotGrid)>,
    inventory: Res<InventoryManager>,
    database: Res<ItemDatabase>,
) {
    let mut changed: Vec<&str> = ev_changed.read().map(|e| e.container_id.as_str()).collect();
    changed.dedup();

    for (entity, root, mut panel, layout, mut bounds, node) in &mut panels {
        if !root.open || !changed.contains(&panel.container_id.as_str()) {
            continue;
        }
        let Some(container) = inventory.container(&panel.container_id) else {
            error!("面板绑定的容器不存在: {}", panel.container_id);
            continue;
        };

        let owned: Vec<Entity> = widgets
            .iter()
            .filter(|(_, w)| w.panel == entity)
            .map(|(e, _)| e)
            .collect();
        if owned.len() != container.max_slots() {
            debug!("{} 格子数变化 {} → {}，重建", panel.container_id, owned.len(), container.max_slots());
            let Some(grid) = grid_of(&grids, entity) else {
                error!("{} 面板缺少格子区域", panel.container_id);
                continue;
            };
            panel.selected = None;
            panel.scroll = panel.scroll.min(layout.max_scroll(container.max_slots()));
            rebuild_slot_widgets(&mut commands, entity, grid, layout, container, &database, owned);
            resize_panel(layout, container.max_slots(), &mut bounds, node);
            continue;
        }

        for widget_entity in owned {
            let Ok((_, mut widget)) = widgets.get_mut(widget_entity) else {
                continue;
            };
            let Some(slot) = container.slots.get(widget.index) else {
                continue;
            };
            let item_id = slot.item_id.clone().filter(|_| !slot.is_empty());
            if widget.item_id != item_id || widget.quantity != slot.quantity {
                widget.item_id = item_id;
                widget.quantity = slot.quantity;
            }
        }
    }
}

fn resize_panel(layout: &PanelLayout, slot_count: usize, bounds: &mut HitRect, node: Option<Mut<Node>>) {
    bounds.0 = layout.bounds(slot_count);
    if let Some(mut node) = node {
        let size = layout.size(slot_count);
        node.width = Val::Px(size.x);
        node.height = Val::Px(size.y);
    }
}

/// 格子按顺序排进可滚动的网格节点，屏幕位置与 `PanelLayout::slot_rect` 一致
fn rebuild_slot_widgets(
    commands: &mut Commands,
    panel_entity: Entity,
    grid: Entity,
    layout: &PanelLayout,
    container: &Container,
    database: &ItemDatabase,
    stale: Vec<Entity>,
) {
    for entity in stale {
        commands.entity(entity).despawn();
    }

    commands.entity(grid).with_children(|parent| {
        for (index, slot) in container.slots.iter().enumerate() {
            let widget = SlotWidget {
                panel: panel_entity,
                index,
                item_id: slot.item_id.clone().filter(|_| !slot.is_empty()),
                quantity: slot.quantity,
                selected: false,
            };
            let label = match widget.item_id.as_deref() {
                Some(id) => widget.label(database.display_name(id)),
                None => String::new(),
            };
            parent.spawn((
                Node {
                    width: Val::Px(layout.slot_size),
                    height: Val::Px(layout.slot_size),
                    flex_shrink: 0.0,
                    border: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(SLOT_COLOR),
                BorderColor(BORDER_IDLE),
                Text::new(label),
                TextFont {
                    font_size: 11.0,
                    ..default()
                },
                HitRect(layout.slot_rect(index)),
                widget,
            ));
        }
    });
}

/// 弹窗画在所有面板之上，落在弹窗里的按下不再交给下层控件
pub fn under_popup(position: Vec2, popups: &Query<&HitRect, With<ActionPopup>>) -> bool {
    popups.iter().any(|r| r.contains(position))
}

/// 格子区域：面板范围去掉标题栏
fn viewport_of(layout: &PanelLayout, bounds: &HitRect) -> Rect {
    Rect::from_corners(bounds.0.min + Vec2::new(0.0, layout.header), bounds.0.max)
}

type HitPanel<'a> = (Entity, &'a PanelRoot, &'a ContainerPanel, &'a PanelLayout, &'a HitRect);

/// 按下位置 → 弹窗按钮 / 格子点击 / 面板外点击，每次按下只命中一个目标
pub fn pointer_hit_test(
    mut ev_pointer: EventReader<PointerPressed>,
    mut ev_slot: EventWriter<SlotClicked>,
    mut ev_action: EventWriter<SlotActionEvent>,
    mut ev_clear: EventWriter<ClearSelectionEvent>,
    panels: Query<HitPanel>,
    widgets: Query<(&SlotWidget, &HitRect)>,
    popups: Query<(&ActionPopup, &HitRect)>,
    buttons: Query<(&ActionButton, &HitRect)>,
) {
    let is_open = |panel: Entity| panels.get(panel).is_ok_and(|(_, root, ..)| root.open);
    // 滚出视口的格子不可点
    let visible = |widget: &SlotWidget, rect: &HitRect| {
        let (_, root, panel, layout, bounds) = panels.get(widget.panel).ok()?;
        if !root.open {
            return None;
        }
        scrolled_rect(rect.0, panel.scroll, viewport_of(layout, bounds))
    };

    for ev in ev_pointer.read() {
        let pos = ev.position;

        if let Some((button, _)) = buttons
            .iter()
            .find(|(b, r)| is_open(b.panel) && r.contains(pos))
        {
            ev_action.write(SlotActionEvent {
                panel: button.panel,
                index: button.slot,
                action: button.action,
            });
            continue;
        }
        // 任何打开的弹窗都算受跟踪区域
        if popups.iter().any(|(p, r)| is_open(p.panel) && r.contains(pos)) {
            continue;
        }

        let hit = widgets
            .iter()
            .find(|(w, r)| visible(w, r).is_some_and(|v| v.contains(pos)))
            .map(|(w, _)| (w.panel, w.index));
        if let Some((panel, index)) = hit {
            ev_slot.write(SlotClicked { panel, index });
        }

        for (panel_entity, root, panel, _, bounds) in &panels {
            if !root.open || panel.selected.is_none() {
                continue;
            }
            if hit.is_some_and(|(p, _)| p == panel_entity) {
                continue;
            }
            let tracked = std::iter::once(bounds.0).chain(
                widgets
                    .iter()
                    .filter(|(w, _)| w.panel == panel_entity)
                    .filter_map(|(w, r)| visible(w, r)),
            );
            if is_outside(pos, tracked) {
                ev_clear.write(ClearSelectionEvent {
                    panel: panel_entity,
                });
            }
        }
    }
}

/// 滚轮滚动光标下的格子区域，滚动时收起弹窗
pub fn scroll_container_panels(
    mut ev_scroll: EventReader<PointerScrolled>,
    mut ev_clear: EventWriter<ClearSelectionEvent>,
    mut panels: Query<(Entity, &PanelRoot, &mut ContainerPanel, &PanelLayout, &HitRect)>,
    widgets: Query<&SlotWidget>,
) {
    for ev in ev_scroll.read() {
        for (entity, root, mut panel, layout, bounds) in &mut panels {
            if !root.open || !viewport_of(layout, bounds).contains(ev.position) {
                continue;
            }
            let slot_count = widgets.iter().filter(|w| w.panel == entity).count();
            let step = layout.slot_size + layout.gap;
            let scroll = (panel.scroll - ev.rows * step).clamp(0.0, layout.max_scroll(slot_count));
            if scroll == panel.scroll {
                continue;
            }
            panel.scroll = scroll;
            if panel.selected.is_some() {
                ev_clear.write(ClearSelectionEvent { panel: entity });
            }
        }
    }
}

pub fn apply_slot_scroll(
    panels: Query<&ContainerPanel, Changed<ContainerPanel>>,
    mut grids: Query<(&SlotGrid, &mut ScrollPosition)>,
) {
    for (grid, mut position) in &mut grids {
        if let Ok(panel) = panels.get(grid.panel) {
            position.offset_y = panel.scroll;
        }
    }
}

/// 弹窗操作转成对应的背包 / 装备事件，随后清除选中
pub fn dispatch_slot_action(
    mut ev_action: EventReader<SlotActionEvent>,
    mut ev_clear: EventWriter<ClearSelectionEvent>,
    mut ev_equip: EventWriter<EquipEvent>,
    mut ev_use: EventWriter<UseItemEvent>,
    mut ev_transfer: EventWriter<TransferItemEvent>,
    mut ev_drop: EventWriter<DropItemEvent>,
    panels: Query<&ContainerPanel>,
) {
    for ev in ev_action.read() {
        let Ok(panel) = panels.get(ev.panel) else {
            warn!("操作指向不存在的面板 {:?}", ev.panel);
            continue;
        };
        let container = panel.container_id.as_str();

        match ev.action {
            SlotAction::Equip | SlotAction::Use if container != PLAYER => {
                warn!("{} 中的物品不能直接{}", container, ev.action.label());
                continue;
            }
            SlotAction::Equip => {
                ev_equip.write(EquipEvent { index: ev.index });
            }
            SlotAction::Use => {
                ev_use.write(UseItemEvent { index: ev.index });
            }
            SlotAction::Deposit => {
                ev_transfer.write(TransferItemEvent {
                    from: container.to_string(),
                    to: BANK.to_string(),
                    index: ev.index,
                });
            }
            SlotAction::Withdraw => {
                ev_transfer.write(TransferItemEvent {
                    from: container.to_string(),
                    to: PLAYER.to_string(),
                    index: ev.index,
                });
            }
            SlotAction::Drop => {
                ev_drop.write(DropItemEvent {
                    container: container.to_string(),
                    index: ev.index,
                });
            }
        }
        ev_clear.write(ClearSelectionEvent { panel: ev.panel });
    }
}

/// 单选：选中新格子时取消旧格子
pub fn update_selection(
    mut ev_click: EventReader<SlotClicked>,
    mut ev_clear: EventReader<ClearSelectionEvent>,
    mut panels: Query<(&PanelRoot, &mut ContainerPanel, &PanelLayout)>,
    mut widgets: Query<&mut SlotWidget>,
) {
    let mut touched = Vec::new();

    for ev in ev_clear.read() {
        if let Ok((_, mut panel, _)) = panels.get_mut(ev.panel) {
            panel.selected = None;
            touched.push(ev.panel);
        }
    }

    for ev in ev_click.read() {
        let Ok((root, mut panel, layout)) = panels.get_mut(ev.panel) else {
            warn!("点击指向不存在的面板 {:?}", ev.panel);
            continue;
        };
        if !root.open {
            continue;
        }
        if !widgets.iter().any(|w| w.panel == ev.panel && w.index == ev.index) {
            warn!("{} 没有第 {} 格", panel.container_id, ev.index);
            continue;
        }
        panel.click(ev.index);
        if let Some(index) = panel.selected {
            // 选中的格子滚到可见处
            let slot_count = widgets.iter().filter(|w| w.panel == ev.panel).count();
            panel.scroll = layout.reveal(index, panel.scroll, slot_count);
        }
        touched.push(ev.panel);
    }

    if touched.is_empty() {
        return;
    }
    for mut widget in &mut widgets {
        if !touched.contains(&widget.panel) {
            continue;
        }
        let Ok((_, panel, _)) = panels.get(widget.panel) else {
            continue;
        };
        let selected = panel.selected == Some(widget.index);
        if widget.selected != selected {
            widget.selected = selected;
        }
    }
}

/// 让每个面板的弹窗与当前选中保持一致
pub fn sync_action_popups(
    mut commands: Commands,
    panels: Query<HitPanel>,
    widgets: Query<(&SlotWidget, &HitRect)>,
    popups: Query<(Entity, &ActionPopup)>,
    database: Res<ItemDatabase>,
) {
    let bank_open = panels
        .iter()
        .any(|(_, root, panel, ..)| root.open && panel.container_id == BANK);

    for (panel_entity, root, panel, layout, bounds) in &panels {
        let desired = panel
            .selected
            .filter(|_| root.open)
            .and_then(|index| {
                widgets
                    .iter()
                    .find(|(w, _)| w.panel == panel_entity && w.index == index)
            })
            .and_then(|(widget, rect)| {
                let anchor = scrolled_rect(rect.0, panel.scroll, viewport_of(layout, bounds))?;
                let item_id = widget.item_id.as_ref().filter(|_| !widget.is_empty())?;
                let entry = database.get(item_id)?;
                let popup = ActionPopup {
                    panel: panel_entity,
                    slot: widget.index,
                    item_id: item_id.clone(),
                    actions: available_actions(&panel.container_id, entry, bank_open),
                };
                Some((popup, anchor))
            });
        let existing = popups.iter().find(|(_, p)| p.panel == panel_entity);

        match (existing, desired) {
            (Some((_, current)), Some((wanted, _))) if *current == wanted => {}
            (existing, desired) => {
                if let Some((entity, _)) = existing {
                    commands.entity(entity).despawn();
                }
                if let Some((popup, slot_rect)) = desired {
                    spawn_action_popup(&mut commands, popup, slot_rect);
                }
            }
        }
    }
}

fn spawn_action_popup(commands: &mut Commands, popup: ActionPopup, slot_rect: Rect) {
    let origin = popup_origin(slot_rect);
    let rect = popup_rect(origin, popup.actions.len());
    let actions = popup.actions.clone();
    let (panel, slot) = (popup.panel, popup.slot);

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(origin.x),
                top: Val::Px(origin.y),
                width: Val::Px(rect.width()),
                height: Val::Px(rect.height()),
                ..default()
            },
            BackgroundColor(POPUP_COLOR),
            GlobalZIndex(10),
            HitRect(rect),
            popup,
        ))
        .with_children(|parent| {
            for (i, action) in actions.into_iter().enumerate() {
                let button_rect = popup_button_rect(origin, i);
                let offset = button_rect.min - origin;
                parent.spawn((
                    Node {
                        position_type: PositionType::Absolute,
                        left: Val::Px(offset.x),
                        top: Val::Px(offset.y),
                        width: Val::Px(POPUP_BUTTON_SIZE.x),
                        height: Val::Px(POPUP_BUTTON_SIZE.y),
                        justify_content: JustifyContent::Center,
                        ..default()
                    },
                    BackgroundColor(BUTTON_COLOR),
                    Text::new(action.label()),
                    TextFont {
                        font_size: 12.0,
                        ..default()
                    },
                    HitRect(button_rect),
                    ActionButton {
                        panel,
                        slot,
                        action,
                    },
                ));
            }
        });
}

/// 把格子数据画到 UI 上
pub fn paint_slot_widgets(
    mut widgets: Query<
        (&SlotWidget, &mut Text, &mut BackgroundColor, &mut BorderColor),
        Changed<SlotWidget>,
    >,
    database: Res<ItemDatabase>,
) {
    for (widget, mut text, mut background, mut border) in &mut widgets {
        text.0 = match widget.item_id.as_deref() {
            Some(id) => widget.label(database.display_name(id)),
            None => String::new(),
        };
        if widget.selected {
            background.0 = SLOT_SELECTED_COLOR;
            border.0 = BORDER_SELECTED;
        } else {
            background.0 = SLOT_COLOR;
            border.0 = BORDER_IDLE;
        }
    }
}
