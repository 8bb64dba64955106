use super::{components::*, events::*};
use crate::core::events::LogEvent;
use crate::core::resources::GameConfig;
use crate::core::storage::PrefsStore;
use crate::data::ItemDatabase;
use crate::inventory::components::{InventoryManager, BANK};
use crate::inventory::events::ContainerChanged;
use crate::panel::components::{ActionPopup, HitRect, PanelKind, PanelLayout, PanelRoot};
use crate::panel::events::PointerPressed;
use crate::panel::systems::{spawn_container_panel, under_popup, BUTTON_COLOR};
use crate::toast::events::ErrorToastEvent;
use bevy::prelude::*;

const BANK_ORIGIN: Vec2 = Vec2::new(380.0, 60.0);
const SORT_BUTTON: (Vec2, Vec2) = (Vec2::new(8.0, 28.0), Vec2::new(60.0, 22.0));
const EXPAND_BUTTON: (Vec2, Vec2) = (Vec2::new(72.0, 28.0), Vec2::new(150.0, 22.0));

pub fn bank_layout() -> PanelLayout {
    PanelLayout {
        origin: BANK_ORIGIN,
        columns: 6,
        slot_size: 48.0,
        gap: 4.0,
        padding: 8.0,
        header: 56.0,
        visible_rows: 8,
    }
}

fn button_rect((offset, size): (Vec2, Vec2)) -> Rect {
    let min = BANK_ORIGIN + offset;
    Rect::from_corners(min, min + size)
}

/// 按存档中的扩容次数创建银行容器
pub fn setup_bank(
    mut commands: Commands,
    mut inventory: ResMut<InventoryManager>,
    config: Res<GameConfig>,
    prefs: Res<PrefsStore>,
) {
    let rules = ExpansionRules::from_config(&config);
    let saved = prefs.get_u32(BANK_EXPANSIONS_KEY).unwrap_or(0);
    let expansions = saved.min(rules.max_expansions());
    if expansions != saved {
        warn!("存档中的银行扩容次数 {saved} 超出上限，按 {expansions} 处理");
    }
    inventory.create_container(BANK, rules.capacity(expansions));
    commands.insert_resource(BankState { expansions });
    commands.insert_resource(Wallet::load(&prefs, config.starting_gold));
}

pub fn spawn_bank_panel(
    mut commands: Commands,
    inventory: Res<InventoryManager>,
    state: Res<BankState>,
    wallet: Res<Wallet>,
    config: Res<GameConfig>,
) {
    let (used, capacity) = inventory
        .container(BANK)
        .map_or((0, 0), |c| (c.used_slots(), c.max_slots()));
    let rules = ExpansionRules::from_config(&config);
    let panel = spawn_container_panel(
        &mut commands,
        PanelKind::Bank,
        BANK,
        bank_layout(),
        capacity,
        "银行",
    );

    commands.entity(panel).insert(BankPanel).with_children(|parent| {
        parent.spawn((
            Text::new(info_text(used, capacity, wallet.gold)),
            TextFont {
                font_size: 13.0,
                ..default()
            },
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(60.0),
                top: Val::Px(6.0),
                ..default()
            },
            BankInfoText,
        ));

        let buttons = [
            (BankButton::Sort, SORT_BUTTON, "整理".to_string()),
            (
                BankButton::Expand,
                EXPAND_BUTTON,
                expand_label(&rules, state.expansions, capacity),
            ),
        ];
        for (button, geometry, label) in buttons {
            let (offset, size) = geometry;
            let mut entity = parent.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(offset.x),
                    top: Val::Px(offset.y),
                    width: Val::Px(size.x),
                    height: Val::Px(size.y),
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                BackgroundColor(BUTTON_COLOR),
                Text::new(label),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                HitRect(button_rect(geometry)),
                button,
            ));
            if button == BankButton::Expand {
                entity.insert(BankExpandText);
            }
        }
    });
}

pub fn bank_button_clicks(
    mut ev_pointer: EventReader<PointerPressed>,
    mut ev_expand: EventWriter<ExpandBankEvent>,
    mut ev_sort: EventWriter<SortBankEvent>,
    panels: Query<&PanelRoot, With<BankPanel>>,
    buttons: Query<(&BankButton, &HitRect)>,
    popups: Query<&HitRect, With<ActionPopup>>,
) {
    let open = panels.iter().any(|root| root.open);
    for ev in ev_pointer.read() {
        if !open || under_popup(ev.position, &popups) {
            continue;
        }
        match buttons.iter().find(|(_, r)| r.contains(ev.position)) {
            Some((BankButton::Sort, _)) => {
                ev_sort.write(SortBankEvent);
            }
            Some((BankButton::Expand, _)) => {
                ev_expand.write(ExpandBankEvent);
            }
            None => {}
        }
    }
}

pub fn handle_sort_bank(
    mut ev_sort: EventReader<SortBankEvent>,
    mut inventory: ResMut<InventoryManager>,
    mut log: EventWriter<LogEvent>,
    database: Res<ItemDatabase>,
) {
    for _ in ev_sort.read() {
        match inventory.sort(BANK, |id| database.max_stack(id)) {
            Ok(()) => {
                log.write(LogEvent("银行已整理".into()));
            }
            Err(err) => error!("整理银行失败: {err}"),
        }
    }
}

pub fn handle_expand_bank(
    mut ev_expand: EventReader<ExpandBankEvent>,
    mut state: ResMut<BankState>,
    mut wallet: ResMut<Wallet>,
    mut inventory: ResMut<InventoryManager>,
    mut prefs: ResMut<PrefsStore>,
    mut log: EventWriter<LogEvent>,
    mut toast: EventWriter<ErrorToastEvent>,
    config: Res<GameConfig>,
) {
    let rules = ExpansionRules::from_config(&config);
    for _ in ev_expand.read() {
        match expand_bank(&mut state, &mut wallet, &mut inventory, &rules) {
            Ok(receipt) => {
                prefs.set_u32(BANK_EXPANSIONS_KEY, state.expansions);
                wallet.save(&mut prefs);
                info!("银行扩容至 {}，花费 {}", receipt.capacity, receipt.cost);
                log.write(LogEvent(format!(
                    "银行扩容至 {} 格，花费 {} 金币",
                    receipt.capacity, receipt.cost
                )));
            }
            Err(err) => {
                warn!("银行扩容失败: {err}");
                toast.write(ErrorToastEvent(err.to_string()));
            }
        }
    }
}

/// 银行内容、金币或扩容次数变化时刷新信息文本
pub fn refresh_bank_info(
    mut ev_changed: EventReader<ContainerChanged>,
    mut infos: Query<&mut Text, With<BankInfoText>>,
    mut expands: Query<&mut Text, (With<BankExpandText>, Without<BankInfoText>)>,
    inventory: Res<InventoryManager>,
    state: Res<BankState>,
    wallet: Res<Wallet>,
    config: Res<GameConfig>,
) {
    let mut bank_changed = false;
    for ev in ev_changed.read() {
        bank_changed |= ev.container_id == BANK;
    }
    if !bank_changed && !wallet.is_changed() && !state.is_changed() {
        return;
    }

    let Some(bank) = inventory.container(BANK) else {
        return;
    };
    let rules = ExpansionRules::from_config(&config);
    for mut text in &mut infos {
        text.0 = info_text(bank.used_slots(), bank.max_slots(), wallet.gold);
    }
    for mut text in &mut expands {
        text.0 = expand_label(&rules, state.expansions, bank.max_slots());
    }
}
