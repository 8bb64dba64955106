//! 文字 CLI：读取 stdin → 解析命令 → 转成游戏事件

use bevy::app::AppExit;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::bank::components::Wallet;
use crate::bank::events::{ExpandBankEvent, SortBankEvent};
use crate::character::events::ShowStats;
use crate::combat::components::MAX_ENCOUNTER_SIZE;
use crate::combat::events::{DamageEnemyEvent, EndEncounterEvent, EnemySpec, StartEncounterEvent};
use crate::core::{events::LogEvent, states::AppState};
use crate::data::ItemDatabase;
use crate::equipment::events::{EquipEvent, EquipItemEvent, UnequipEvent};
use crate::exploration::events::{
    CollectExplorationEvent, StartExplorationEvent, StepExplorationEvent,
};
use crate::inventory::components::PLAYER;
use crate::inventory::events::{GiveItemEvent, ListInventoryEvent, UseItemEvent};
use crate::panel::components::{ActionPopup, ContainerPanel, PanelKind, PanelRoot, SlotAction};
use crate::panel::events::{
    ClosePanelEvent, OpenPanelEvent, PointerPressed, SlotActionEvent, SlotClicked,
};
use crate::travel::events::{CancelTravelEvent, StartTravelEvent};

static CLI_BUFFER: Lazy<Arc<Mutex<VecDeque<String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(VecDeque::new())));

/// 插件入口
pub struct DebugCliPlugin;
impl Plugin for DebugCliPlugin {
    fn build(&self, app: &mut App) {
        {
            let buffer = CLI_BUFFER.clone();
            std::thread::spawn(move || {
                use std::io::{self, BufRead};
                let stdin = io::stdin();
                for line in stdin.lock().lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push_back(line.to_string());
                    }
                }
            });
        }
        app
            // 事件：原始输入行
            .add_event::<CliLine>()
            // 每帧从 buffer 取出所有命令行写入事件
            .add_systems(Update, read_stdin)
            // 仅在 InGame 处理命令
            .add_systems(
                Update,
                execute_cli_commands
                    .after(read_stdin)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/* ---------------------------- 事件与枚举 ---------------------------- */

/// 终端敲的一整行
#[derive(Event)]
struct CliLine(String);

/// 我们支持的命令
#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Status,
    Exit,
    Items(Option<String>), // None=全部；Some(token)=按 id/uuid/name 查询
    Give { id: String, count: u32, container: String },
    Inventory(String),
    Open(PanelKind),
    Close(PanelKind),
    Select { panel: PanelKind, index: usize },
    Click(Vec2),
    Action(SlotAction),
    Expand,
    Sort,
    Equip(usize),
    EquipItem(String),
    Unequip(String),
    Use(usize),
    Stats,
    Gold,
    Fight { name: String, level: u32, count: usize },
    Hit { index: usize, amount: i32 },
    Flee,
    Explore(String),
    Next,
    Collect,
    Travel { destination: String, seconds: f32 },
    Cancel,
    Usage(&'static str),
    Unsupported(String),
}

/* ---------------------------- 系统参数分组 ---------------------------- */

#[derive(SystemParam)]
struct InventoryWriters<'w> {
    give: EventWriter<'w, GiveItemEvent>,
    list: EventWriter<'w, ListInventoryEvent>,
    use_item: EventWriter<'w, UseItemEvent>,
    equip: EventWriter<'w, EquipEvent>,
    equip_item: EventWriter<'w, EquipItemEvent>,
    unequip: EventWriter<'w, UnequipEvent>,
    expand: EventWriter<'w, ExpandBankEvent>,
    sort: EventWriter<'w, SortBankEvent>,
}

#[derive(SystemParam)]
struct PanelWriters<'w, 's> {
    open: EventWriter<'w, OpenPanelEvent>,
    close: EventWriter<'w, ClosePanelEvent>,
    slot: EventWriter<'w, SlotClicked>,
    pointer: EventWriter<'w, PointerPressed>,
    action: EventWriter<'w, SlotActionEvent>,
    panels: Query<'w, 's, (Entity, &'static PanelRoot, &'static ContainerPanel)>,
    popups: Query<'w, 's, &'static ActionPopup>,
}

#[derive(SystemParam)]
struct GameWriters<'w> {
    stats: EventWriter<'w, ShowStats>,
    fight: EventWriter<'w, StartEncounterEvent>,
    hit: EventWriter<'w, DamageEnemyEvent>,
    flee: EventWriter<'w, EndEncounterEvent>,
    explore: EventWriter<'w, StartExplorationEvent>,
    next: EventWriter<'w, StepExplorationEvent>,
    collect: EventWriter<'w, CollectExplorationEvent>,
    travel: EventWriter<'w, StartTravelEvent>,
    cancel: EventWriter<'w, CancelTravelEvent>,
}

/* ---------------------------- 读取 stdin ---------------------------- */

fn read_stdin(mut writer: EventWriter<CliLine>) {
    let Ok(mut buffer) = CLI_BUFFER.lock() else {
        return;
    };
    while let Some(line) = buffer.pop_front() {
        writer.write(CliLine(line));
    }
}

/* ---------------------------- 命令执行 ---------------------------- */

fn execute_cli_commands(
    mut line_reader: EventReader<CliLine>,
    mut app_exit: EventWriter<AppExit>,
    mut log: EventWriter<LogEvent>,
    mut inventory: InventoryWriters,
    mut panel: PanelWriters,
    mut game: GameWriters,
    state: Res<State<AppState>>,
    database: Res<ItemDatabase>,
    wallet: Res<Wallet>,
) {
    for CliLine(input) in line_reader.read() {
        match parse_command(input) {
            Command::Help => {
                log.write(LogEvent(
                    "命令列表:
  help                          查看帮助
  status                        查看当前状态
  exit / quit                   退出程序
  items [token]                 列出物品 / 用 id、uuid、名称查询
  give <id> [count] [container] 给予物品（默认 player）
  inv [container]               查看容器
  open / close <player|bank|equip|char>
  select <player|bank> <index>  选中格子
  click <x> <y>                 模拟一次点击
  action <equip|use|deposit|withdraw|drop>
  expand / sort                 银行扩容 / 整理
  equip <index|id>              装备背包中的物品
  unequip <slot>                卸下装备
  use <index>                   使用物品
  stats / gold                  查看属性 / 金币
  fight <name> <level> [count]  开始战斗
  hit <index> <dmg>             攻击敌人
  flee                          结束战斗
  explore <area> / next / collect
  travel <dest> <secs> / cancel"
                        .into(),
                ));
            }

            Command::Status => {
                log.write(LogEvent(format!(
                    "State: {:?}, Items Loaded: {}, Gold: {}",
                    state.get(),
                    database.len(),
                    wallet.gold
                )));
            }

            Command::Exit => {
                log.write(LogEvent("Bye~".into()));
                app_exit.write(AppExit::Success);
            }

            Command::Items(None) => {
                for entry in database.iter() {
                    let uuid = uuid_from_id(&entry.id);
                    log.write(LogEvent(format!("{} | {} | {}", uuid, entry.id, entry.name)));
                }
            }

            Command::Items(Some(token)) => {
                // 按三种字段匹配
                let t_low = token.to_lowercase();
                if let Some(e) = database.iter().find(|e| {
                    e.id.eq_ignore_ascii_case(&t_low)
                        || e.name.eq_ignore_ascii_case(&t_low)
                        || uuid_from_id(&e.id).to_string() == t_low
                }) {
                    let uuid = uuid_from_id(&e.id);
                    log.write(LogEvent(format!(
                        "==================================================
UUID : {uuid}
ID   : {}
Name : {}
Type : {}
Slot : {}
Stack: {}
Atk/Def/HP : {}/{}/{}
Heal : {}
==================================================",
                        e.id,
                        e.name,
                        e.item_type,
                        e.equip_slot.as_deref().unwrap_or("-"),
                        e.max_stack,
                        e.atk,
                        e.def,
                        e.max_hp,
                        e.heal
                    )));
                } else {
                    log.write(LogEvent("未找到匹配物品".into()));
                }
            }

            Command::Give {
                id,
                count,
                container,
            } => {
                inventory.give.write(GiveItemEvent {
                    container,
                    id,
                    count,
                });
            }

            Command::Inventory(container) => {
                inventory.list.write(ListInventoryEvent { container });
            }

            Command::Open(kind) => {
                panel.open.write(OpenPanelEvent(kind));
            }

            Command::Close(kind) => {
                panel.close.write(ClosePanelEvent(kind));
            }

            Command::Select { panel: kind, index } => {
                match panel.panels.iter().find(|(_, root, _)| root.kind == kind) {
                    Some((entity, root, _)) if root.open => {
                        panel.slot.write(SlotClicked {
                            panel: entity,
                            index,
                        });
                    }
                    Some(_) => {
                        log.write(LogEvent("面板未打开".into()));
                    }
                    None => {
                        log.write(LogEvent("面板不存在".into()));
                    }
                }
            }

            Command::Click(position) => {
                panel.pointer.write(PointerPressed { position });
            }

            Command::Action(action) => {
                let Some((entity, index)) = panel
                    .panels
                    .iter()
                    .find_map(|(e, root, p)| p.selected.filter(|_| root.open).map(|i| (e, i)))
                else {
                    log.write(LogEvent("没有选中的格子".into()));
                    continue;
                };
                let offered = panel
                    .popups
                    .iter()
                    .any(|p| p.panel == entity && p.slot == index && p.actions.contains(&action));
                if offered {
                    panel.action.write(SlotActionEvent {
                        panel: entity,
                        index,
                        action,
                    });
                } else {
                    log.write(LogEvent(format!("该物品不能{}", action.label())));
                }
            }

            Command::Expand => {
                inventory.expand.write(ExpandBankEvent);
            }

            Command::Sort => {
                inventory.sort.write(SortBankEvent);
            }

            Command::Equip(index) => {
                inventory.equip.write(EquipEvent { index });
            }

            Command::EquipItem(item_id) => {
                inventory.equip_item.write(EquipItemEvent { item_id });
            }

            Command::Unequip(slot) => {
                inventory.unequip.write(UnequipEvent { slot });
            }

            Command::Use(index) => {
                inventory.use_item.write(UseItemEvent { index });
            }

            Command::Stats => {
                game.stats.write(ShowStats);
            }

            Command::Gold => {
                log.write(LogEvent(format!("金币: {}", wallet.gold)));
            }

            Command::Fight { name, level, count } => {
                let enemies = (0..count)
                    .map(|_| EnemySpec {
                        name: name.clone(),
                        level,
                    })
                    .collect();
                game.fight.write(StartEncounterEvent { enemies });
            }

            Command::Hit { index, amount } => {
                game.hit.write(DamageEnemyEvent { index, amount });
            }

            Command::Flee => {
                game.flee.write(EndEncounterEvent);
            }

            Command::Explore(area) => {
                game.explore.write(StartExplorationEvent { area });
            }

            Command::Next => {
                game.next.write(StepExplorationEvent);
            }

            Command::Collect => {
                game.collect.write(CollectExplorationEvent);
            }

            Command::Travel {
                destination,
                seconds,
            } => {
                game.travel.write(StartTravelEvent {
                    destination,
                    seconds,
                });
            }

            Command::Cancel => {
                game.cancel.write(CancelTravelEvent);
            }

            Command::Usage(usage) => {
                log.write(LogEvent(format!("用法: {usage}")));
            }

            Command::Unsupported(cmd) => {
                log.write(LogEvent(format!("不支持的命令: {cmd}")));
            }
        }
    }
}

/* ---------------------------- 工具函数 ---------------------------- */

fn parse_command(input: &str) -> Command {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    match cmd.as_str() {
        "help" | "h" | "?" => Command::Help,
        "status" | "s" => Command::Status,
        "exit" | "quit" | "q" => Command::Exit,
        "items" | "item" | "i" => {
            let token = parts.next().map(|s| s.to_string());
            Command::Items(token)
        }
        "give" => {
            let Some(id) = parts.next() else {
                return Command::Usage("give <id> [count] [container]");
            };
            let count = parts.next().unwrap_or("1").parse().unwrap_or(1);
            let container = parts.next().unwrap_or(PLAYER).to_lowercase();
            Command::Give {
                id: id.to_string(),
                count,
                container,
            }
        }
        "inventory" | "inv" => Command::Inventory(parts.next().unwrap_or(PLAYER).to_lowercase()),
        "open" | "close" => {
            let Some(kind) = parts.next().and_then(PanelKind::parse) else {
                return Command::Usage("open / close <player|bank|equip|char>");
            };
            if cmd == "open" {
                Command::Open(kind)
            } else {
                Command::Close(kind)
            }
        }
        "select" => {
            let panel = parts
                .next()
                .and_then(PanelKind::parse)
                .filter(|k| matches!(k, PanelKind::Inventory | PanelKind::Bank));
            let index = parts.next().and_then(|s| s.parse().ok());
            match (panel, index) {
                (Some(panel), Some(index)) => Command::Select { panel, index },
                _ => Command::Usage("select <player|bank> <index>"),
            }
        }
        "click" => {
            let x = parts.next().and_then(|s| s.parse().ok());
            let y = parts.next().and_then(|s| s.parse().ok());
            match (x, y) {
                (Some(x), Some(y)) => Command::Click(Vec2::new(x, y)),
                _ => Command::Usage("click <x> <y>"),
            }
        }
        "action" => match parts.next().and_then(SlotAction::parse) {
            Some(action) => Command::Action(action),
            None => Command::Usage("action <equip|use|deposit|withdraw|drop>"),
        },
        "expand" => Command::Expand,
        "sort" => Command::Sort,
        "equip" => match parts.next() {
            Some(arg) => match arg.parse() {
                Ok(index) => Command::Equip(index),
                Err(_) => Command::EquipItem(arg.to_string()),
            },
            None => Command::Usage("equip <index|id>"),
        },
        "unequip" => match parts.next() {
            Some(slot) => Command::Unequip(slot.to_string()),
            None => Command::Usage("unequip <weapon|helmet|legs|boots|backpack>"),
        },
        "use" => match parts.next().and_then(|s| s.parse().ok()) {
            Some(index) => Command::Use(index),
            None => Command::Usage("use <index>"),
        },
        "stats" => Command::Stats,
        "gold" => Command::Gold,
        "fight" => {
            let name = parts.next();
            let level = parts.next().and_then(|s| s.parse().ok());
            let count = parts.next().unwrap_or("1").parse().unwrap_or(1);
            match (name, level) {
                (Some(name), Some(level)) if (1..=MAX_ENCOUNTER_SIZE).contains(&count) => Command::Fight {
                    name: name.to_string(),
                    level,
                    count,
                },
                _ => Command::Usage("fight <name> <level> [count]"),
            }
        }
        "hit" => {
            let index = parts.next().and_then(|s| s.parse().ok());
            let amount = parts.next().and_then(|s| s.parse().ok());
            match (index, amount) {
                (Some(index), Some(amount)) => Command::Hit { index, amount },
                _ => Command::Usage("hit <index> <dmg>"),
            }
        }
        "flee" => Command::Flee,
        "explore" => match parts.next() {
            Some(area) => Command::Explore(area.to_string()),
            None => Command::Usage("explore <area>"),
        },
        "next" => Command::Next,
        "collect" => Command::Collect,
        "travel" => {
            let destination = parts.next();
            let seconds = parts.next().and_then(|s| s.parse().ok());
            match (destination, seconds) {
                (Some(destination), Some(seconds)) => Command::Travel {
                    destination: destination.to_string(),
                    seconds,
                },
                _ => Command::Usage("travel <dest> <secs>"),
            }
        }
        "cancel" => Command::Cancel,
        other => Command::Unsupported(other.into()),
    }
}

fn uuid_from_id(id: &str) -> Uuid {
    // 用固定 namespace + id 字节生成版本 5 UUID，保证可重复得到同一值
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}
