pub mod schema;
pub mod loader;

use bevy::prelude::*;
use schema::{ItemEntry, ItemList};
use std::collections::HashMap;
use crate::core::events::LogEvent;
use crate::core::states::AppState;

// --------------------------- 资源 ---------------------------
#[derive(Resource, Default)]
pub struct ItemAssets {
    pub handle: Option<Handle<ItemList>>,
}

/// 物品注册表：按 id 查元数据
#[derive(Resource, Default, Debug)]
pub struct ItemDatabase {
    entries: Vec<ItemEntry>,
    by_id: HashMap<String, usize>,
}

impl ItemDatabase {
    pub fn from_entries(entries: Vec<ItemEntry>) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.to_ascii_lowercase(), i))
            .collect();
        Self { entries, by_id }
    }

    /// id 不区分大小写
    pub fn get(&self, id: &str) -> Option<&ItemEntry> {
        self.by_id
            .get(&id.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 未知物品按 1 处理
    pub fn max_stack(&self, id: &str) -> u32 {
        self.get(id).map_or(1, |e| e.max_stack.max(1))
    }

    /// 界面上显示的名字，找不到就显示 id
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |e| e.name.as_str())
    }
}

// --------------------------- 插件 ---------------------------
pub struct DataPlugin;
impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app
            // 注册资产类型 & Loader
            .init_asset::<ItemList>()
            .register_asset_loader(loader::RonItemLoader)
            .init_resource::<ItemAssets>()
            .init_resource::<ItemDatabase>()
            // Loading 流程
            .add_systems(OnEnter(AppState::Loading), start_loading)
            .add_systems(
                Update,
                check_loaded.run_if(in_state(AppState::Loading)),
            );
    }
}

// --------------------------- 系统 ---------------------------
fn start_loading(
    mut item_assets: ResMut<ItemAssets>,
    asset_server: Res<AssetServer>,
) {
    let handle: Handle<ItemList> = asset_server.load("data/items.ron");
    item_assets.handle = Some(handle);
}

fn check_loaded(
    mut next: ResMut<NextState<AppState>>,
    mut database: ResMut<ItemDatabase>,
    mut log: EventWriter<LogEvent>,
    item_assets: Res<ItemAssets>,
    lists: Res<Assets<ItemList>>,
) {
    if let Some(list) = item_assets.handle.as_ref().and_then(|h| lists.get(h)) {
        *database = ItemDatabase::from_entries(list.items.clone());
        if database.is_empty() {
            warn!("物品表为空，背包和装备都无法使用");
        }
        info!("物品表已加载: {} 条", database.len());
        log.write(LogEvent(format!("✔ Items loaded: {}", database.len())));
        next.set(AppState::InGame);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_database;

    #[test]
    fn lookup_ignores_case() {
        let db = sample_database();
        assert_eq!(db.get("IRON_Sword").map(|e| e.atk), Some(5));
        assert!(db.get("missing").is_none());
    }

    #[test]
    fn unknown_items_stack_to_one_and_show_their_id() {
        let db = sample_database();
        assert_eq!(db.max_stack("herb"), 99);
        assert_eq!(db.max_stack("ghost"), 1);
        assert_eq!(db.display_name("ghost"), "ghost");
        assert_eq!(db.display_name("herb"), "HERB");
    }
}
