use bevy::prelude::*;

pub mod events;
pub mod resources;
pub mod states;
pub mod storage;

/// 核心插件：注册全局资源 / 事件 / 状态
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        use states::AppState;

        // main 里可能已经为了窗口设置提前读过配置
        let config = app
            .world()
            .get_resource::<resources::GameConfig>()
            .cloned()
            .unwrap_or_else(|| resources::GameConfig::load_or_default(resources::CONFIG_PATH));
        let prefs = storage::PrefsStore::open_or_default(&config.prefs_path);

        // 插件首次载入时，插入初始 State
        app.init_state::<AppState>()
            .add_event::<events::LogEvent>()
            .insert_resource(prefs)
            .insert_resource(config)
            .add_systems(Startup, events::hello_world);
    }
}
