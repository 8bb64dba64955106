use bevy::prelude::*;

/// 面向玩家的文字消息，main 里统一打印
#[derive(Event, Debug, Clone)]
pub struct LogEvent(pub String);

pub fn hello_world(mut writer: EventWriter<LogEvent>) {
    writer.write(LogEvent("RPG 面板已启动，输入 help 查看命令".into()));
}
