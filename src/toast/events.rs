use bevy::prelude::*;

/// 请求弹出一条错误提示
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ErrorToastEvent(pub String);
