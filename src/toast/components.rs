use bevy::prelude::*;
use std::collections::VecDeque;
use std::time::Duration;

/// 错误提示队列：同一时间只显示一条，先进先出
#[derive(Resource, Debug)]
pub struct ToastQueue {
    pending: VecDeque<String>,
    current: Option<String>,
    timer: Timer,
}

impl ToastQueue {
    pub fn new(seconds: f32) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            timer: Timer::from_seconds(seconds.max(0.1), TimerMode::Once),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.current.is_none() {
            self.show(message);
        } else {
            self.pending.push_back(message);
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 推进计时；当前提示到期后换下一条。显示内容变化时返回 true
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.timer.tick(delta);
        if !self.timer.finished() {
            return false;
        }
        match self.pending.pop_front() {
            Some(next) => self.show(next),
            None => self.current = None,
        }
        true
    }

    fn show(&mut self, message: String) {
        self.current = Some(message);
        self.timer.reset();
    }
}

#[derive(Component)]
pub struct ToastRoot;

#[derive(Component)]
pub struct ToastText;
