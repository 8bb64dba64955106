use bevy::prelude::*;
use std::time::Duration;

use crate::core::resources::{ExplorationTable, RewardEntry};
use crate::data::ItemDatabase;

/// 一次探索的收获
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationResult {
    pub area: String,
    pub gold: u32,
    pub exp: i32,
    pub rewards: Vec<RewardEntry>,
}

impl From<&ExplorationTable> for ExplorationResult {
    fn from(table: &ExplorationTable) -> Self {
        Self {
            area: table.area.clone(),
            gold: table.gold,
            exp: table.exp,
            rewards: table.rewards.clone(),
        }
    }
}

/// 揭晓列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealLine {
    Item { id: String, count: u32 },
    Gold(u32),
    Exp(i32),
}

impl RevealLine {
    pub fn label(&self, database: &ItemDatabase) -> String {
        match self {
            RevealLine::Item { id, count } => format!("{} ×{}", database.display_name(id), count),
            RevealLine::Gold(gold) => format!("金币 +{gold}"),
            RevealLine::Exp(exp) => format!("经验 +{exp}"),
        }
    }
}

impl ExplorationResult {
    /// 先物品，再金币、经验；为零的不显示
    pub fn lines(&self) -> Vec<RevealLine> {
        let mut lines: Vec<RevealLine> = self
            .rewards
            .iter()
            .filter(|r| r.count > 0)
            .map(|r| RevealLine::Item {
                id: r.item.clone(),
                count: r.count,
            })
            .collect();
        if self.gold > 0 {
            lines.push(RevealLine::Gold(self.gold));
        }
        if self.exp > 0 {
            lines.push(RevealLine::Exp(self.exp));
        }
        lines
    }
}

/// 探索结果逐条揭晓：Idle → Revealing → Complete
#[derive(Resource, Debug, Clone, Default)]
pub enum ExplorationStepper {
    #[default]
    Idle,
    Revealing {
        result: ExplorationResult,
        revealed: usize,
        timer: Timer,
    },
    Complete {
        result: ExplorationResult,
    },
}

impl ExplorationStepper {
    pub fn start(&mut self, result: ExplorationResult, interval: f32) {
        *self = if result.lines().is_empty() {
            Self::Complete { result }
        } else {
            Self::Revealing {
                result,
                revealed: 0,
                timer: Timer::from_seconds(interval.max(0.01), TimerMode::Repeating),
            }
        };
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn result(&self) -> Option<&ExplorationResult> {
        match self {
            Self::Idle => None,
            Self::Revealing { result, .. } | Self::Complete { result } => Some(result),
        }
    }

    /// 已揭晓的行
    pub fn revealed_lines(&self) -> Vec<RevealLine> {
        match self {
            Self::Idle => Vec::new(),
            Self::Revealing { result, revealed, .. } => {
                result.lines().into_iter().take(*revealed).collect()
            }
            Self::Complete { result } => result.lines(),
        }
    }

    /// 多揭晓一行，全部揭晓后进入 Complete。状态有变化时返回 true
    pub fn step(&mut self) -> bool {
        let Self::Revealing { result, revealed, .. } = self else {
            return false;
        };
        *revealed += 1;
        if *revealed >= result.lines().len() {
            let result = result.clone();
            *self = Self::Complete { result };
        }
        true
    }

    pub fn tick(&mut self, delta: Duration) -> bool {
        let Self::Revealing { timer, .. } = self else {
            return false;
        };
        timer.tick(delta);
        let mut advanced = false;
        for _ in 0..timer.times_finished_this_tick() {
            advanced |= self.step();
        }
        advanced
    }

    /// 领取结果并回到 Idle；未完成时不动
    pub fn take_result(&mut self) -> Option<ExplorationResult> {
        if !self.is_complete() {
            return None;
        }
        match std::mem::take(self) {
            Self::Complete { result } => Some(result),
            _ => None,
        }
    }
}

#[derive(Component)]
pub struct ExplorationPanel;

#[derive(Component)]
pub struct ExplorationTitle;

#[derive(Component)]
pub struct ExplorationList;

#[derive(Component)]
pub struct ExplorationLine;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_database;

    fn forest() -> ExplorationResult {
        ExplorationResult {
            area: "forest".into(),
            gold: 25,
            exp: 12,
            rewards: vec![
                RewardEntry {
                    item: "herb".into(),
                    count: 3,
                },
                RewardEntry {
                    item: "potion".into(),
                    count: 1,
                },
            ],
        }
    }

    #[test]
    fn lines_are_labelled_in_reveal_order() {
        let database = sample_database();
        let labels: Vec<String> = forest().lines().iter().map(|l| l.label(&database)).collect();
        assert_eq!(labels.len(), 4);
        assert!(labels[0].ends_with("×3"));
        assert_eq!(labels[2], "金币 +25");
        assert_eq!(labels[3], "经验 +12");
    }

    #[test]
    fn steps_reveal_one_line_at_a_time() {
        let mut stepper = ExplorationStepper::default();
        assert!(!stepper.step());
        stepper.start(forest(), 0.5);
        assert_eq!(stepper.revealed_lines().len(), 0);

        assert!(stepper.step());
        assert!(stepper.step());
        assert_eq!(stepper.revealed_lines().len(), 2);
        assert!(stepper.take_result().is_none());

        assert!(stepper.step());
        assert!(stepper.step());
        assert!(stepper.is_complete());
        assert!(!stepper.step());

        assert_eq!(stepper.take_result(), Some(forest()));
        assert!(stepper.is_idle());
    }

    #[test]
    fn timer_reveals_on_interval() {
        let mut stepper = ExplorationStepper::default();
        stepper.start(forest(), 0.5);
        assert!(!stepper.tick(Duration::from_secs_f32(0.3)));
        assert!(stepper.tick(Duration::from_secs_f32(0.3)));
        assert_eq!(stepper.revealed_lines().len(), 1);
        // 一帧跨过多个间隔
        assert!(stepper.tick(Duration::from_secs_f32(1.6)));
        assert!(stepper.is_complete());
    }

    #[test]
    fn empty_result_completes_immediately() {
        let mut stepper = ExplorationStepper::default();
        stepper.start(
            ExplorationResult {
                area: "desert".into(),
                gold: 0,
                exp: 0,
                rewards: Vec::new(),
            },
            0.5,
        );
        assert!(stepper.is_complete());
    }
}
