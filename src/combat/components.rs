use bevy::prelude::*;

pub const MAX_ENEMY_LEVEL: u32 = 999;
/// 一次遭遇最多的敌人数
pub const MAX_ENCOUNTER_SIZE: usize = 12;

/// 战斗中的敌人
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    pub name: String,
    pub level: u32,
    pub hp: i32,
    pub max_hp: i32,
}

impl Enemy {
    /// 生命值随等级成长：10 + 5 × lv，等级限制在 1..=999
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        let level = level.clamp(1, MAX_ENEMY_LEVEL);
        let max_hp = 10 + 5 * level as i32;
        Self {
            name: name.into(),
            level,
            hp: max_hp,
            max_hp,
        }
    }

    /// 受到伤害，返回是否被击败
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp = (self.hp - amount.max(0)).max(0);
        self.hp == 0
    }

    pub fn exp_reward(&self) -> i32 {
        5 * self.level as i32
    }

    pub fn level_label(&self) -> String {
        format!("Lv.{} {}", self.level, self.name)
    }

    pub fn hp_label(&self) -> String {
        format!("HP {}/{}", self.hp, self.max_hp)
    }

    /// 血条百分比 [0, 100]
    pub fn hp_percent(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.max_hp as f32 * 100.0).clamp(0.0, 100.0)
    }
}

/// 当前遭遇的敌人，按格子顺序排列
#[derive(Resource, Debug, Default)]
pub struct Encounter {
    pub enemies: Vec<Entity>,
}

/// 卡片池的调整方案
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPlan {
    pub reuse: usize,
    pub spawn: usize,
    pub hide: usize,
}

pub fn pool_plan(pooled: usize, needed: usize) -> PoolPlan {
    PoolPlan {
        reuse: pooled.min(needed),
        spawn: needed.saturating_sub(pooled),
        hide: pooled.saturating_sub(needed),
    }
}

#[derive(Component)]
pub struct EnemyGrid;

#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyCard {
    pub index: usize,
}

#[derive(Component)]
pub struct EnemyLevelText(pub usize);

#[derive(Component)]
pub struct EnemyHpText(pub usize);

#[derive(Component)]
pub struct EnemyHpFill(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_hp_bar() {
        let mut enemy = Enemy::new("史莱姆", 2);
        assert_eq!(enemy.level_label(), "Lv.2 史莱姆");
        assert_eq!(enemy.hp_label(), "HP 20/20");
        assert!(!enemy.take_damage(5));
        assert_eq!(enemy.hp_percent(), 75.0);
        assert!(enemy.take_damage(100));
        assert_eq!(enemy.hp, 0);
        assert_eq!(enemy.hp_percent(), 0.0);
    }

    #[test]
    fn huge_levels_are_clamped() {
        let enemy = Enemy::new("史莱姆", 500_000_000);
        assert_eq!(enemy.level, MAX_ENEMY_LEVEL);
        assert_eq!(enemy.max_hp, 10 + 5 * 999);
        assert_eq!(enemy.exp_reward(), 5 * 999);

        let enemy = Enemy::new("史莱姆", u32::MAX);
        assert_eq!(enemy.max_hp, 5005);
        assert_eq!(Enemy::new("史莱姆", 0).level, 1);
    }

    #[test]
    fn pool_grows_only_when_too_small() {
        assert_eq!(pool_plan(0, 3), PoolPlan { reuse: 0, spawn: 3, hide: 0 });
        assert_eq!(pool_plan(4, 2), PoolPlan { reuse: 2, spawn: 0, hide: 2 });
        assert_eq!(pool_plan(2, 5), PoolPlan { reuse: 2, spawn: 3, hide: 0 });
        assert_eq!(pool_plan(3, 3), PoolPlan { reuse: 3, spawn: 0, hide: 0 });
    }
}
