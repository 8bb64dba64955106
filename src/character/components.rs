use bevy::prelude::*;

/// 角色属性组件
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Stats {
    pub hp: i32,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub lv: i32,
    pub exp: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hp: 20,
            max_hp: 20,
            atk: 2,
            def: 1,
            lv: 1,
            exp: 0,
        }
    }
}

impl Stats {
    /// 升级所需经验：exp_to_next = 10 × lv²
    pub fn exp_to_next(&self) -> i32 {
        10 * self.lv * self.lv
    }

    pub fn can_level_up(&self) -> bool {
        self.exp >= self.exp_to_next()
    }

    /// 升级：+2 max_hp, +1 atk, +1 def，并回满血
    pub fn level_up(&mut self) {
        if self.can_level_up() {
            self.exp -= self.exp_to_next();
            self.lv += 1;
            self.max_hp += 2;
            self.atk += 1;
            self.def += 1;
            self.hp = self.max_hp;
        }
    }

    /// 获得经验，可能连续升级
    pub fn gain_exp(&mut self, amount: i32) {
        self.exp += amount;
        while self.can_level_up() {
            self.level_up();
        }
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// 角色面板上的多行文本
    pub fn panel_text(&self) -> String {
        format!(
            "生命值: {}/{}\n攻击力: {}\n防御力: {}\n等级: {} (经验: {}/{})",
            self.hp,
            self.max_hp,
            self.atk,
            self.def,
            self.lv,
            self.exp,
            self.exp_to_next()
        )
    }
}

/// 玩家标记组件
#[derive(Component)]
pub struct Player;

/// 基础属性（不受装备影响的原始属性）
#[derive(Component, Debug, Clone)]
pub struct BaseStats {
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
}

impl From<&Stats> for BaseStats {
    fn from(stats: &Stats) -> Self {
        Self {
            max_hp: stats.max_hp,
            atk: stats.atk,
            def: stats.def,
        }
    }
}

/// 角色面板里的属性文本
#[derive(Component)]
pub struct CharacterPanelText;
