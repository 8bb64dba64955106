use anyhow::Context;
use bevy::prelude::*;
use serde_derive::Deserialize;
use std::path::Path;

pub const CONFIG_PATH: &str = "config/game.toml";

/// 一次探索的固定奖励表
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExplorationTable {
    pub area: String,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub exp: i32,
    #[serde(default)]
    pub rewards: Vec<RewardEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RewardEntry {
    pub item: String,
    pub count: u32,
}

/// 全局配置（config/game.toml），缺省字段取默认值
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_capacity: usize,
    pub bank_base_capacity: usize,
    pub bank_expansion_step: usize,
    pub bank_expansion_base_cost: u32,
    pub bank_expansion_cost_step: u32,
    pub bank_max_capacity: usize,
    pub starting_gold: u32,
    pub toast_seconds: f32,
    pub reveal_interval: f32,
    pub prefs_path: String,
    pub show_window: bool,
    pub exploration: Vec<ExplorationTable>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_capacity: 30,
            bank_base_capacity: 30,
            bank_expansion_step: 10,
            bank_expansion_base_cost: 100,
            bank_expansion_cost_step: 50,
            bank_max_capacity: 200,
            starting_gold: 500,
            toast_seconds: 2.5,
            reveal_interval: 0.6,
            prefs_path: "save/prefs.json".into(),
            show_window: false,
            exploration: Vec::new(),
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("配置文件格式错误")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置 {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// 读不到就用默认配置，只打警告
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("使用默认配置: {err:#}");
                Self::default()
            }
        }
    }

    pub fn exploration_table(&self, area: &str) -> Option<&ExplorationTable> {
        self.exploration
            .iter()
            .find(|t| t.area.eq_ignore_ascii_case(area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = GameConfig::from_toml_str("starting_gold = 42").unwrap();
        assert_eq!(config.starting_gold, 42);
        assert_eq!(config.bank_expansion_step, 10);
        assert_eq!(config.bank_expansion_base_cost, 100);
        assert!(config.exploration.is_empty());
    }

    #[test]
    fn exploration_tables_parse() {
        let config = GameConfig::from_toml_str(
            r#"
[[exploration]]
area = "Forest"
gold = 5
rewards = [{ item = "herb", count = 2 }]
"#,
        )
        .unwrap();
        let table = config.exploration_table("forest").unwrap();
        assert_eq!(table.gold, 5);
        assert_eq!(table.exp, 0);
        assert_eq!(
            table.rewards,
            vec![RewardEntry {
                item: "herb".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("starting_gold = \"lots\"").is_err());
    }
}
