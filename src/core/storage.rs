//! 简单的键值存档（类似 PlayerPrefs），落盘为 JSON

use anyhow::Context;
use bevy::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Resource, Debug, Default)]
pub struct PrefsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl PrefsStore {
    /// 仅内存，不落盘
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("无法读取存档 {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("存档格式错误 {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// 存档损坏时从空存档开始，但保留路径以便覆盖
    pub fn open_or_default(path: impl AsRef<Path>) -> Self {
        match Self::open(path.as_ref()) {
            Ok(store) => store,
            Err(err) => {
                error!("存档不可用: {err:#}");
                Self {
                    path: Some(path.as_ref().to_path_buf()),
                    values: BTreeMap::new(),
                }
            }
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get_string(key).and_then(|v| v.parse().ok())
    }

    pub fn set_u32(&mut self, key: &str, value: u32) {
        self.set_string(key, value.to_string());
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("无法创建目录 {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, json).with_context(|| format!("无法写入存档 {}", path.display()))
    }

    /// 保存失败只记日志
    pub fn flush(&self) {
        if let Err(err) = self.save() {
            error!("保存存档失败: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("rpg_panels_prefs_{}", std::process::id()));
        let path = dir.join("prefs.json");

        let mut store = PrefsStore::open(&path).unwrap();
        store.set_u32("gold", 250);
        store.set_string("equipped_items", r#"{"weapon":"iron_sword"}"#);
        store.save().unwrap();

        let reopened = PrefsStore::open(&path).unwrap();
        assert_eq!(reopened.get_u32("gold"), Some(250));
        assert_eq!(
            reopened.get_string("equipped_items"),
            Some(r#"{"weapon":"iron_sword"}"#)
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn non_numeric_value_reads_as_none() {
        let mut store = PrefsStore::in_memory();
        store.set_string("bank_expansions", "many");
        assert_eq!(store.get_u32("bank_expansions"), None);
        assert!(store.save().is_ok());
    }
}
