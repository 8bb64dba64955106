use bevy::prelude::*;
use thiserror::Error;

use crate::core::resources::GameConfig;
use crate::core::storage::PrefsStore;
use crate::inventory::components::{InventoryError, InventoryManager, BANK};

pub const GOLD_KEY: &str = "gold";
pub const BANK_EXPANSIONS_KEY: &str = "bank_expansions";

/// 玩家金币
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wallet {
    pub gold: u32,
}

impl Wallet {
    pub fn load(prefs: &PrefsStore, starting_gold: u32) -> Self {
        Self {
            gold: prefs.get_u32(GOLD_KEY).unwrap_or(starting_gold),
        }
    }

    pub fn save(&self, prefs: &mut PrefsStore) {
        prefs.set_u32(GOLD_KEY, self.gold);
        prefs.flush();
    }
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankState {
    pub expansions: u32,
}

/// 扩容规则：每次 +step 格，价格 base_cost + cost_step × 已扩容次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionRules {
    pub base_capacity: usize,
    pub step: usize,
    pub base_cost: u32,
    pub cost_step: u32,
    pub max_capacity: usize,
}

impl ExpansionRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            base_capacity: config.bank_base_capacity,
            step: config.bank_expansion_step,
            base_cost: config.bank_expansion_base_cost,
            cost_step: config.bank_expansion_cost_step,
            max_capacity: config.bank_max_capacity,
        }
    }

    /// 读档时按扩容次数还原容量，不超过上限
    pub fn capacity(&self, expansions: u32) -> usize {
        self.step
            .saturating_mul(expansions as usize)
            .saturating_add(self.base_capacity)
            .min(self.max_capacity.max(self.base_capacity))
    }

    /// 到达上限前最多能扩容的次数
    pub fn max_expansions(&self) -> u32 {
        if self.step == 0 {
            return 0;
        }
        let room = self.max_capacity.saturating_sub(self.base_capacity) / self.step;
        u32::try_from(room).unwrap_or(u32::MAX)
    }

    pub fn cost(&self, expansions: u32) -> u32 {
        self.cost_step
            .saturating_mul(expansions)
            .saturating_add(self.base_cost)
    }

    pub fn can_expand(&self, current_capacity: usize) -> bool {
        self.step > 0 && current_capacity + self.step <= self.max_capacity
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("银行已达容量上限 ({capacity})")]
    MaxCapacity { capacity: usize },
    #[error("金币不足：需要 {cost}，只有 {gold}")]
    NotEnoughGold { cost: u32, gold: u32 },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionReceipt {
    pub cost: u32,
    pub capacity: usize,
}

/// 扣钱并给银行追加一档格子
pub fn expand_bank(
    state: &mut BankState,
    wallet: &mut Wallet,
    inventory: &mut InventoryManager,
    rules: &ExpansionRules,
) -> Result<ExpansionReceipt, BankError> {
    let capacity = inventory
        .container(BANK)
        .map(|c| c.max_slots())
        .ok_or_else(|| InventoryError::UnknownContainer(BANK.to_string()))?;
    if !rules.can_expand(capacity) {
        return Err(BankError::MaxCapacity { capacity });
    }
    let cost = rules.cost(state.expansions);
    if wallet.gold < cost {
        return Err(BankError::NotEnoughGold {
            cost,
            gold: wallet.gold,
        });
    }

    let capacity = capacity + rules.step;
    inventory.resize(BANK, capacity)?;
    wallet.gold -= cost;
    state.expansions = state.expansions.saturating_add(1);
    Ok(ExpansionReceipt { cost, capacity })
}

pub fn info_text(used: usize, capacity: usize, gold: u32) -> String {
    format!("存储 {used}/{capacity}  金币 {gold}")
}

pub fn expand_label(rules: &ExpansionRules, expansions: u32, capacity: usize) -> String {
    if rules.can_expand(capacity) {
        format!("扩容 +{} ({} 金币)", rules.step, rules.cost(expansions))
    } else {
        "已达上限".to_string()
    }
}

/// 银行面板标记：与 `ContainerPanel` 挂在同一实体上
#[derive(Component)]
pub struct BankPanel;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankButton {
    Sort,
    Expand,
}

#[derive(Component)]
pub struct BankInfoText;

#[derive(Component)]
pub struct BankExpandText;

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExpansionRules {
        ExpansionRules::from_config(&GameConfig::default())
    }

    fn bank(capacity: usize) -> InventoryManager {
        let mut inventory = InventoryManager::default();
        inventory.create_container(BANK, capacity);
        inventory
    }

    #[test]
    fn each_expansion_adds_ten_slots_at_a_rising_price() {
        let rules = rules();
        let mut state = BankState::default();
        let mut wallet = Wallet { gold: 1000 };
        let mut inventory = bank(rules.capacity(0));

        let first = expand_bank(&mut state, &mut wallet, &mut inventory, &rules).unwrap();
        assert_eq!(first, ExpansionReceipt { cost: 100, capacity: 40 });
        let second = expand_bank(&mut state, &mut wallet, &mut inventory, &rules).unwrap();
        assert_eq!(second, ExpansionReceipt { cost: 150, capacity: 50 });

        assert_eq!(state.expansions, 2);
        assert_eq!(wallet.gold, 750);
        assert_eq!(inventory.container(BANK).unwrap().max_slots(), 50);
        assert_eq!(rules.cost(state.expansions), 200);
    }

    #[test]
    fn cost_follows_the_step_function() {
        let rules = rules();
        for n in 0..10 {
            assert_eq!(rules.cost(n), 100 + 50 * n);
        }
    }

    #[test]
    fn not_enough_gold_changes_nothing() {
        let rules = rules();
        let mut state = BankState { expansions: 3 };
        let mut wallet = Wallet { gold: 249 };
        let mut inventory = bank(60);

        assert_eq!(
            expand_bank(&mut state, &mut wallet, &mut inventory, &rules),
            Err(BankError::NotEnoughGold { cost: 250, gold: 249 })
        );
        assert_eq!(state.expansions, 3);
        assert_eq!(wallet.gold, 249);
        assert_eq!(inventory.container(BANK).unwrap().max_slots(), 60);
    }

    #[test]
    fn capacity_is_capped() {
        let rules = rules();
        let mut state = BankState { expansions: 17 };
        let mut wallet = Wallet { gold: 100_000 };
        let mut inventory = bank(200);
        assert_eq!(
            expand_bank(&mut state, &mut wallet, &mut inventory, &rules),
            Err(BankError::MaxCapacity { capacity: 200 })
        );
        assert_eq!(rules.capacity(40), 200);
        assert_eq!(expand_label(&rules, 17, 200), "已达上限");
        assert_eq!(expand_label(&rules, 2, 50), "扩容 +10 (200 金币)");
    }

    #[test]
    fn corrupt_expansion_count_saturates_instead_of_overflowing() {
        let rules = rules();
        assert_eq!(rules.cost(u32::MAX), u32::MAX);
        assert_eq!(rules.capacity(u32::MAX), 200);
        assert_eq!(rules.max_expansions(), 17);

        let mut state = BankState { expansions: u32::MAX };
        let mut wallet = Wallet { gold: 1000 };
        let mut inventory = bank(30);
        assert_eq!(
            expand_bank(&mut state, &mut wallet, &mut inventory, &rules),
            Err(BankError::NotEnoughGold { cost: u32::MAX, gold: 1000 })
        );
        assert_eq!(inventory.container(BANK).unwrap().max_slots(), 30);
    }

    #[test]
    fn missing_bank_container_is_an_error() {
        let rules = rules();
        let mut inventory = InventoryManager::default();
        let err = expand_bank(
            &mut BankState::default(),
            &mut Wallet { gold: 500 },
            &mut inventory,
            &rules,
        )
        .unwrap_err();
        assert!(matches!(err, BankError::Inventory(InventoryError::UnknownContainer(_))));
    }

    #[test]
    fn wallet_defaults_to_starting_gold() {
        let mut prefs = PrefsStore::in_memory();
        assert_eq!(Wallet::load(&prefs, 500).gold, 500);
        Wallet { gold: 42 }.save(&mut prefs);
        assert_eq!(Wallet::load(&prefs, 500).gold, 42);
    }
}
