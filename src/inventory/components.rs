use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const PLAYER: &str = "player";
pub const BANK: &str = "bank";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("容器不存在: {0}")]
    UnknownContainer(String),
    #[error("数量必须大于 0")]
    ZeroQuantity,
    #[error("{container} 空间不足")]
    ContainerFull { container: String },
    #[error("{item} 数量不足（需要 {requested}，只有 {available}）")]
    NotEnough {
        item: String,
        requested: u32,
        available: u32,
    },
    #[error("格子索引超出范围: {0}")]
    InvalidSlot(usize),
    #[error("第 {0} 格为空")]
    EmptySlot(usize),
    #[error("缩小容量会丢弃物品")]
    WouldDropItems,
}

/// 单个格子；item_id 为 None 时视为空格，quantity 为 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub item_id: Option<String>,
    pub quantity: u32,
}

impl Slot {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: Some(item_id.into()),
            quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_id.is_none() || self.quantity == 0
    }

    pub fn holds(&self, item: &str) -> bool {
        !self.is_empty() && self.item_id.as_deref() == Some(item)
    }

    fn clear(&mut self) {
        *self = Slot::default();
    }
}

/// 有序格子列表，容量即格子数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub slots: Vec<Slot>,
}

impl Container {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            slots: vec![Slot::default(); size],
        }
    }

    pub fn max_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn count_item(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.holds(item))
            .map(|s| s.quantity)
            .sum()
    }

    /// 还能放下多少个该物品
    pub fn room_for(&self, item: &str, max_stack: u32) -> u32 {
        self.slots
            .iter()
            .map(|s| {
                if s.is_empty() {
                    max_stack
                } else if s.holds(item) {
                    max_stack.saturating_sub(s.quantity)
                } else {
                    0
                }
            })
            .sum()
    }

    /// 先补满已有堆叠，再占用最靠前的空格
    fn insert(&mut self, item: &str, mut quantity: u32, max_stack: u32) {
        for slot in self.slots.iter_mut().filter(|s| s.holds(item)) {
            let moved = quantity.min(max_stack.saturating_sub(slot.quantity));
            slot.quantity += moved;
            quantity -= moved;
            if quantity == 0 {
                return;
            }
        }
        for slot in self.slots.iter_mut().filter(|s| s.is_empty()) {
            let moved = quantity.min(max_stack);
            *slot = Slot::new(item, moved);
            quantity -= moved;
            if quantity == 0 {
                return;
            }
        }
    }

    /// 从靠后的堆叠开始扣
    fn extract(&mut self, item: &str, mut quantity: u32) {
        for slot in self.slots.iter_mut().rev().filter(|s| s.holds(item)) {
            let moved = quantity.min(slot.quantity);
            slot.quantity -= moved;
            quantity -= moved;
            if slot.quantity == 0 {
                slot.clear();
            }
            if quantity == 0 {
                return;
            }
        }
    }
}

/// 所有命名容器（player / bank …）的唯一持有者
///
/// 每次成功修改都会把容器 id 标记为脏，由 `flush_container_changes`
/// 每帧转换成一条 `ContainerChanged`。
#[derive(Resource, Debug, Default)]
pub struct InventoryManager {
    containers: BTreeMap<String, Container>,
    dirty: BTreeSet<String>,
}

impl InventoryManager {
    pub fn create_container(&mut self, id: &str, size: usize) {
        self.containers
            .insert(id.to_string(), Container::with_capacity(size));
        self.dirty.insert(id.to_string());
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn container_ids(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    fn container_mut(&mut self, id: &str) -> Result<&mut Container, InventoryError> {
        self.containers
            .get_mut(id)
            .ok_or_else(|| InventoryError::UnknownContainer(id.to_string()))
    }

    fn touch(&mut self, id: &str) {
        self.dirty.insert(id.to_string());
    }

    pub fn count_item(&self, id: &str, item: &str) -> u32 {
        self.container(id).map_or(0, |c| c.count_item(item))
    }

    pub fn has_item(&self, id: &str, item: &str) -> bool {
        self.count_item(id, item) > 0
    }

    pub fn slot(&self, id: &str, index: usize) -> Option<&Slot> {
        self.container(id).and_then(|c| c.slots.get(index))
    }

    /// 放不下全部数量时整体失败，不做部分写入
    pub fn add_item(
        &mut self,
        id: &str,
        item: &str,
        quantity: u32,
        max_stack: u32,
    ) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let max_stack = max_stack.max(1);
        let container = self.container_mut(id)?;
        if container.room_for(item, max_stack) < quantity {
            return Err(InventoryError::ContainerFull {
                container: id.to_string(),
            });
        }
        container.insert(item, quantity, max_stack);
        self.touch(id);
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str, item: &str, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::ZeroQuantity);
        }
        let container = self.container_mut(id)?;
        let available = container.count_item(item);
        if available < quantity {
            return Err(InventoryError::NotEnough {
                item: item.to_string(),
                requested: quantity,
                available,
            });
        }
        container.extract(item, quantity);
        self.touch(id);
        Ok(())
    }

    /// 从指定格子扣除数量，返回物品 id
    pub fn consume_at(&mut self, id: &str, index: usize, quantity: u32) -> Result<String, InventoryError> {
        let container = self.container_mut(id)?;
        let slot = container
            .slots
            .get_mut(index)
            .ok_or(InventoryError::InvalidSlot(index))?;
        let Some(item) = slot.item_id.clone().filter(|_| slot.quantity > 0) else {
            return Err(InventoryError::EmptySlot(index));
        };
        if slot.quantity < quantity {
            return Err(InventoryError::NotEnough {
                item,
                requested: quantity,
                available: slot.quantity,
            });
        }
        slot.quantity -= quantity;
        if slot.quantity == 0 {
            slot.clear();
        }
        self.touch(id);
        Ok(item)
    }

    /// 取走整格
    pub fn take_slot(&mut self, id: &str, index: usize) -> Result<Slot, InventoryError> {
        let container = self.container_mut(id)?;
        let slot = container
            .slots
            .get_mut(index)
            .ok_or(InventoryError::InvalidSlot(index))?;
        if slot.is_empty() {
            return Err(InventoryError::EmptySlot(index));
        }
        let taken = std::mem::take(slot);
        self.touch(id);
        Ok(taken)
    }

    /// 整格搬到另一个容器；目标放不下时原样放回
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        index: usize,
        max_stack: u32,
    ) -> Result<Slot, InventoryError> {
        self.container_mut(to)?;
        let taken = self.take_slot(from, index)?;
        let item = taken.item_id.clone().unwrap_or_default();
        if let Err(err) = self.add_item(to, &item, taken.quantity, max_stack) {
            if let Ok(container) = self.container_mut(from) {
                container.slots[index] = taken;
            }
            return Err(err);
        }
        Ok(taken)
    }

    /// 扩容追加空格；缩容只允许丢弃空格
    pub fn resize(&mut self, id: &str, new_size: usize) -> Result<(), InventoryError> {
        let container = self.container_mut(id)?;
        if new_size < container.slots.len()
            && container.slots[new_size..].iter().any(|s| !s.is_empty())
        {
            return Err(InventoryError::WouldDropItems);
        }
        container.slots.resize(new_size, Slot::default());
        self.touch(id);
        Ok(())
    }

    /// 合并同类堆叠并按 id 排序，空格放最后
    pub fn sort(&mut self, id: &str, max_stack: impl Fn(&str) -> u32) -> Result<(), InventoryError> {
        let container = self.container_mut(id)?;
        let mut totals: BTreeMap<String, u32> = BTreeMap::new();
        for slot in container.slots.iter().filter(|s| !s.is_empty()) {
            if let Some(item) = &slot.item_id {
                *totals.entry(item.clone()).or_default() += slot.quantity;
            }
        }

        let size = container.slots.len();
        let mut sorted = Vec::with_capacity(size);
        for (item, mut total) in totals {
            let stack = max_stack(&item).max(1);
            while total > 0 {
                let quantity = total.min(stack);
                sorted.push(Slot::new(item.clone(), quantity));
                total -= quantity;
            }
        }
        sorted.resize(size, Slot::default());
        container.slots = sorted;
        self.touch(id);
        Ok(())
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// 取出本帧所有被修改过的容器 id
    pub fn drain_changed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> InventoryManager {
        let mut inv = InventoryManager::default();
        inv.create_container(PLAYER, 3);
        inv.drain_changed();
        inv
    }

    #[test]
    fn add_tops_up_stacks_before_using_empty_slots() {
        let mut inv = manager();
        inv.add_item(PLAYER, "herb", 5, 10).unwrap();
        inv.add_item(PLAYER, "herb", 8, 10).unwrap();
        let c = inv.container(PLAYER).unwrap();
        assert_eq!(c.slots[0], Slot::new("herb", 10));
        assert_eq!(c.slots[1], Slot::new("herb", 3));
        assert!(c.slots[2].is_empty());
        assert_eq!(inv.drain_changed(), vec![PLAYER.to_string()]);
    }

    #[test]
    fn add_that_does_not_fit_changes_nothing() {
        let mut inv = manager();
        inv.add_item(PLAYER, "sword", 1, 1).unwrap();
        inv.add_item(PLAYER, "herb", 15, 10).unwrap();
        inv.drain_changed();

        let before = inv.container(PLAYER).unwrap().clone();
        let err = inv.add_item(PLAYER, "herb", 6, 10).unwrap_err();
        assert_eq!(
            err,
            InventoryError::ContainerFull {
                container: PLAYER.into()
            }
        );
        assert_eq!(inv.container(PLAYER).unwrap(), &before);
        assert!(inv.drain_changed().is_empty());
    }

    #[test]
    fn remove_takes_from_the_last_stack_first() {
        let mut inv = manager();
        inv.add_item(PLAYER, "herb", 15, 10).unwrap();
        inv.remove_item(PLAYER, "herb", 7).unwrap();
        let c = inv.container(PLAYER).unwrap();
        assert_eq!(c.slots[0], Slot::new("herb", 8));
        assert!(c.slots[1].is_empty());

        let err = inv.remove_item(PLAYER, "herb", 9).unwrap_err();
        assert!(matches!(err, InventoryError::NotEnough { available: 8, .. }));
    }

    #[test]
    fn unknown_container_is_reported() {
        let mut inv = manager();
        assert_eq!(
            inv.add_item("chest", "herb", 1, 1),
            Err(InventoryError::UnknownContainer("chest".into()))
        );
    }

    #[test]
    fn resize_grows_and_refuses_to_drop_items() {
        let mut inv = manager();
        inv.resize(PLAYER, 5).unwrap();
        assert_eq!(inv.container(PLAYER).unwrap().max_slots(), 5);

        inv.add_item(PLAYER, "a", 1, 1).unwrap();
        inv.add_item(PLAYER, "b", 1, 1).unwrap();
        inv.add_item(PLAYER, "c", 1, 1).unwrap();
        assert_eq!(inv.resize(PLAYER, 2), Err(InventoryError::WouldDropItems));
        inv.resize(PLAYER, 3).unwrap();
        assert_eq!(inv.container(PLAYER).unwrap().used_slots(), 3);
    }

    #[test]
    fn sort_merges_partial_stacks() {
        let mut inv = InventoryManager::default();
        inv.create_container(BANK, 5);
        inv.add_item(BANK, "ore", 1, 1).unwrap();
        inv.add_item(BANK, "herb", 1, 1).unwrap();
        inv.add_item(BANK, "ore", 1, 1).unwrap();
        inv.sort(BANK, |_| 10).unwrap();

        let c = inv.container(BANK).unwrap();
        assert_eq!(c.slots[0], Slot::new("herb", 1));
        assert_eq!(c.slots[1], Slot::new("ore", 2));
        assert!(c.slots[2..].iter().all(Slot::is_empty));
        assert_eq!(c.max_slots(), 5);
    }

    #[test]
    fn transfer_rolls_back_when_target_is_full() {
        let mut inv = manager();
        inv.create_container(BANK, 1);
        inv.add_item(BANK, "ore", 1, 1).unwrap();
        inv.add_item(PLAYER, "herb", 2, 10).unwrap();

        assert!(inv.transfer(PLAYER, BANK, 0, 10).is_err());
        assert_eq!(inv.slot(PLAYER, 0), Some(&Slot::new("herb", 2)));

        inv.remove_item(BANK, "ore", 1).unwrap();
        let moved = inv.transfer(PLAYER, BANK, 0, 10).unwrap();
        assert_eq!(moved, Slot::new("herb", 2));
        assert!(inv.slot(PLAYER, 0).unwrap().is_empty());
        assert_eq!(inv.count_item(BANK, "herb"), 2);
    }

    #[test]
    fn consume_at_clears_exhausted_slot() {
        let mut inv = manager();
        inv.add_item(PLAYER, "potion", 1, 20).unwrap();
        assert_eq!(inv.consume_at(PLAYER, 0, 1).unwrap(), "potion");
        assert!(inv.slot(PLAYER, 0).unwrap().is_empty());
        assert_eq!(inv.consume_at(PLAYER, 0, 1), Err(InventoryError::EmptySlot(0)));
        assert_eq!(inv.consume_at(PLAYER, 9, 1), Err(InventoryError::InvalidSlot(9)));
    }
}
