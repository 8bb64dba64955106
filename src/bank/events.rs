use bevy::prelude::*;

#[derive(Event, Debug, Default)]
pub struct ExpandBankEvent;

#[derive(Event, Debug, Default)]
pub struct SortBankEvent;
