pub mod availability;
pub mod calendar;
pub mod capacity;
pub mod commands;
pub mod decision;
pub mod effects;
pub mod ledger;
pub mod messages;
pub mod reminder;
