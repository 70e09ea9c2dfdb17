pub mod calendar;
pub mod chat;
pub mod factory;
pub mod repositories;
