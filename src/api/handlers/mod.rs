pub mod command;
pub mod event;
pub mod feed;
pub mod health;
pub mod room;
