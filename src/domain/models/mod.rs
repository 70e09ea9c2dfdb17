pub mod attendance;
pub mod booking;
pub mod command;
pub mod event;
pub mod reminder;
pub mod room;
pub mod vote;
