pub mod command;
pub mod search;
