//! This is the library of the ciflow bot.
pub mod config;
pub mod dispatch;
pub mod github;
pub mod utils;

#[cfg(test)]
mod tests;
