//! # Mama Match Telegram Bot
//!
//! A Telegram bot that builds profiles through a guided conversation and
//! matches users by location, status or shared interests. Mutual likes are
//! announced to both sides.

pub mod bot;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dialogue;
pub mod health;
pub mod localization;
pub mod logging;
pub mod matching;
pub mod profile;
pub mod seed;
pub mod session_store;
