//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles commands and text answers
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `match_handler`: Runs the criterion picker and the like/dislike loop
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Applies conversation transitions

pub mod callback_handler;
pub mod dialogue_manager;
pub mod match_handler;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::dialogue::BotDialogueState;
use crate::localization::{t_lang, DEFAULT_LANGUAGE};
use crate::session_store::SessionStore;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{message_handler, Command};

/// Update routing: messages and callback queries, both inside the chat dialogue
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, SessionStore<BotDialogueState>, BotDialogueState>()
        .endpoint(message_handler);

    let callbacks = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, SessionStore<BotDialogueState>, BotDialogueState>()
        .endpoint(callback_handler);

    dptree::entry().branch(messages).branch(callbacks)
}

/// Command list registered with Telegram for the client menu
pub fn command_menu() -> Vec<BotCommand> {
    Command::ALL
        .iter()
        .map(|command| BotCommand::new(command.name(), t_lang(command.description_key(), Some(DEFAULT_LANGUAGE))))
        .collect()
}
