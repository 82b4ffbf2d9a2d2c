//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{KeyboardRemove, ParseMode};
use tracing::{debug, info};

use crate::conversation::{advance, Ctx, Event};
use crate::db::get_user;
use crate::dialogue::{BotDialogueState, MatchDialogue};
use crate::localization::{detect_language, t_args_lang, t_lang};

use super::dialogue_manager::apply_transition;
use super::match_handler::open_criteria;
use super::ui_builder::{create_edit_menu_keyboard, create_view_keyboard, format_profile_card};

/// Slash commands understood in every state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    View,
    Edit,
    Match,
    Cancel,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::Help,
        Command::View,
        Command::Edit,
        Command::Match,
        Command::Cancel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::View => "view",
            Command::Edit => "edit",
            Command::Match => "match",
            Command::Cancel => "cancel",
        }
    }

    /// Localization key of the command description
    pub fn description_key(&self) -> &'static str {
        match self {
            Command::Start => "command-start",
            Command::Help => "command-help",
            Command::View => "command-view",
            Command::Edit => "command-edit",
            Command::Match => "command-match",
            Command::Cancel => "command-cancel",
        }
    }

    /// Parse `/name`, `/name@BotName` or `/name args`
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or_default().to_lowercase();
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

/// Handle incoming messages
pub async fn message_handler(bot: Bot, msg: Message, pool: Arc<PgPool>, dialogue: MatchDialogue) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = msg.from.as_ref().and_then(|user| user.language_code.clone());
    let language_code = language_code.as_deref();

    let Some(text) = msg.text() else {
        debug!(user_id = %chat_id, "Ignoring non-text message");
        bot.send_message(chat_id, t_lang("unsupported-message", language_code))
            .await?;
        return Ok(());
    };

    if let Some(command) = Command::parse(text) {
        return handle_command(&bot, &msg, &pool, &dialogue, command, language_code).await;
    }

    let state = dialogue.get().await?.unwrap_or_default();

    // Unknown commands only mean something inside the edit menu
    if text.trim_start().starts_with('/') && state != BotDialogueState::EditMenu {
        bot.send_message(chat_id, t_lang("unknown-command", language_code))
            .await?;
        return Ok(());
    }

    let stored_interests = match state {
        BotDialogueState::EditMenu => get_user(&pool, chat_id.0)
            .await?
            .map(|profile| profile.interests)
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let ctx = Ctx {
        telegram_id: chat_id.0,
        username: msg.from.as_ref().and_then(|user| user.username.clone()),
        language_code: detect_language(language_code),
        stored_interests: &stored_interests,
    };

    let transition = advance(&state, Event::Text(text.to_string()), &ctx);
    apply_transition(&bot, &pool, &dialogue, transition, None, language_code).await
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    command: Command,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    info!(user_id = %chat_id, command = command.name(), "Command received");

    match command {
        Command::Start => match get_user(pool, chat_id.0).await? {
            Some(profile) => {
                dialogue.exit().await?;
                let name = profile.name.unwrap_or_default();
                bot.send_message(chat_id, t_args_lang("welcome-back", &[("name", &name)], language_code))
                    .reply_markup(KeyboardRemove::new())
                    .await?;
            }
            None => {
                dialogue.update(BotDialogueState::new_profile()).await?;
                bot.send_message(chat_id, t_lang("welcome", language_code))
                    .await?;
                bot.send_message(chat_id, t_lang("ask-name", language_code))
                    .reply_markup(KeyboardRemove::new())
                    .await?;
            }
        },
        Command::Help => {
            let commands = Command::ALL
                .iter()
                .map(|c| format!("/{} - {}", c.name(), t_lang(c.description_key(), language_code)))
                .collect::<Vec<_>>()
                .join("\n");
            bot.send_message(
                chat_id,
                format!("{}\n\n{}", t_lang("help-text", language_code), commands),
            )
            .await?;
        }
        Command::View => match get_user(pool, chat_id.0).await? {
            Some(profile) => {
                bot.send_message(chat_id, format_profile_card(&profile, language_code))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(create_view_keyboard(language_code))
                    .await?;
            }
            None => {
                bot.send_message(chat_id, t_lang("no-profile", language_code))
                    .await?;
            }
        },
        Command::Edit => open_edit_menu(bot, pool, dialogue, language_code).await?,
        Command::Match => {
            if get_user(pool, chat_id.0).await?.is_some() {
                open_criteria(bot, dialogue, language_code).await?;
            } else {
                bot.send_message(chat_id, t_lang("no-profile", language_code))
                    .await?;
            }
        }
        Command::Cancel => {
            dialogue.exit().await?;
            bot.send_message(chat_id, t_lang("cancelled", language_code))
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
    }

    Ok(())
}

/// Enter the edit menu if the user has a stored profile
pub async fn open_edit_menu(
    bot: &Bot,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    if get_user(pool, chat_id.0).await?.is_none() {
        bot.send_message(chat_id, t_lang("no-profile", language_code))
            .await?;
        return Ok(());
    }

    dialogue.update(BotDialogueState::EditMenu).await?;
    bot.send_message(chat_id, t_lang("edit-menu", language_code))
        .reply_markup(create_edit_menu_keyboard(language_code))
        .await?;
    Ok(())
}
