//! Dialogue Manager module: applies conversation transitions to Telegram and the database

use anyhow::Result;
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use tracing::{debug, error, info, warn};

use crate::conversation::{Commit, Reply, Transition};
use crate::db::{apply_profile_update, upsert_profile};
use crate::dialogue::{BotDialogueState, MatchDialogue};
use crate::localization::t_lang;

use super::ui_builder::{create_confirm_keyboard, create_interests_keyboard, format_draft_summary, keyboard_markup};

/// Persist the transition's commit, store the next state and send the replies.
///
/// `source_message` is the message whose inline keyboard was tapped, if any.
/// A failed database write leaves the dialogue where it was.
pub async fn apply_transition(
    bot: &Bot,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    transition: Transition,
    source_message: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    if let Some(commit) = transition.commit {
        if !persist_commit(bot, pool, dialogue, commit, language_code).await? {
            return Ok(());
        }
    }

    match transition.next {
        BotDialogueState::Start => dialogue.exit().await?,
        next => {
            debug!(user_id = %chat_id, state = ?next, "Dialogue state updated");
            dialogue.update(next).await?
        }
    }

    for reply in transition.replies {
        send_reply(bot, chat_id, reply, source_message, language_code).await?;
    }

    Ok(())
}

/// Returns `false` when the write did not happen and the flow must stop
async fn persist_commit(
    bot: &Bot,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    commit: Commit,
    language_code: Option<&str>,
) -> Result<bool> {
    let chat_id = dialogue.chat_id();

    match commit {
        Commit::CreateProfile(profile) => match upsert_profile(pool, &profile).await {
            Ok(saved) => {
                info!(user_id = %chat_id, telegram_id = saved.telegram_id, "Profile created");
                Ok(true)
            }
            Err(e) => {
                error!(user_id = %chat_id, error = %e, "Failed to save profile");
                bot.send_message(chat_id, t_lang("error-save-failed", language_code))
                    .await?;
                Ok(false)
            }
        },
        Commit::Update(update) => match apply_profile_update(pool, chat_id.0, &update).await {
            Ok(true) => {
                info!(user_id = %chat_id, "Profile updated");
                Ok(true)
            }
            Ok(false) => {
                warn!(user_id = %chat_id, "Profile update for unknown user");
                dialogue.exit().await?;
                bot.send_message(chat_id, t_lang("no-profile", language_code))
                    .await?;
                Ok(false)
            }
            Err(e) => {
                error!(user_id = %chat_id, error = %e, "Failed to update profile");
                bot.send_message(chat_id, t_lang("error-save-failed", language_code))
                    .await?;
                Ok(false)
            }
        },
    }
}

async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: Reply,
    source_message: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    match reply {
        Reply::Say(key) => {
            bot.send_message(chat_id, t_lang(key, language_code)).await?;
        }
        Reply::Ask { key, keyboard } => {
            bot.send_message(chat_id, t_lang(key, language_code))
                .reply_markup(keyboard_markup(&keyboard, language_code))
                .await?;
        }
        Reply::RefreshInterests { selected } => {
            let keyboard = create_interests_keyboard(&selected, language_code);
            match source_message {
                Some(message_id) => {
                    if let Err(e) = bot
                        .edit_message_reply_markup(chat_id, message_id)
                        .reply_markup(keyboard)
                        .await
                    {
                        // Telegram refuses edits that change nothing
                        debug!(user_id = %chat_id, error = %e, "Interest keyboard not edited");
                    }
                }
                None => {
                    bot.send_message(chat_id, t_lang("ask-interests", language_code))
                        .reply_markup(keyboard)
                        .await?;
                }
            }
        }
        Reply::Summary(draft) => {
            bot.send_message(chat_id, format_draft_summary(&draft, language_code))
                .parse_mode(ParseMode::Html)
                .reply_markup(create_confirm_keyboard(language_code))
                .await?;
        }
    }

    Ok(())
}
