//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::conversation::{advance, Ctx, Event};
use crate::dialogue::MatchDialogue;
use crate::localization::detect_language;
use crate::matching::Decision;

use super::dialogue_manager::apply_transition;
use super::match_handler::{handle_criterion, handle_judgment, open_criteria, reject_unknown_criterion, stop_matching};
use super::message_handler::open_edit_menu;
use super::ui_builder::CallbackAction;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: teloxide::types::CallbackQuery,
    pool: Arc<PgPool>,
    dialogue: MatchDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Stop the client-side spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        debug!(user_id = %q.from.id, "Unknown callback data");
        return Ok(());
    };

    let Some(message) = &q.message else {
        debug!(user_id = %q.from.id, "Callback without an accessible message");
        return Ok(());
    };
    let message_id = message.id();
    let language_code = q.from.language_code.as_deref();

    let event = match action {
        CallbackAction::ToggleInterest(index) => Event::ToggleInterest(index),
        CallbackAction::InterestsDone => Event::InterestsDone,
        CallbackAction::ConfirmYes => Event::ConfirmYes,
        CallbackAction::ConfirmNo => Event::ConfirmNo,
        CallbackAction::Criterion(criterion) => {
            return handle_criterion(&bot, &pool, &dialogue, criterion, language_code).await;
        }
        CallbackAction::UnknownCriterion => {
            return reject_unknown_criterion(&bot, &dialogue, language_code).await;
        }
        CallbackAction::Like(candidate_id) => {
            return handle_judgment(&bot, &pool, &dialogue, candidate_id, Decision::Like, language_code).await;
        }
        CallbackAction::Dislike(candidate_id) => {
            return handle_judgment(&bot, &pool, &dialogue, candidate_id, Decision::Dislike, language_code).await;
        }
        CallbackAction::StopMatching => return stop_matching(&bot, &dialogue, language_code).await,
        CallbackAction::ViewEdit => return open_edit_menu(&bot, &pool, &dialogue, language_code).await,
        CallbackAction::ViewMatch => return open_criteria(&bot, &dialogue, language_code).await,
    };

    let state = dialogue.get().await?.unwrap_or_default();
    let ctx = Ctx {
        telegram_id: q.from.id.0 as i64,
        username: q.from.username.clone(),
        language_code: detect_language(language_code),
        stored_interests: &[],
    };

    let transition = advance(&state, event, &ctx);
    apply_transition(&bot, &pool, &dialogue, transition, Some(message_id), language_code).await
}
