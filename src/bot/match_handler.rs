//! Match Handler module: criterion picking and the like/dislike loop

use anyhow::Result;
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info, warn};

use crate::conversation::{after_judgment, judgment_context, start_matching, JudgmentContext, MatchStep};
use crate::db::get_user;
use crate::dialogue::{BotDialogueState, MatchDialogue};
use crate::localization::t_lang;
use crate::matching::{find_candidates, notify_mutual_match, record_judgment, Criterion, Decision, Judgment};
use crate::profile::UserProfile;

use super::ui_builder::{create_candidate_keyboard, create_criteria_keyboard, format_candidate_card};

/// Show the criteria picker
pub async fn open_criteria(bot: &Bot, dialogue: &MatchDialogue, language_code: Option<&str>) -> Result<()> {
    dialogue.update(BotDialogueState::ChoosingCriterion).await?;
    bot.send_message(dialogue.chat_id(), t_lang("choose-criterion", language_code))
        .reply_markup(create_criteria_keyboard(language_code))
        .await?;
    Ok(())
}

/// Start the judging loop with the chosen criterion
pub async fn handle_criterion(
    bot: &Bot,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    criterion: Criterion,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();
    info!(user_id = %chat_id, criterion = criterion.as_str(), "Matching started");

    let Some(requester) = get_user(pool, chat_id.0).await? else {
        dialogue.exit().await?;
        bot.send_message(chat_id, t_lang("no-profile", language_code))
            .await?;
        return Ok(());
    };

    let candidates = find_candidates(pool, &requester, criterion).await?;
    let step = start_matching(criterion, candidates.first().map(|c| c.telegram_id));
    present_step(bot, dialogue, step, candidates.first(), language_code).await
}

/// A criterion tag that does not map to a filter matches nobody
pub async fn reject_unknown_criterion(
    bot: &Bot,
    dialogue: &MatchDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    debug!(user_id = %dialogue.chat_id(), "Unknown criterion tag");
    dialogue.exit().await?;
    bot.send_message(dialogue.chat_id(), t_lang("no-candidates", language_code))
        .await?;
    Ok(())
}

/// Record a like/dislike for a candidate and move on.
///
/// A tap on an older card while another candidate is on screen is ignored.
/// Without a judging session the judgment is still recorded, then the loop
/// ends since there is no criterion to continue with.
pub async fn handle_judgment(
    bot: &Bot,
    pool: &PgPool,
    dialogue: &MatchDialogue,
    candidate_id: i64,
    decision: Decision,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    let state = dialogue.get().await?;
    let criterion = match judgment_context(state.as_ref(), candidate_id) {
        JudgmentContext::OnScreen(criterion) => Some(criterion),
        JudgmentContext::Stale => {
            debug!(user_id = %chat_id, candidate_id, state = ?state, "Ignoring judgment for a candidate not on screen");
            return Ok(());
        }
        JudgmentContext::NoSession => {
            info!(user_id = %chat_id, candidate_id, "Judgment outside a matching session");
            None
        }
    };

    let Some(requester) = get_user(pool, chat_id.0).await? else {
        dialogue.exit().await?;
        bot.send_message(chat_id, t_lang("no-profile", language_code))
            .await?;
        return Ok(());
    };

    let judgment = record_judgment(pool, requester.telegram_id, candidate_id, decision).await?;
    debug!(user_id = %chat_id, candidate_id, decision = decision.as_str(), judgment = ?judgment, "Judgment recorded");

    if judgment == Judgment::MutualMatch {
        match get_user(pool, candidate_id).await? {
            Some(candidate) => {
                notify_mutual_match(bot, &requester, &candidate).await;
            }
            None => debug!(candidate_id, "Matched user no longer exists"),
        }
    }

    let candidates = match criterion {
        Some(criterion) => find_candidates(pool, &requester, criterion).await?,
        None => Vec::new(),
    };
    let step = after_judgment(criterion, candidates.first().map(|c| c.telegram_id));
    present_step(bot, dialogue, step, candidates.first(), language_code).await
}

pub async fn stop_matching(bot: &Bot, dialogue: &MatchDialogue, language_code: Option<&str>) -> Result<()> {
    dialogue.exit().await?;
    bot.send_message(dialogue.chat_id(), t_lang("matching-stopped", language_code))
        .await?;
    Ok(())
}

/// Store the step's state and show the candidate card or the closing message
async fn present_step(
    bot: &Bot,
    dialogue: &MatchDialogue,
    step: MatchStep,
    candidate: Option<&UserProfile>,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = dialogue.chat_id();

    match (&step, candidate) {
        (MatchStep::Show { .. }, Some(candidate)) => {
            dialogue.update(step.next_state()).await?;
            bot.send_message(chat_id, format_candidate_card(candidate, language_code))
                .parse_mode(ParseMode::Html)
                .reply_markup(create_candidate_keyboard(candidate.telegram_id, language_code))
                .await?;
        }
        (MatchStep::Finish(key), _) => {
            info!(user_id = %chat_id, reason = *key, "Matching loop finished");
            dialogue.exit().await?;
            bot.send_message(chat_id, t_lang(key, language_code))
                .await?;
        }
        (MatchStep::Show { candidate_id, .. }, None) => {
            warn!(user_id = %chat_id, candidate_id, "Candidate profile missing, leaving matching loop");
            dialogue.exit().await?;
        }
    }

    Ok(())
}
