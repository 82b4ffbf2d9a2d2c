//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup,
};
use teloxide::utils::html;

use crate::conversation::Keyboard;
use crate::dialogue::EditMenuItem;
use crate::localization::t_lang;
use crate::matching::Criterion;
use crate::profile::{
    last_regions_page, regions_page, status_emoji, ProfileDraft, UserProfile, INTEREST_OPTIONS, STATUS_OPTIONS,
};

/// Actions carried in inline button callback data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    ToggleInterest(usize),
    InterestsDone,
    ConfirmYes,
    ConfirmNo,
    Criterion(Criterion),
    /// A criterion tag this build does not know
    UnknownCriterion,
    Like(i64),
    Dislike(i64),
    StopMatching,
    ViewEdit,
    ViewMatch,
}

impl CallbackAction {
    pub fn data(&self) -> String {
        match self {
            CallbackAction::ToggleInterest(index) => format!("interest:{index}"),
            CallbackAction::InterestsDone => "interests_done".to_string(),
            CallbackAction::ConfirmYes => "confirm_yes".to_string(),
            CallbackAction::ConfirmNo => "confirm_no".to_string(),
            CallbackAction::Criterion(criterion) => format!("criterion:{}", criterion.as_str()),
            CallbackAction::UnknownCriterion => "criterion:".to_string(),
            CallbackAction::Like(id) => format!("like:{id}"),
            CallbackAction::Dislike(id) => format!("dislike:{id}"),
            CallbackAction::StopMatching => "match_stop".to_string(),
            CallbackAction::ViewEdit => "view_edit".to_string(),
            CallbackAction::ViewMatch => "view_match".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "interests_done" => return Some(CallbackAction::InterestsDone),
            "confirm_yes" => return Some(CallbackAction::ConfirmYes),
            "confirm_no" => return Some(CallbackAction::ConfirmNo),
            "match_stop" => return Some(CallbackAction::StopMatching),
            "view_edit" => return Some(CallbackAction::ViewEdit),
            "view_match" => return Some(CallbackAction::ViewMatch),
            _ => {}
        }

        let (prefix, value) = data.split_once(':')?;
        match prefix {
            "interest" => value.parse().ok().map(CallbackAction::ToggleInterest),
            "criterion" => Some(
                Criterion::parse(value)
                    .map(CallbackAction::Criterion)
                    .unwrap_or(CallbackAction::UnknownCriterion),
            ),
            "like" => value.parse().ok().map(CallbackAction::Like),
            "dislike" => value.parse().ok().map(CallbackAction::Dislike),
            _ => None,
        }
    }

    fn button(self, label: impl Into<String>) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(label, self.data())
    }
}

/// Render a keyboard requested by the conversation flow
pub fn keyboard_markup(keyboard: &Keyboard, language_code: Option<&str>) -> ReplyMarkup {
    match keyboard {
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
        Keyboard::Regions { page } => ReplyMarkup::Keyboard(create_regions_keyboard(*page, language_code)),
        Keyboard::LocationType => ReplyMarkup::Keyboard(create_location_type_keyboard(language_code)),
        Keyboard::Statuses => ReplyMarkup::Keyboard(create_status_keyboard()),
        Keyboard::Interests { selected } => {
            ReplyMarkup::InlineKeyboard(create_interests_keyboard(selected, language_code))
        }
        Keyboard::EditMenu => ReplyMarkup::Keyboard(create_edit_menu_keyboard(language_code)),
        Keyboard::Criteria => ReplyMarkup::InlineKeyboard(create_criteria_keyboard(language_code)),
    }
}

fn reply_rows(labels: Vec<String>, per_row: usize) -> Vec<Vec<KeyboardButton>> {
    labels
        .chunks(per_row)
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
        .collect()
}

/// Region picker page with navigation row
pub fn create_regions_keyboard(page: usize, language_code: Option<&str>) -> KeyboardMarkup {
    let regions = regions_page(page).iter().map(|r| r.to_string()).collect();
    let mut rows = reply_rows(regions, 2);

    let mut navigation = Vec::new();
    if page > 0 {
        navigation.push(KeyboardButton::new(format!("⬅️ {}", t_lang("button-back", language_code))));
    }
    navigation.push(KeyboardButton::new(format!("❌ {}", t_lang("button-cancel", language_code))));
    if page < last_regions_page() {
        navigation.push(KeyboardButton::new(format!("{} ➡️", t_lang("button-next", language_code))));
    }
    rows.push(navigation);

    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn create_location_type_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(format!("🏙 {}", t_lang("button-city", language_code))),
        KeyboardButton::new(format!("🏡 {}", t_lang("button-village", language_code))),
    ]])
    .resize_keyboard()
}

pub fn create_status_keyboard() -> KeyboardMarkup {
    let statuses = STATUS_OPTIONS.iter().map(|s| s.to_string()).collect();
    KeyboardMarkup::new(reply_rows(statuses, 2)).resize_keyboard()
}

pub fn create_edit_menu_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let labels = EditMenuItem::ALL
        .iter()
        .map(|item| format!("{} {}", item.emoji(), t_lang(item.label_key(), language_code)))
        .collect();
    KeyboardMarkup::new(reply_rows(labels, 2)).resize_keyboard()
}

/// Interest toggles; selected options carry a check mark
pub fn create_interests_keyboard(selected: &[String], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = INTEREST_OPTIONS
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let mark = if selected.iter().any(|s| s == option) { "✅" } else { "▫️" };
            vec![CallbackAction::ToggleInterest(index).button(format!("{mark} {option}"))]
        })
        .collect();

    rows.push(vec![CallbackAction::InterestsDone.button(format!(
        "➡️ {}",
        t_lang("button-done", language_code)
    ))]);

    InlineKeyboardMarkup::new(rows)
}

pub fn create_confirm_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        CallbackAction::ConfirmYes.button(format!("✅ {}", t_lang("button-confirm", language_code))),
        CallbackAction::ConfirmNo.button(format!("✏️ {}", t_lang("button-change", language_code))),
    ]])
}

fn criterion_label_key(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::Location => "criterion-location",
        Criterion::Status => "criterion-status",
        Criterion::Interests => "criterion-interests",
        Criterion::LocationInterests => "criterion-location-interests",
    }
}

pub fn create_criteria_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let rows = Criterion::ALL
        .iter()
        .map(|criterion| {
            vec![CallbackAction::Criterion(*criterion).button(t_lang(criterion_label_key(*criterion), language_code))]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Like / dislike buttons for the candidate on screen
pub fn create_candidate_keyboard(candidate_id: i64, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            CallbackAction::Like(candidate_id).button(format!("❤️ {}", t_lang("button-like", language_code))),
            CallbackAction::Dislike(candidate_id).button(format!("👎 {}", t_lang("button-dislike", language_code))),
        ],
        vec![CallbackAction::StopMatching.button(format!("⏹ {}", t_lang("button-stop", language_code)))],
    ])
}

pub fn create_view_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        CallbackAction::ViewEdit.button(format!("✏️ {}", t_lang("button-edit-profile", language_code))),
        CallbackAction::ViewMatch.button(format!("💞 {}", t_lang("button-start-matching", language_code))),
    ]])
}

/// Fields shown on a profile card, borrowed from a stored profile or a draft
struct CardFields<'a> {
    name: Option<&'a str>,
    nickname: Option<&'a str>,
    region: Option<&'a str>,
    place: Option<&'a str>,
    age: Option<i32>,
    status: Option<&'a str>,
    interests: &'a [String],
    bio: Option<&'a str>,
}

fn render_card(fields: CardFields<'_>, language_code: Option<&str>) -> String {
    let not_set = t_lang("card-not-set", language_code);
    let show = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(html::escape)
            .unwrap_or_else(|| not_set.clone())
    };

    let mut card = format!("👤 <b>{}</b>", show(fields.name));
    if let Some(nickname) = fields.nickname.map(str::trim).filter(|n| !n.is_empty()) {
        card.push_str(&format!(" ({})", html::escape(nickname)));
    }

    let location = match (fields.region, fields.place) {
        (Some(region), Some(place)) => format!("{}, {}", html::escape(region), html::escape(place)),
        (region, place) => show(region.or(place)),
    };
    card.push_str(&format!("\n📍 <b>{}:</b> {}", t_lang("card-location", language_code), location));

    let age = fields.age.map(|a| a.to_string());
    card.push_str(&format!(
        "\n🎂 <b>{}:</b> {}",
        t_lang("card-age", language_code),
        show(age.as_deref())
    ));
    card.push_str(&format!(
        "\n{} <b>{}:</b> {}",
        status_emoji(fields.status),
        t_lang("card-status", language_code),
        show(fields.status)
    ));

    card.push_str(&format!("\n🧩 <b>{}:</b>", t_lang("card-interests", language_code)));
    if fields.interests.is_empty() {
        card.push_str(&format!(" {not_set}"));
    } else {
        for interest in fields.interests {
            card.push_str(&format!("\n   • {}", html::escape(interest)));
        }
    }

    card.push_str(&format!(
        "\n📝 <b>{}:</b> {}",
        t_lang("card-bio", language_code),
        show(fields.bio)
    ));

    card
}

/// Profile card of a stored user (HTML)
pub fn format_profile_card(profile: &UserProfile, language_code: Option<&str>) -> String {
    let place = profile.place();
    render_card(
        CardFields {
            name: profile.name.as_deref(),
            nickname: profile.nickname.as_deref(),
            region: profile.region(),
            place: place.as_ref().map(|p| p.name()),
            age: profile.age,
            status: profile.status(),
            interests: &profile.interests,
            bio: profile.bio.as_deref(),
        },
        language_code,
    )
}

/// Card of a candidate shown during matching
pub fn format_candidate_card(candidate: &UserProfile, language_code: Option<&str>) -> String {
    format!(
        "{}\n\n{}",
        t_lang("candidate-header", language_code),
        format_profile_card(candidate, language_code)
    )
}

/// Summary of the creation wizard answers before confirmation
pub fn format_draft_summary(draft: &ProfileDraft, language_code: Option<&str>) -> String {
    let card = render_card(
        CardFields {
            name: draft.name.as_deref(),
            nickname: draft.nickname.as_deref(),
            region: draft.region.as_deref(),
            place: draft.place.as_ref().map(|p| p.name()),
            age: draft.age,
            status: draft.status.as_deref(),
            interests: &draft.interests,
            bio: draft.bio.as_deref(),
        },
        language_code,
    );

    format!(
        "{}\n\n{}\n\n{}",
        t_lang("summary-title", language_code),
        card,
        t_lang("ask-confirm", language_code)
    )
}
