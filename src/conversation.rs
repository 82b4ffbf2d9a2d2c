//! Profile creation and edit flows as a pure state machine, plus the steps of
//! the matching loop.
//!
//! [`advance`] maps the current dialogue state and one user event to the next
//! state, the replies to send and an optional database write. The bot layer
//! renders the replies and applies the commit; nothing here touches Telegram
//! or the database. [`start_matching`] and [`after_judgment`] decide where the
//! like/dislike loop goes once the candidates are known.

use crate::dialogue::{
    parse_location_type, parse_region_input, validate_age, validate_bio, validate_name, validate_nickname,
    validate_place_name, validate_status, BotDialogueState, CreationStep, EditMenuItem, EditStep, LocationKind,
    RegionInput,
};
use crate::matching::Criterion;
use crate::profile::{last_regions_page, NewProfile, Place, ProfileDraft, ProfileUpdate, INTEREST_OPTIONS};

/// User input relevant to the profile flows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Text(String),
    /// Index into [`INTEREST_OPTIONS`]
    ToggleInterest(usize),
    InterestsDone,
    ConfirmYes,
    ConfirmNo,
}

/// Facts about the sender the state machine needs but does not own
#[derive(Clone, Debug)]
pub struct Ctx<'a> {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub language_code: &'a str,
    /// Interests of the stored profile, the starting selection of an edit
    pub stored_interests: &'a [String],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    Remove,
    Regions { page: usize },
    LocationType,
    Statuses,
    Interests { selected: Vec<String> },
    EditMenu,
    Criteria,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Plain localized message, keyboard left as is
    Say(&'static str),
    Ask {
        key: &'static str,
        keyboard: Keyboard,
    },
    /// Redraw the interest toggles of the message that was tapped
    RefreshInterests { selected: Vec<String> },
    /// Draft summary with the confirmation buttons
    Summary(ProfileDraft),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Commit {
    CreateProfile(NewProfile),
    Update(ProfileUpdate),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub next: BotDialogueState,
    pub replies: Vec<Reply>,
    pub commit: Option<Commit>,
}

impl Transition {
    fn to(next: BotDialogueState, replies: Vec<Reply>) -> Self {
        Self {
            next,
            replies,
            commit: None,
        }
    }

    fn committing(next: BotDialogueState, replies: Vec<Reply>, commit: Commit) -> Self {
        Self {
            next,
            replies,
            commit: Some(commit),
        }
    }

    pub fn is_unchanged(&self, state: &BotDialogueState) -> bool {
        self.next == *state && self.commit.is_none()
    }
}

fn ask(key: &'static str, keyboard: Keyboard) -> Reply {
    Reply::Ask { key, keyboard }
}

fn creating(step: CreationStep, draft: ProfileDraft) -> BotDialogueState {
    BotDialogueState::CreatingProfile { step, draft }
}

fn editing(step: EditStep) -> BotDialogueState {
    BotDialogueState::EditingProfile { step }
}

/// Toggle `INTEREST_OPTIONS[index]` in `selected`, keeping option order.
/// Returns `None` for an index outside the option list.
pub fn toggle_interest(selected: &[String], index: usize) -> Option<Vec<String>> {
    let option = INTEREST_OPTIONS.get(index)?;
    let now_selected = !selected.iter().any(|s| s == option);

    Some(
        INTEREST_OPTIONS
            .iter()
            .filter(|candidate| {
                if *candidate == option {
                    now_selected
                } else {
                    selected.iter().any(|s| s == *candidate)
                }
            })
            .map(|s| s.to_string())
            .collect(),
    )
}

/// Compute the next step of the conversation
pub fn advance(state: &BotDialogueState, event: Event, ctx: &Ctx<'_>) -> Transition {
    match state {
        BotDialogueState::Start => match event {
            Event::Text(_) => Transition::to(state.clone(), vec![Reply::Say("idle-hint")]),
            _ => Transition::to(state.clone(), Vec::new()),
        },
        BotDialogueState::CreatingProfile { step, draft } => advance_creation(step, draft, event, ctx),
        BotDialogueState::EditMenu => advance_edit_menu(event, ctx),
        BotDialogueState::EditingProfile { step } => advance_edit(step, event),
        BotDialogueState::ChoosingCriterion | BotDialogueState::Judging { .. } => match event {
            Event::Text(_) => Transition::to(state.clone(), vec![Reply::Say("use-buttons")]),
            _ => Transition::to(state.clone(), Vec::new()),
        },
    }
}

fn advance_creation(step: &CreationStep, draft: &ProfileDraft, event: Event, ctx: &Ctx<'_>) -> Transition {
    let stay = |replies: Vec<Reply>| Transition::to(creating(step.clone(), draft.clone()), replies);
    let mut draft = draft.clone();

    match (step, event) {
        (CreationStep::Name, Event::Text(text)) => match validate_name(&text) {
            Ok(name) => {
                draft.name = Some(name);
                Transition::to(
                    creating(CreationStep::Nickname, draft),
                    vec![ask("ask-nickname", Keyboard::Remove)],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Nickname, Event::Text(text)) => match validate_nickname(&text) {
            Ok(nickname) => {
                draft.nickname = Some(nickname);
                Transition::to(
                    creating(CreationStep::Region { page: 0 }, draft),
                    vec![ask("ask-region", Keyboard::Regions { page: 0 })],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Region { page }, Event::Text(text)) => match parse_region_input(&text) {
            Ok(RegionInput::Previous) => {
                let page = page.saturating_sub(1);
                Transition::to(
                    creating(CreationStep::Region { page }, draft),
                    vec![ask("ask-region", Keyboard::Regions { page })],
                )
            }
            Ok(RegionInput::Next) => {
                let page = (page + 1).min(last_regions_page());
                Transition::to(
                    creating(CreationStep::Region { page }, draft),
                    vec![ask("ask-region", Keyboard::Regions { page })],
                )
            }
            Ok(RegionInput::Cancel) => Transition::to(
                BotDialogueState::Start,
                vec![ask("creation-cancelled", Keyboard::Remove)],
            ),
            Ok(RegionInput::Region(region)) => {
                draft.region = Some(region);
                Transition::to(
                    creating(CreationStep::LocationType, draft),
                    vec![ask("ask-location-type", Keyboard::LocationType)],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::LocationType, Event::Text(text)) => match parse_location_type(&text) {
            Ok(LocationKind::City) => Transition::to(
                creating(CreationStep::City, draft),
                vec![ask("ask-city", Keyboard::Remove)],
            ),
            Ok(LocationKind::Village) => Transition::to(
                creating(CreationStep::Village, draft),
                vec![ask("ask-village", Keyboard::Remove)],
            ),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::City | CreationStep::Village, Event::Text(text)) => match validate_place_name(&text) {
            Ok(name) => {
                draft.place = Some(match step {
                    CreationStep::City => Place::City(name),
                    _ => Place::Village(name),
                });
                Transition::to(
                    creating(CreationStep::Age, draft),
                    vec![ask("ask-age", Keyboard::Remove)],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Age, Event::Text(text)) => match validate_age(&text) {
            Ok(age) => {
                draft.age = Some(age);
                Transition::to(
                    creating(CreationStep::Status, draft),
                    vec![ask("ask-status", Keyboard::Statuses)],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Status, Event::Text(text)) => match validate_status(&text) {
            Ok(status) => {
                draft.status = Some(status);
                let selected = draft.interests.clone();
                Transition::to(
                    creating(CreationStep::Interests, draft),
                    vec![
                        ask("status-saved", Keyboard::Remove),
                        ask("ask-interests", Keyboard::Interests { selected }),
                    ],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Interests, Event::ToggleInterest(index)) => match toggle_interest(&draft.interests, index) {
            Some(selected) => {
                draft.interests = selected.clone();
                Transition::to(
                    creating(CreationStep::Interests, draft),
                    vec![Reply::RefreshInterests { selected }],
                )
            }
            None => stay(Vec::new()),
        },
        (CreationStep::Interests, Event::InterestsDone) => {
            if draft.interests.is_empty() {
                stay(vec![Reply::Say("error-interests-empty")])
            } else {
                Transition::to(
                    creating(CreationStep::Bio, draft),
                    vec![ask("ask-bio", Keyboard::Remove)],
                )
            }
        }
        (CreationStep::Bio, Event::Text(text)) => match validate_bio(&text) {
            Ok(bio) => {
                draft.bio = Some(bio);
                Transition::to(
                    creating(CreationStep::Confirm, draft.clone()),
                    vec![Reply::Summary(draft)],
                )
            }
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (CreationStep::Confirm, Event::ConfirmYes) => {
            match draft.complete(ctx.telegram_id, ctx.username.clone(), ctx.language_code) {
                Ok(profile) => Transition::committing(
                    BotDialogueState::Start,
                    vec![ask("profile-saved", Keyboard::Remove)],
                    Commit::CreateProfile(profile),
                ),
                Err(key) => Transition::to(
                    BotDialogueState::new_profile(),
                    vec![Reply::Say(key), ask("ask-name", Keyboard::Remove)],
                ),
            }
        }
        (CreationStep::Confirm, Event::ConfirmNo) => Transition::to(
            BotDialogueState::new_profile(),
            vec![ask("ask-name-again", Keyboard::Remove)],
        ),
        (CreationStep::Interests | CreationStep::Confirm, Event::Text(_)) => {
            stay(vec![Reply::Say("use-buttons")])
        }
        // Buttons from an earlier message
        _ => stay(Vec::new()),
    }
}

fn advance_edit_menu(event: Event, ctx: &Ctx<'_>) -> Transition {
    let Event::Text(text) = event else {
        return Transition::to(BotDialogueState::EditMenu, Vec::new());
    };

    // Any command leaves the menu
    if text.trim_start().starts_with('/') {
        return Transition::to(
            BotDialogueState::Start,
            vec![ask("edit-menu-closed", Keyboard::Remove)],
        );
    }

    let Some(item) = EditMenuItem::from_label(&text) else {
        return Transition::to(
            BotDialogueState::EditMenu,
            vec![ask("edit-menu", Keyboard::EditMenu)],
        );
    };

    match item {
        EditMenuItem::Name => Transition::to(editing(EditStep::Name), vec![ask("ask-name", Keyboard::Remove)]),
        EditMenuItem::Nickname => Transition::to(
            editing(EditStep::Nickname),
            vec![ask("ask-nickname", Keyboard::Remove)],
        ),
        EditMenuItem::Location => Transition::to(
            editing(EditStep::Region { page: 0 }),
            vec![ask("ask-region", Keyboard::Regions { page: 0 })],
        ),
        EditMenuItem::Age => Transition::to(editing(EditStep::Age), vec![ask("ask-age", Keyboard::Remove)]),
        EditMenuItem::Status => Transition::to(
            editing(EditStep::Status),
            vec![ask("ask-status", Keyboard::Statuses)],
        ),
        EditMenuItem::Interests => {
            let selected = ctx.stored_interests.to_vec();
            Transition::to(
                editing(EditStep::Interests {
                    selected: selected.clone(),
                }),
                vec![
                    ask("edit-interests-hint", Keyboard::Remove),
                    ask("ask-interests", Keyboard::Interests { selected }),
                ],
            )
        }
        EditMenuItem::Bio => Transition::to(editing(EditStep::Bio), vec![ask("ask-bio", Keyboard::Remove)]),
        EditMenuItem::StartMatching => Transition::to(
            BotDialogueState::ChoosingCriterion,
            vec![
                ask("edit-menu-closed", Keyboard::Remove),
                ask("choose-criterion", Keyboard::Criteria),
            ],
        ),
    }
}

fn updated(update: ProfileUpdate) -> Transition {
    Transition::committing(
        BotDialogueState::EditMenu,
        vec![ask("profile-updated", Keyboard::EditMenu)],
        Commit::Update(update),
    )
}

fn advance_edit(step: &EditStep, event: Event) -> Transition {
    let stay = |replies: Vec<Reply>| Transition::to(editing(step.clone()), replies);

    match (step, event) {
        (EditStep::Name, Event::Text(text)) => match validate_name(&text) {
            Ok(name) => updated(ProfileUpdate::Name(name)),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Nickname, Event::Text(text)) => match validate_nickname(&text) {
            Ok(nickname) => updated(ProfileUpdate::Nickname(nickname)),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Age, Event::Text(text)) => match validate_age(&text) {
            Ok(age) => updated(ProfileUpdate::Age(age)),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Status, Event::Text(text)) => match validate_status(&text) {
            Ok(status) => updated(ProfileUpdate::Status(status)),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Bio, Event::Text(text)) => match validate_bio(&text) {
            Ok(bio) => updated(ProfileUpdate::Bio(bio)),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Region { page }, Event::Text(text)) => match parse_region_input(&text) {
            Ok(RegionInput::Previous) => {
                let page = page.saturating_sub(1);
                Transition::to(
                    editing(EditStep::Region { page }),
                    vec![ask("ask-region", Keyboard::Regions { page })],
                )
            }
            Ok(RegionInput::Next) => {
                let page = (page + 1).min(last_regions_page());
                Transition::to(
                    editing(EditStep::Region { page }),
                    vec![ask("ask-region", Keyboard::Regions { page })],
                )
            }
            Ok(RegionInput::Cancel) => Transition::to(
                BotDialogueState::EditMenu,
                vec![ask("edit-menu", Keyboard::EditMenu)],
            ),
            Ok(RegionInput::Region(region)) => Transition::to(
                editing(EditStep::LocationType { region }),
                vec![ask("ask-location-type", Keyboard::LocationType)],
            ),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::LocationType { region }, Event::Text(text)) => match parse_location_type(&text) {
            Ok(LocationKind::City) => Transition::to(
                editing(EditStep::City {
                    region: region.clone(),
                }),
                vec![ask("ask-city", Keyboard::Remove)],
            ),
            Ok(LocationKind::Village) => Transition::to(
                editing(EditStep::Village {
                    region: region.clone(),
                }),
                vec![ask("ask-village", Keyboard::Remove)],
            ),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::City { region }, Event::Text(text)) => match validate_place_name(&text) {
            Ok(city) => updated(ProfileUpdate::Location {
                region: region.clone(),
                place: Place::City(city),
            }),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Village { region }, Event::Text(text)) => match validate_place_name(&text) {
            Ok(village) => updated(ProfileUpdate::Location {
                region: region.clone(),
                place: Place::Village(village),
            }),
            Err(key) => stay(vec![Reply::Say(key)]),
        },
        (EditStep::Interests { selected }, Event::ToggleInterest(index)) => match toggle_interest(selected, index) {
            Some(selected) => Transition::to(
                editing(EditStep::Interests {
                    selected: selected.clone(),
                }),
                vec![Reply::RefreshInterests { selected }],
            ),
            None => stay(Vec::new()),
        },
        (EditStep::Interests { selected }, Event::InterestsDone) => {
            if selected.is_empty() {
                stay(vec![Reply::Say("error-interests-empty")])
            } else {
                updated(ProfileUpdate::Interests(selected.clone()))
            }
        }
        (EditStep::Interests { .. }, Event::Text(_)) => stay(vec![Reply::Say("use-buttons")]),
        _ => stay(Vec::new()),
    }
}

/// Where a like/dislike tap stands relative to the stored session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JudgmentContext {
    /// The tapped candidate is the one on screen
    OnScreen(Criterion),
    /// Another candidate is on screen; the tap came from an older card
    Stale,
    /// No judging session (restart, expiry or another flow). The judgment is
    /// still recorded but the loop cannot continue.
    NoSession,
}

pub fn judgment_context(state: Option<&BotDialogueState>, candidate_id: i64) -> JudgmentContext {
    match state {
        Some(BotDialogueState::Judging {
            candidate_id: current,
            criterion,
        }) if *current == candidate_id => JudgmentContext::OnScreen(*criterion),
        Some(BotDialogueState::Judging { .. }) => JudgmentContext::Stale,
        _ => JudgmentContext::NoSession,
    }
}

/// Next step of the matching loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchStep {
    /// Show the candidate and wait for a judgment
    Show { candidate_id: i64, criterion: Criterion },
    /// Leave the loop with this message
    Finish(&'static str),
}

impl MatchStep {
    pub fn next_state(&self) -> BotDialogueState {
        match self {
            MatchStep::Show {
                candidate_id,
                criterion,
            } => BotDialogueState::Judging {
                candidate_id: *candidate_id,
                criterion: *criterion,
            },
            MatchStep::Finish(_) => BotDialogueState::Start,
        }
    }
}

/// First step after a criterion was picked
pub fn start_matching(criterion: Criterion, first_candidate: Option<i64>) -> MatchStep {
    match first_candidate {
        Some(candidate_id) => MatchStep::Show {
            candidate_id,
            criterion,
        },
        None => MatchStep::Finish("no-candidates"),
    }
}

/// Step after a judgment was recorded. `criterion` is the one stored in the
/// session, if any.
pub fn after_judgment(criterion: Option<Criterion>, next_candidate: Option<i64>) -> MatchStep {
    match (criterion, next_candidate) {
        (Some(criterion), Some(candidate_id)) => MatchStep::Show {
            candidate_id,
            criterion,
        },
        (Some(_), None) => MatchStep::Finish("no-more-candidates"),
        (None, _) => MatchStep::Finish("matching-ended"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Ctx<'static> {
        Ctx {
            telegram_id: 42,
            username: Some("olena".to_string()),
            language_code: "uk",
            stored_interests: &[],
        }
    }

    fn text(value: &str) -> Event {
        Event::Text(value.to_string())
    }

    /// Feed events in order, returning the final transition
    fn run(start: BotDialogueState, events: Vec<Event>) -> Transition {
        let ctx = ctx();
        let mut state = start;
        let mut last = Transition::to(state.clone(), Vec::new());
        for event in events {
            last = advance(&state, event, &ctx);
            state = last.next.clone();
        }
        last
    }

    #[test]
    fn test_full_creation_flow_commits_profile() {
        let transition = run(
            BotDialogueState::new_profile(),
            vec![
                text("Олена"),
                text("olenka"),
                text("Вперед ➡️"),
                text("Львівська"),
                text("🏙 Місто"),
                text("Львів"),
                text("31"),
                text("Мама"),
                Event::ToggleInterest(4),
                Event::ToggleInterest(0),
                Event::InterestsDone,
                text("Люблю гуляти"),
                Event::ConfirmYes,
            ],
        );

        assert_eq!(transition.next, BotDialogueState::Start);
        let Some(Commit::CreateProfile(profile)) = transition.commit else {
            panic!("Expected a profile commit");
        };
        assert_eq!(profile.telegram_id, 42);
        assert_eq!(profile.username.as_deref(), Some("olena"));
        assert_eq!(profile.region, "Львівська");
        assert_eq!(profile.place, Place::City("Львів".to_string()));
        assert_eq!(profile.age, 31);
        // Option order, not tap order
        assert_eq!(profile.interests, vec!["Прогулянки з дітьми", "Книги"]);
    }

    #[test]
    fn test_invalid_input_keeps_state_and_reprompts() {
        let state = creating(CreationStep::Age, ProfileDraft::default());
        let transition = advance(&state, text("12"), &ctx());

        assert!(transition.is_unchanged(&state));
        assert_eq!(transition.replies, vec![Reply::Say("error-age-out-of-range")]);
    }

    #[test]
    fn test_region_pagination_is_clamped() {
        let state = creating(CreationStep::Region { page: 0 }, ProfileDraft::default());
        let back = advance(&state, text("⬅️ Назад"), &ctx());
        assert_eq!(back.next, state);

        let last = last_regions_page();
        let state = creating(CreationStep::Region { page: last }, ProfileDraft::default());
        let forward = advance(&state, text("Вперед ➡️"), &ctx());
        assert_eq!(forward.next, state);
        assert_eq!(
            forward.replies,
            vec![ask("ask-region", Keyboard::Regions { page: last })]
        );
    }

    #[test]
    fn test_region_cancel_clears_state() {
        let state = creating(CreationStep::Region { page: 2 }, ProfileDraft::default());
        let transition = advance(&state, text("❌ Скасувати"), &ctx());
        assert_eq!(transition.next, BotDialogueState::Start);
        assert!(transition.commit.is_none());
    }

    #[test]
    fn test_interests_required_before_bio() {
        let state = creating(CreationStep::Interests, ProfileDraft::default());
        let transition = advance(&state, Event::InterestsDone, &ctx());
        assert!(transition.is_unchanged(&state));
        assert_eq!(transition.replies, vec![Reply::Say("error-interests-empty")]);

        // Toggling twice deselects
        let once = advance(&state, Event::ToggleInterest(1), &ctx());
        let twice = advance(&once.next, Event::ToggleInterest(1), &ctx());
        assert_eq!(twice.replies, vec![Reply::RefreshInterests { selected: vec![] }]);

        // Out of range taps are ignored
        let stale = advance(&state, Event::ToggleInterest(99), &ctx());
        assert!(stale.is_unchanged(&state));
        assert!(stale.replies.is_empty());
    }

    #[test]
    fn test_confirm_no_restarts_wizard() {
        let draft = ProfileDraft {
            name: Some("Олена".to_string()),
            ..Default::default()
        };
        let state = creating(CreationStep::Confirm, draft);
        let transition = advance(&state, Event::ConfirmNo, &ctx());
        assert_eq!(transition.next, BotDialogueState::new_profile());
        assert!(transition.commit.is_none());
    }

    #[test]
    fn test_edit_name_commits_and_returns_to_menu() {
        let transition = run(BotDialogueState::EditMenu, vec![text("👤 Ім'я"), text("  Ірина ")]);
        assert_eq!(transition.next, BotDialogueState::EditMenu);
        assert_eq!(
            transition.commit,
            Some(Commit::Update(ProfileUpdate::Name("Ірина".to_string())))
        );
    }

    #[test]
    fn test_edit_location_flow() {
        let transition = run(
            BotDialogueState::EditMenu,
            vec![
                text("📍 Місце проживання"),
                text("м. Київ"),
                text("село"),
                text("Гатне"),
            ],
        );
        assert_eq!(
            transition.commit,
            Some(Commit::Update(ProfileUpdate::Location {
                region: "м. Київ".to_string(),
                place: Place::Village("Гатне".to_string()),
            }))
        );
    }

    #[test]
    fn test_edit_interests_start_from_stored_selection() {
        let stored = vec!["Кулінарія".to_string()];
        let ctx = Ctx {
            stored_interests: &stored,
            ..ctx()
        };
        let transition = advance(&BotDialogueState::EditMenu, text("💡 Інтереси"), &ctx);
        assert_eq!(
            transition.next,
            editing(EditStep::Interests {
                selected: stored.clone()
            })
        );

        let done = advance(&transition.next, Event::InterestsDone, &ctx);
        assert_eq!(done.commit, Some(Commit::Update(ProfileUpdate::Interests(stored))));
    }

    #[test]
    fn test_command_leaves_edit_menu() {
        let transition = advance(&BotDialogueState::EditMenu, text("/unknown"), &ctx());
        assert_eq!(transition.next, BotDialogueState::Start);
    }

    #[test]
    fn test_start_matching_from_edit_menu() {
        let transition = advance(&BotDialogueState::EditMenu, text("💞 Почати метчінг"), &ctx());
        assert_eq!(transition.next, BotDialogueState::ChoosingCriterion);
        assert!(transition
            .replies
            .contains(&ask("choose-criterion", Keyboard::Criteria)));
    }

    #[test]
    fn test_judgment_context() {
        let judging = BotDialogueState::Judging {
            candidate_id: 7,
            criterion: Criterion::Status,
        };

        assert_eq!(
            judgment_context(Some(&judging), 7),
            JudgmentContext::OnScreen(Criterion::Status)
        );
        assert_eq!(judgment_context(Some(&judging), 8), JudgmentContext::Stale);
        assert_eq!(judgment_context(None, 7), JudgmentContext::NoSession);
        assert_eq!(
            judgment_context(Some(&BotDialogueState::Start), 7),
            JudgmentContext::NoSession
        );
        assert_eq!(
            judgment_context(Some(&BotDialogueState::ChoosingCriterion), 7),
            JudgmentContext::NoSession
        );
    }

    #[test]
    fn test_matching_loop_steps() {
        let step = start_matching(Criterion::Location, Some(3));
        assert_eq!(
            step.next_state(),
            BotDialogueState::Judging {
                candidate_id: 3,
                criterion: Criterion::Location
            }
        );
        assert_eq!(start_matching(Criterion::Location, None), MatchStep::Finish("no-candidates"));

        let step = after_judgment(Some(Criterion::Interests), Some(9));
        assert_eq!(
            step.next_state(),
            BotDialogueState::Judging {
                candidate_id: 9,
                criterion: Criterion::Interests
            }
        );

        let step = after_judgment(Some(Criterion::Interests), None);
        assert_eq!(step, MatchStep::Finish("no-more-candidates"));
        assert_eq!(step.next_state(), BotDialogueState::Start);

        // Without a stored criterion the loop ends even if someone is left
        let step = after_judgment(None, Some(9));
        assert_eq!(step, MatchStep::Finish("matching-ended"));
        assert_eq!(step.next_state(), BotDialogueState::Start);
    }
}
