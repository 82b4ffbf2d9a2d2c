//! Profile domain types shared by the conversation flows, the matching engine
//! and the database layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Regions offered by the paginated region picker. Stored verbatim.
pub const VALID_REGIONS: &[&str] = &[
    "Вінницька",
    "Волинська",
    "Дніпропетровська",
    "Донецька",
    "Житомирська",
    "Закарпатська",
    "Запорізька",
    "Івано-Франківська",
    "Київська",
    "Кіровоградська",
    "Луганська",
    "Львівська",
    "Миколаївська",
    "Одеська",
    "Полтавська",
    "Рівненська",
    "Сумська",
    "Тернопільська",
    "Харківська",
    "Херсонська",
    "Хмельницька",
    "Черкаська",
    "Чернівецька",
    "Чернігівська",
    "м. Київ",
];

/// Number of regions shown per page of the region picker
pub const REGIONS_PAGE_SIZE: usize = 8;

pub const STATUS_OPTIONS: &[&str] = &["Мама", "Вагітна"];

pub const INTEREST_OPTIONS: &[&str] = &[
    "Прогулянки з дітьми",
    "Спорт і фітнес",
    "Кулінарія",
    "Рукоділля",
    "Книги",
    "Подорожі",
    "Розвиток дітей",
    "Здоров'я та харчування",
    "Кава та спілкування",
    "Робота та бізнес",
];

/// Settlement a user lives in. A profile has a city or a village, never both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Place {
    City(String),
    Village(String),
}

impl Place {
    pub fn name(&self) -> &str {
        match self {
            Place::City(name) | Place::Village(name) => name,
        }
    }

    /// Split into the `(city, village)` column pair
    pub fn into_columns(self) -> (Option<String>, Option<String>) {
        match self {
            Place::City(city) => (Some(city), None),
            Place::Village(village) => (None, Some(village)),
        }
    }
}

/// A stored user profile (one row of the `users` table)
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub village: Option<String>,
    pub age: Option<i32>,
    pub status: Option<String>,
    pub interests: Vec<String>,
    pub bio: Option<String>,
    pub language_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build an in-memory profile with only the identity populated.
    pub fn new(telegram_id: i64) -> Self {
        let now = Utc::now();
        Self {
            telegram_id,
            name: None,
            username: None,
            nickname: None,
            region: None,
            city: None,
            village: None,
            age: None,
            status: None,
            interests: Vec::new(),
            bio: None,
            language_code: crate::localization::DEFAULT_LANGUAGE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// City takes precedence over village when both columns are somehow set.
    pub fn place(&self) -> Option<Place> {
        match (non_blank(&self.city), non_blank(&self.village)) {
            (Some(city), _) => Some(Place::City(city.to_string())),
            (None, Some(village)) => Some(Place::Village(village.to_string())),
            (None, None) => None,
        }
    }

    pub fn region(&self) -> Option<&str> {
        non_blank(&self.region)
    }

    pub fn status(&self) -> Option<&str> {
        non_blank(&self.status)
    }

    pub fn has_interests(&self) -> bool {
        !self.interests.is_empty()
    }

    pub fn shares_interest_with(&self, other: &UserProfile) -> bool {
        self.interests
            .iter()
            .any(|interest| other.interests.contains(interest))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Answers collected by the creation wizard before the profile is committed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub region: Option<String>,
    pub place: Option<Place>,
    pub age: Option<i32>,
    pub status: Option<String>,
    pub interests: Vec<String>,
    pub bio: Option<String>,
}

/// A complete profile ready to be upserted
#[derive(Clone, Debug, PartialEq)]
pub struct NewProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub language_code: String,
    pub name: String,
    pub nickname: String,
    pub region: String,
    pub place: Place,
    pub age: i32,
    pub status: String,
    pub interests: Vec<String>,
    pub bio: String,
}

impl ProfileDraft {
    /// Turn the draft into a committable profile; fails with a template key
    /// when any answer is still missing.
    pub fn complete(
        self,
        telegram_id: i64,
        username: Option<String>,
        language_code: &str,
    ) -> Result<NewProfile, &'static str> {
        match self {
            ProfileDraft {
                name: Some(name),
                nickname: Some(nickname),
                region: Some(region),
                place: Some(place),
                age: Some(age),
                status: Some(status),
                interests,
                bio: Some(bio),
            } if !interests.is_empty() => Ok(NewProfile {
                telegram_id,
                username,
                language_code: language_code.to_string(),
                name,
                nickname,
                region,
                place,
                age,
                status,
                interests,
                bio,
            }),
            _ => Err("error-draft-incomplete"),
        }
    }
}

/// A single-field change produced by the edit flow
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileUpdate {
    Name(String),
    Nickname(String),
    Location { region: String, place: Place },
    Age(i32),
    Status(String),
    Interests(Vec<String>),
    Bio(String),
}

/// Regions shown on the given picker page; out of range pages are clamped.
pub fn regions_page(page: usize) -> &'static [&'static str] {
    let page = page.min(last_regions_page());
    let start = page * REGIONS_PAGE_SIZE;
    let end = (start + REGIONS_PAGE_SIZE).min(VALID_REGIONS.len());
    &VALID_REGIONS[start..end]
}

pub fn last_regions_page() -> usize {
    VALID_REGIONS.len().div_ceil(REGIONS_PAGE_SIZE).saturating_sub(1)
}

pub fn status_emoji(status: Option<&str>) -> &'static str {
    let Some(status) = status else {
        return "👶";
    };
    let status = status.to_lowercase();
    if status.contains("мама") {
        "👩‍👧‍👦"
    } else if status.contains("вагіт") {
        "🤰"
    } else {
        "👶"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_prefers_city() {
        let mut profile = UserProfile::new(1);
        profile.city = Some("Львів".to_string());
        profile.village = Some("Зимна Вода".to_string());
        assert_eq!(profile.place(), Some(Place::City("Львів".to_string())));

        profile.city = Some("  ".to_string());
        assert_eq!(
            profile.place(),
            Some(Place::Village("Зимна Вода".to_string()))
        );
    }

    #[test]
    fn test_regions_pagination() {
        assert_eq!(regions_page(0).len(), REGIONS_PAGE_SIZE);
        assert_eq!(regions_page(0)[0], "Вінницька");
        assert_eq!(last_regions_page(), 3);
        assert_eq!(regions_page(3), &["м. Київ"]);
        // Clamped
        assert_eq!(regions_page(42), regions_page(3));
    }

    #[test]
    fn test_draft_completion() {
        let draft = ProfileDraft {
            name: Some("Олена".to_string()),
            nickname: Some("olena".to_string()),
            region: Some("Львівська".to_string()),
            place: Some(Place::City("Львів".to_string())),
            age: Some(31),
            status: Some("Мама".to_string()),
            interests: vec!["Книги".to_string()],
            bio: Some("Привіт".to_string()),
        };
        let profile = draft.clone().complete(7, None, "uk").unwrap();
        assert_eq!(profile.telegram_id, 7);
        assert_eq!(profile.place, Place::City("Львів".to_string()));

        let missing_interests = ProfileDraft {
            interests: Vec::new(),
            ..draft
        };
        assert_eq!(
            missing_interests.complete(7, None, "uk"),
            Err("error-draft-incomplete")
        );
    }

    #[test]
    fn test_status_emoji() {
        assert_eq!(status_emoji(Some("Мама")), "👩‍👧‍👦");
        assert_eq!(status_emoji(Some("Вагітна")), "🤰");
        assert_eq!(status_emoji(None), "👶");
    }
}
