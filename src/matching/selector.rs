//! Candidate selection: exclusion set, criterion filters and truncation.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use sqlx::postgres::PgPool;
use std::collections::HashSet;
use tracing::{debug, info};

use super::Criterion;
use crate::db::{fetch_candidate_pool, list_judged_ids};
use crate::profile::{Place, UserProfile};

/// Maximum number of candidates returned per selection
pub const MAX_CANDIDATES: usize = 3;

/// Ids that must never be offered to the requester: the requester itself and
/// everyone it has already judged.
pub fn exclusion_set(requester_id: i64, judged: impl IntoIterator<Item = i64>) -> HashSet<i64> {
    let mut excluded: HashSet<i64> = judged.into_iter().collect();
    excluded.insert(requester_id);
    excluded
}

/// Criterion filter bound to one requester
#[derive(Debug)]
pub struct CandidateFilter<'a> {
    requester: &'a UserProfile,
    criterion: Criterion,
    excluded: HashSet<i64>,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(requester: &'a UserProfile, criterion: Criterion, excluded: HashSet<i64>) -> Self {
        let mut excluded = excluded;
        excluded.insert(requester.telegram_id);
        Self {
            requester,
            criterion,
            excluded,
        }
    }

    /// Whether the requester has every attribute the criterion compares.
    /// A requester that is not ready gets no candidates at all.
    pub fn requester_ready(&self) -> bool {
        let location_ready = self.requester.region().is_some() && self.requester.place().is_some();
        let interests_ready = self.requester.has_interests();

        match self.criterion {
            Criterion::Location => location_ready,
            Criterion::Status => self.requester.status().is_some(),
            Criterion::Interests => interests_ready,
            Criterion::LocationInterests => location_ready && interests_ready,
        }
    }

    pub fn accepts(&self, candidate: &UserProfile) -> bool {
        if self.excluded.contains(&candidate.telegram_id) || !self.requester_ready() {
            return false;
        }

        match self.criterion {
            Criterion::Location => self.same_location(candidate),
            Criterion::Status => self.requester.status() == candidate.status(),
            Criterion::Interests => self.shared_interest(candidate),
            Criterion::LocationInterests => {
                self.same_location(candidate) && self.shared_interest(candidate)
            }
        }
    }

    fn same_location(&self, candidate: &UserProfile) -> bool {
        if self.requester.region() != candidate.region() {
            return false;
        }

        match self.requester.place() {
            Some(Place::City(city)) => candidate.city.as_deref().map(str::trim) == Some(city.as_str()),
            Some(Place::Village(village)) => {
                candidate.village.as_deref().map(str::trim) == Some(village.as_str())
            }
            None => false,
        }
    }

    fn shared_interest(&self, candidate: &UserProfile) -> bool {
        candidate.has_interests() && self.requester.shares_interest_with(candidate)
    }
}

/// Pick the first [`MAX_CANDIDATES`] accepted profiles of `pool`, in pool order
pub fn select_candidates(
    requester: &UserProfile,
    criterion: Criterion,
    pool: impl IntoIterator<Item = UserProfile>,
    excluded: HashSet<i64>,
) -> Vec<UserProfile> {
    let filter = CandidateFilter::new(requester, criterion, excluded);
    if !filter.requester_ready() {
        return Vec::new();
    }

    pool.into_iter()
        .filter(|candidate| filter.accepts(candidate))
        .take(MAX_CANDIDATES)
        .collect()
}

/// Select candidates for `requester` from the users table
pub async fn find_candidates(
    pool: &PgPool,
    requester: &UserProfile,
    criterion: Criterion,
) -> Result<Vec<UserProfile>> {
    let judged = list_judged_ids(pool, requester.telegram_id).await?;
    let filter = CandidateFilter::new(
        requester,
        criterion,
        exclusion_set(requester.telegram_id, judged),
    );

    if !filter.requester_ready() {
        info!(
            user_id = requester.telegram_id,
            criterion = criterion.as_str(),
            "Requester profile lacks attributes for criterion"
        );
        return Ok(Vec::new());
    }

    let mut candidates = Vec::with_capacity(MAX_CANDIDATES);
    let mut rows = fetch_candidate_pool(pool, requester.telegram_id);
    while let Some(candidate) = rows.try_next().await.context("Failed to read candidate pool")? {
        if filter.accepts(&candidate) {
            candidates.push(candidate);
            if candidates.len() == MAX_CANDIDATES {
                break;
            }
        }
    }

    debug!(
        user_id = requester.telegram_id,
        criterion = criterion.as_str(),
        found = candidates.len(),
        "Candidate selection completed"
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64, region: &str, place: Option<Place>, status: &str, interests: &[&str]) -> UserProfile {
        let mut profile = UserProfile::new(id);
        profile.region = Some(region.to_string());
        if let Some(place) = place {
            let (city, village) = place.into_columns();
            profile.city = city;
            profile.village = village;
        }
        profile.status = Some(status.to_string());
        profile.interests = interests.iter().map(|s| s.to_string()).collect();
        profile
    }

    fn city(name: &str) -> Option<Place> {
        Some(Place::City(name.to_string()))
    }

    fn village(name: &str) -> Option<Place> {
        Some(Place::Village(name.to_string()))
    }

    fn ids(profiles: &[UserProfile]) -> Vec<i64> {
        profiles.iter().map(|p| p.telegram_id).collect()
    }

    #[test]
    fn test_exclusion_set_contains_requester_and_judged() {
        let excluded = exclusion_set(1, vec![2, 3, 3]);
        assert_eq!(excluded, HashSet::from([1, 2, 3]));

        let only_self = exclusion_set(9, Vec::new());
        assert_eq!(only_self, HashSet::from([9]));
    }

    #[test]
    fn test_location_returns_first_three_in_pool_order() {
        let requester = profile(1, "Lviv", city("Lviv"), "Мама", &[]);
        let pool = vec![
            profile(10, "Lviv", city("Lviv"), "Мама", &[]),
            profile(11, "Kyiv", city("Kyiv"), "Мама", &[]),
            profile(12, "Lviv", city("Lviv"), "Вагітна", &[]),
            profile(13, "Lviv", city("Drohobych"), "Мама", &[]),
            profile(14, "Lviv", city("Lviv"), "Мама", &[]),
            profile(15, "Lviv", city("Lviv"), "Мама", &[]),
        ];

        let result = select_candidates(&requester, Criterion::Location, pool, HashSet::new());
        assert_eq!(ids(&result), vec![10, 12, 14]);
    }

    #[test]
    fn test_location_village_does_not_match_city_of_same_name() {
        let requester = profile(1, "Lviv", village("Sokilnyky"), "Мама", &[]);
        let pool = vec![
            profile(10, "Lviv", city("Sokilnyky"), "Мама", &[]),
            profile(11, "Lviv", village("Sokilnyky"), "Мама", &[]),
        ];

        let result = select_candidates(&requester, Criterion::Location, pool, HashSet::new());
        assert_eq!(ids(&result), vec![11]);
    }

    #[test]
    fn test_location_requires_region_and_place() {
        let mut requester = profile(1, "Lviv", None, "Мама", &[]);
        let pool = vec![profile(10, "Lviv", city("Lviv"), "Мама", &[])];
        assert!(select_candidates(&requester, Criterion::Location, pool.clone(), HashSet::new()).is_empty());

        requester.city = Some("Lviv".to_string());
        requester.region = None;
        assert!(select_candidates(&requester, Criterion::Location, pool, HashSet::new()).is_empty());
    }

    #[test]
    fn test_status_exact_match() {
        let requester = profile(1, "Lviv", city("Lviv"), "Вагітна", &[]);
        let pool = vec![
            profile(10, "Kyiv", None, "Мама", &[]),
            profile(11, "Odesa", None, "Вагітна", &[]),
        ];

        let result = select_candidates(&requester, Criterion::Status, pool.clone(), HashSet::new());
        assert_eq!(ids(&result), vec![11]);

        let mut no_status = requester.clone();
        no_status.status = None;
        assert!(select_candidates(&no_status, Criterion::Status, pool, HashSet::new()).is_empty());
    }

    #[test]
    fn test_interests_intersection() {
        let requester = profile(1, "Lviv", city("Lviv"), "Мама", &["Книги", "Подорожі"]);
        let pool = vec![
            profile(10, "Kyiv", None, "Мама", &[]),
            profile(11, "Kyiv", None, "Мама", &["Кулінарія"]),
            profile(12, "Kyiv", None, "Мама", &["Кулінарія", "Подорожі"]),
        ];

        let result = select_candidates(&requester, Criterion::Interests, pool.clone(), HashSet::new());
        assert_eq!(ids(&result), vec![12]);
        for candidate in &result {
            assert!(candidate.shares_interest_with(&requester));
        }

        let no_interests = profile(2, "Lviv", city("Lviv"), "Мама", &[]);
        assert!(select_candidates(&no_interests, Criterion::Interests, pool, HashSet::new()).is_empty());
    }

    #[test]
    fn test_location_interests_conjunction() {
        let requester = profile(1, "Lviv", city("Lviv"), "Мама", &["Книги"]);
        let pool = vec![
            profile(10, "Lviv", city("Lviv"), "Мама", &["Кулінарія"]),
            profile(11, "Kyiv", city("Kyiv"), "Мама", &["Книги"]),
            profile(12, "Lviv", city("Lviv"), "Мама", &["Книги", "Спорт і фітнес"]),
        ];

        let result = select_candidates(&requester, Criterion::LocationInterests, pool, HashSet::new());
        assert_eq!(ids(&result), vec![12]);
    }

    #[test]
    fn test_excluded_and_self_never_returned() {
        let requester = profile(1, "Lviv", city("Lviv"), "Мама", &[]);
        let pool = vec![
            requester.clone(),
            profile(10, "Lviv", city("Lviv"), "Мама", &[]),
            profile(11, "Lviv", city("Lviv"), "Мама", &[]),
        ];

        let result = select_candidates(&requester, Criterion::Status, pool, exclusion_set(1, vec![10]));
        assert_eq!(ids(&result), vec![11]);
    }
}
