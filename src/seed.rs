//! Demo profiles for trying the matching flow against a real account.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::db::{get_user, insert_profile_if_absent};
use crate::localization::DEFAULT_LANGUAGE;
use crate::profile::{NewProfile, Place, UserProfile, INTEREST_OPTIONS, STATUS_OPTIONS, VALID_REGIONS};

/// Synthetic ids start here so they never collide with real Telegram users
pub const SEED_ID_BASE: i64 = 10_000_000;
pub const PROFILES_PER_GROUP: i64 = 5;

const LOCAL_OFFSET: i64 = 0;
const INTEREST_OFFSET: i64 = 100;
const COMBO_OFFSET: i64 = 200;

/// Shared interests first, then `extra` random others, without repeats
fn pick_interests<R: Rng + ?Sized>(base: &[String], min_common: usize, extra: usize, rng: &mut R) -> Vec<String> {
    let mut picked: Vec<String> = base.choose_multiple(rng, min_common.min(base.len())).cloned().collect();

    let others: Vec<&str> = INTEREST_OPTIONS
        .iter()
        .copied()
        .filter(|option| !picked.iter().any(|p| p == option))
        .collect();
    picked.extend(others.choose_multiple(rng, extra).map(|s| s.to_string()));
    picked
}

fn random_status<R: Rng + ?Sized>(rng: &mut R) -> String {
    STATUS_OPTIONS.choose(rng).copied().unwrap_or("Мама").to_string()
}

fn random_interests<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    INTEREST_OPTIONS
        .choose_multiple(rng, count)
        .map(|s| s.to_string())
        .collect()
}

/// Build three groups of demo profiles around `me`:
/// same place, shared interests elsewhere, and same place with shared
/// status and interests.
pub fn build_seed_profiles<R: Rng + ?Sized>(me: &UserProfile, rng: &mut R) -> Vec<NewProfile> {
    let region = me
        .region()
        .map(str::to_string)
        .or_else(|| VALID_REGIONS.choose(rng).map(|r| r.to_string()))
        .unwrap_or_default();
    let place = me.place().unwrap_or_else(|| Place::City("Київ".to_string()));
    let other_place = match &place {
        Place::City(_) => Place::Village("Інше село".to_string()),
        Place::Village(_) => Place::City("Інше місто".to_string()),
    };
    let interests = if me.has_interests() {
        me.interests.clone()
    } else {
        INTEREST_OPTIONS[..3].iter().map(|s| s.to_string()).collect()
    };
    let status = me.status().map(str::to_string).unwrap_or_else(|| random_status(rng));

    let mut profiles = Vec::with_capacity(3 * PROFILES_PER_GROUP as usize);

    for i in 0..PROFILES_PER_GROUP {
        let n = i + 1;
        profiles.push(NewProfile {
            telegram_id: SEED_ID_BASE + LOCAL_OFFSET + i,
            username: None,
            language_code: DEFAULT_LANGUAGE.to_string(),
            name: format!("Локальна мама {n}"),
            nickname: format!("Local_{n}"),
            region: region.clone(),
            place: place.clone(),
            age: rng.gen_range(22..=40),
            status: random_status(rng),
            interests: random_interests(rng, 3),
            bio: "Тестовий профіль (спільне місце проживання).".to_string(),
        });
    }

    let other_regions: Vec<&str> = VALID_REGIONS.iter().copied().filter(|r| *r != region).collect();
    for i in 0..PROFILES_PER_GROUP {
        let n = i + 1;
        profiles.push(NewProfile {
            telegram_id: SEED_ID_BASE + INTEREST_OFFSET + i,
            username: None,
            language_code: DEFAULT_LANGUAGE.to_string(),
            name: format!("Інтерес мама {n}"),
            nickname: format!("Interest_{n}"),
            region: other_regions
                .choose(rng)
                .map(|r| r.to_string())
                .unwrap_or_else(|| region.clone()),
            place: other_place.clone(),
            age: rng.gen_range(22..=40),
            status: random_status(rng),
            interests: pick_interests(&interests, 1, 2, rng),
            bio: "Тестовий профіль (схожі інтереси, інше місце).".to_string(),
        });
    }

    for i in 0..PROFILES_PER_GROUP {
        let n = i + 1;
        profiles.push(NewProfile {
            telegram_id: SEED_ID_BASE + COMBO_OFFSET + i,
            username: None,
            language_code: DEFAULT_LANGUAGE.to_string(),
            name: format!("Комбо мама {n}"),
            nickname: format!("Combo_{n}"),
            region: region.clone(),
            place: place.clone(),
            age: rng.gen_range(22..=40),
            status: status.clone(),
            interests: pick_interests(&interests, 2, 1, rng),
            bio: "Тестовий профіль (місце + інтереси).".to_string(),
        });
    }

    profiles
}

/// Insert the demo profiles for an existing user; already present ids are
/// skipped. Returns the number of new rows.
pub async fn seed_test_profiles(pool: &PgPool, me_telegram_id: i64) -> Result<usize> {
    let Some(me) = get_user(pool, me_telegram_id).await? else {
        bail!("User {me_telegram_id} not found");
    };

    let profiles = build_seed_profiles(&me, &mut rand::thread_rng());
    let mut inserted = 0;
    for profile in &profiles {
        if insert_profile_if_absent(pool, profile).await? {
            inserted += 1;
        }
    }

    info!(
        telegram_id = me_telegram_id,
        inserted,
        skipped = profiles.len() - inserted,
        "Seeded demo profiles"
    );
    Ok(inserted)
}
