use anyhow::{Context, Result};
use mama_match::db::*;
use mama_match::matching::{find_candidates, record_judgment, ChoiceLedger, Criterion, Decision, Judgment};
use mama_match::profile::{NewProfile, Place, ProfileUpdate};
use sqlx::PgPool;
use std::env;

/// Helper macro to skip tests when database is not available
macro_rules! skip_if_no_db {
    ($test_fn:expr) => {
        match setup_test_db().await {
            Ok(pool) => $test_fn(&pool).await,
            Err(_) => {
                eprintln!("Skipping test: Database not available");
                Ok(())
            }
        }
    };
}

async fn setup_test_db() -> Result<PgPool> {
    // Skip tests if no DATABASE_URL is provided
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: DATABASE_URL not set");
            return Err(anyhow::anyhow!("Test database not configured"));
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to test database")?;

    init_database_schema(&pool).await?;

    Ok(pool)
}

/// Each test owns a block of ids so tests can share one database
async fn clear_ids(pool: &PgPool, from: i64, to: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE telegram_id BETWEEN $1 AND $2")
        .bind(from)
        .bind(to)
        .execute(pool)
        .await?;
    Ok(())
}

fn profile(telegram_id: i64, city: &str, interests: &[&str]) -> NewProfile {
    NewProfile {
        telegram_id,
        username: None,
        language_code: "uk".to_string(),
        name: format!("Мама {telegram_id}"),
        nickname: format!("mama_{telegram_id}"),
        region: "Львівська".to_string(),
        place: Place::City(city.to_string()),
        age: 30,
        status: "Мама".to_string(),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        bio: "Люблю прогулянки".to_string(),
    }
}

#[tokio::test]
async fn test_profile_operations() -> Result<()> {
    skip_if_no_db!(test_profile_operations_impl)
}

async fn test_profile_operations_impl(pool: &PgPool) -> Result<()> {
    clear_ids(pool, 900_100, 900_199).await?;

    assert_eq!(get_user(pool, 900_100).await?, None);

    let saved = upsert_profile(pool, &profile(900_100, "Львів", &["Книги"])).await?;
    assert_eq!(saved.telegram_id, 900_100);
    assert_eq!(saved.city.as_deref(), Some("Львів"));
    assert_eq!(saved.village, None);

    // A second confirmation overwrites every answer
    let mut again = profile(900_100, "Стрий", &["Подорожі"]);
    again.place = Place::Village("Стрий".to_string());
    let saved = upsert_profile(pool, &again).await?;
    assert_eq!(saved.city, None);
    assert_eq!(saved.village.as_deref(), Some("Стрий"));
    assert_eq!(saved.interests, vec!["Подорожі".to_string()]);

    assert!(apply_profile_update(pool, 900_100, &ProfileUpdate::Age(35)).await?);
    assert!(
        apply_profile_update(
            pool,
            900_100,
            &ProfileUpdate::Location {
                region: "Київська".to_string(),
                place: Place::City("Біла Церква".to_string()),
            },
        )
        .await?
    );
    let stored = get_user(pool, 900_100).await?.context("profile missing")?;
    assert_eq!(stored.age, Some(35));
    assert_eq!(stored.region.as_deref(), Some("Київська"));
    assert_eq!(stored.city.as_deref(), Some("Біла Церква"));
    assert_eq!(stored.village, None);

    // Updates for unknown users report that nothing changed
    assert!(!apply_profile_update(pool, 900_199, &ProfileUpdate::Bio("x".to_string())).await?);

    assert!(!insert_profile_if_absent(pool, &profile(900_100, "Львів", &[])).await?);
    assert!(insert_profile_if_absent(pool, &profile(900_101, "Львів", &[])).await?);

    clear_ids(pool, 900_100, 900_199).await?;
    Ok(())
}

#[tokio::test]
async fn test_choice_ledger() -> Result<()> {
    skip_if_no_db!(test_choice_ledger_impl)
}

async fn test_choice_ledger_impl(pool: &PgPool) -> Result<()> {
    clear_ids(pool, 900_200, 900_299).await?;
    for id in [900_200, 900_201, 900_202] {
        upsert_profile(pool, &profile(id, "Ledger", &["Книги"])).await?;
    }

    assert_eq!(
        record_judgment(pool, 900_200, 900_201, Decision::Like).await?,
        Judgment::Recorded
    );
    // A repeated judgment keeps the first decision
    assert_eq!(
        record_judgment(pool, 900_200, 900_201, Decision::Dislike).await?,
        Judgment::AlreadyRecorded
    );
    assert!(pool.has_liked(900_200, 900_201).await?);

    assert_eq!(
        record_judgment(pool, 900_201, 900_200, Decision::Like).await?,
        Judgment::MutualMatch
    );
    assert_eq!(
        record_judgment(pool, 900_201, 900_200, Decision::Like).await?,
        Judgment::AlreadyRecorded
    );

    assert_eq!(
        record_judgment(pool, 900_202, 900_200, Decision::Dislike).await?,
        Judgment::Recorded
    );
    assert!(!pool.has_liked(900_202, 900_200).await?);

    let choices = list_choices_by(pool, 900_200).await?;
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0].chosen_id, 900_201);
    assert_eq!(choices[0].decision, Decision::Like);

    assert_eq!(pool.judged_ids(900_202).await?, vec![900_200]);

    clear_ids(pool, 900_200, 900_299).await?;
    Ok(())
}

#[tokio::test]
async fn test_find_candidates() -> Result<()> {
    skip_if_no_db!(test_find_candidates_impl)
}

async fn test_find_candidates_impl(pool: &PgPool) -> Result<()> {
    clear_ids(pool, 900_300, 900_399).await?;

    // A unique city keeps rows of other tests out of the location pool
    let city = "Тестове Місто 900300";
    let me = upsert_profile(pool, &profile(900_300, city, &["Книги"])).await?;
    for id in 900_301..=900_305 {
        upsert_profile(pool, &profile(id, city, &["Кулінарія"])).await?;
    }
    upsert_profile(pool, &profile(900_306, "Інше місто 900300", &["Книги"])).await?;

    let first = find_candidates(pool, &me, Criterion::Location).await?;
    let ids: Vec<i64> = first.iter().map(|p| p.telegram_id).collect();
    assert_eq!(ids, vec![900_301, 900_302, 900_303]);

    // Judged profiles never come back, whatever the decision
    record_judgment(pool, 900_300, 900_301, Decision::Like).await?;
    record_judgment(pool, 900_300, 900_302, Decision::Dislike).await?;
    let second = find_candidates(pool, &me, Criterion::Location).await?;
    let ids: Vec<i64> = second.iter().map(|p| p.telegram_id).collect();
    assert_eq!(ids, vec![900_303, 900_304, 900_305]);

    let combined = find_candidates(pool, &me, Criterion::LocationInterests).await?;
    assert!(combined.is_empty());

    clear_ids(pool, 900_300, 900_399).await?;
    Ok(())
}

#[tokio::test]
async fn test_message_templates() -> Result<()> {
    skip_if_no_db!(test_message_templates_impl)
}

async fn test_message_templates_impl(pool: &PgPool) -> Result<()> {
    let key = "test-template-900400";
    upsert_message_template(pool, key, "uk", "Перша версія").await?;
    upsert_message_template(pool, key, "uk", "Друга версія").await?;

    let templates = list_message_templates(pool).await?;
    let stored: Vec<&MessageTemplate> = templates.iter().filter(|t| t.key == key).collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].body, "Друга версія");

    sqlx::query("DELETE FROM message_templates WHERE template_key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}
