use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::matching::Decision;
use crate::profile::{NewProfile, ProfileUpdate, UserProfile};

/// Column list matching the field order of [`UserProfile`]
const USER_COLUMNS: &str = "telegram_id, name, username, nickname, region, city, village, age, \
                            status, interests, bio, language_code, created_at, updated_at";

/// A localized message template stored in the database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MessageTemplate {
    #[sqlx(rename = "template_key")]
    pub key: String,
    pub lang: String,
    pub body: String,
}

/// A directional judgment stored in the `choices` table
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub chooser_id: i64,
    pub chosen_id: i64,
    pub decision: Decision,
    pub created_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id BIGINT PRIMARY KEY,
            name VARCHAR(255),
            username VARCHAR(255),
            nickname VARCHAR(255),
            region VARCHAR(100),
            city VARCHAR(100),
            village VARCHAR(100),
            age INTEGER,
            status VARCHAR(50),
            interests TEXT[] NOT NULL DEFAULT '{}',
            bio TEXT,
            language_code VARCHAR(10) NOT NULL DEFAULT 'uk',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT chk_single_place CHECK (city IS NULL OR village IS NULL)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS choices (
            chooser_id BIGINT NOT NULL REFERENCES users(telegram_id) ON DELETE CASCADE,
            chosen_id BIGINT NOT NULL REFERENCES users(telegram_id) ON DELETE CASCADE,
            choice_type VARCHAR(20) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (chooser_id, chosen_id),
            CONSTRAINT chk_choice_type CHECK (choice_type IN ('LIKE', 'DISLIKE'))
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create choices table")?;

    // Reverse lookups for the mutual-like check
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_choices_chosen ON choices(chosen_id, chooser_id)")
        .execute(pool)
        .await
        .context("Failed to create choices index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS message_templates (
            template_key VARCHAR(100) NOT NULL,
            lang VARCHAR(10) NOT NULL DEFAULT 'uk',
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (template_key, lang)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create message_templates table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Read a user profile by Telegram id
pub async fn get_user(pool: &PgPool, telegram_id: i64) -> Result<Option<UserProfile>> {
    debug!(telegram_id, "Reading user profile");

    let user = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
    ))
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")?;

    Ok(user)
}

/// Insert a confirmed profile, or overwrite every answer of an existing one
pub async fn upsert_profile(pool: &PgPool, profile: &NewProfile) -> Result<UserProfile> {
    info!(telegram_id = profile.telegram_id, "Saving confirmed profile");

    let (city, village) = profile.place.clone().into_columns();

    let user = sqlx::query_as::<_, UserProfile>(&format!(
        "INSERT INTO users (telegram_id, name, username, nickname, region, city, village, age,
                            status, interests, bio, language_code)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (telegram_id) DO UPDATE SET
            name = EXCLUDED.name,
            username = EXCLUDED.username,
            nickname = EXCLUDED.nickname,
            region = EXCLUDED.region,
            city = EXCLUDED.city,
            village = EXCLUDED.village,
            age = EXCLUDED.age,
            status = EXCLUDED.status,
            interests = EXCLUDED.interests,
            bio = EXCLUDED.bio,
            language_code = EXCLUDED.language_code,
            updated_at = NOW()
         RETURNING {USER_COLUMNS}"
    ))
    .bind(profile.telegram_id)
    .bind(&profile.name)
    .bind(&profile.username)
    .bind(&profile.nickname)
    .bind(&profile.region)
    .bind(city)
    .bind(village)
    .bind(profile.age)
    .bind(&profile.status)
    .bind(profile.interests.clone())
    .bind(&profile.bio)
    .bind(&profile.language_code)
    .fetch_one(pool)
    .await
    .context("Failed to upsert profile")?;

    Ok(user)
}

/// Insert a profile unless the id is taken. Returns `true` when inserted.
pub async fn insert_profile_if_absent(pool: &PgPool, profile: &NewProfile) -> Result<bool> {
    let (city, village) = profile.place.clone().into_columns();

    let result = sqlx::query(
        "INSERT INTO users (telegram_id, name, username, nickname, region, city, village, age,
                            status, interests, bio, language_code)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (telegram_id) DO NOTHING",
    )
    .bind(profile.telegram_id)
    .bind(&profile.name)
    .bind(&profile.username)
    .bind(&profile.nickname)
    .bind(&profile.region)
    .bind(city)
    .bind(village)
    .bind(profile.age)
    .bind(&profile.status)
    .bind(profile.interests.clone())
    .bind(&profile.bio)
    .bind(&profile.language_code)
    .execute(pool)
    .await
    .context("Failed to insert profile")?;

    Ok(result.rows_affected() == 1)
}

/// Apply a single-field edit. Returns `false` when the user does not exist.
pub async fn apply_profile_update(
    pool: &PgPool,
    telegram_id: i64,
    update: &ProfileUpdate,
) -> Result<bool> {
    debug!(telegram_id, update = ?update, "Applying profile update");

    let query = match update {
        ProfileUpdate::Name(name) => {
            sqlx::query("UPDATE users SET name = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(name)
        }
        ProfileUpdate::Nickname(nickname) => {
            sqlx::query("UPDATE users SET nickname = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(nickname)
        }
        ProfileUpdate::Location { region, place } => {
            let (city, village) = place.clone().into_columns();
            sqlx::query(
                "UPDATE users SET region = $2, city = $3, village = $4, updated_at = NOW()
                 WHERE telegram_id = $1",
            )
            .bind(telegram_id)
            .bind(region)
            .bind(city)
            .bind(village)
        }
        ProfileUpdate::Age(age) => {
            sqlx::query("UPDATE users SET age = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(*age)
        }
        ProfileUpdate::Status(status) => {
            sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(status)
        }
        ProfileUpdate::Interests(interests) => {
            sqlx::query("UPDATE users SET interests = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(interests.clone())
        }
        ProfileUpdate::Bio(bio) => {
            sqlx::query("UPDATE users SET bio = $2, updated_at = NOW() WHERE telegram_id = $1")
                .bind(telegram_id)
                .bind(bio)
        }
    };

    let rows_affected = query
        .execute(pool)
        .await
        .context("Failed to update profile")?
        .rows_affected();

    Ok(rows_affected > 0)
}

/// Stream every user except the requester in the pool's natural order
pub fn fetch_candidate_pool(
    pool: &PgPool,
    requester_id: i64,
) -> BoxStream<'_, Result<UserProfile, sqlx::Error>> {
    sqlx::query_as::<_, UserProfile>(
        "SELECT telegram_id, name, username, nickname, region, city, village, age,
                status, interests, bio, language_code, created_at, updated_at
         FROM users
         WHERE telegram_id <> $1
         ORDER BY created_at, telegram_id",
    )
    .bind(requester_id)
    .fetch(pool)
}

/// Insert a judgment unless one already exists for the ordered pair.
///
/// Returns `true` when a new row was written. A concurrent duplicate insert
/// is reported as already recorded rather than as an error.
pub async fn insert_choice(
    pool: &PgPool,
    chooser_id: i64,
    chosen_id: i64,
    decision: Decision,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO choices (chooser_id, chosen_id, choice_type)
         VALUES ($1, $2, $3)
         ON CONFLICT (chooser_id, chosen_id) DO NOTHING",
    )
    .bind(chooser_id)
    .bind(chosen_id)
    .bind(decision.as_str())
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.rows_affected() == 1),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            debug!(chooser_id, chosen_id, "Choice inserted concurrently, treating as recorded");
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to insert choice"),
    }
}

/// Whether `chooser_id` has recorded a LIKE for `chosen_id`
pub async fn has_liked(pool: &PgPool, chooser_id: i64, chosen_id: i64) -> Result<bool> {
    let liked: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM choices
            WHERE chooser_id = $1 AND chosen_id = $2 AND choice_type = 'LIKE'
        )",
    )
    .bind(chooser_id)
    .bind(chosen_id)
    .fetch_one(pool)
    .await
    .context("Failed to check like")?;

    Ok(liked)
}

/// Ids judged by `chooser_id`, any decision type
pub async fn list_judged_ids(pool: &PgPool, chooser_id: i64) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT chosen_id FROM choices WHERE chooser_id = $1")
        .bind(chooser_id)
        .fetch_all(pool)
        .await
        .context("Failed to list judged users")?;

    Ok(ids)
}

/// All judgments made by `chooser_id`, oldest first
pub async fn list_choices_by(pool: &PgPool, chooser_id: i64) -> Result<Vec<Choice>> {
    let rows: Vec<(i64, i64, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT chooser_id, chosen_id, choice_type, created_at
         FROM choices WHERE chooser_id = $1
         ORDER BY created_at, chosen_id",
    )
    .bind(chooser_id)
    .fetch_all(pool)
    .await
    .context("Failed to list choices")?;

    rows.into_iter()
        .map(|(chooser_id, chosen_id, choice_type, created_at)| {
            let decision = Decision::parse(&choice_type)
                .with_context(|| format!("Unexpected choice type: {choice_type}"))?;
            Ok(Choice {
                chooser_id,
                chosen_id,
                decision,
                created_at,
            })
        })
        .collect()
}

/// Load every stored message template
pub async fn list_message_templates(pool: &PgPool) -> Result<Vec<MessageTemplate>> {
    let templates = sqlx::query_as::<_, MessageTemplate>(
        "SELECT template_key, lang, body FROM message_templates ORDER BY template_key, lang",
    )
    .fetch_all(pool)
    .await
    .context("Failed to load message templates")?;

    Ok(templates)
}

/// Create or replace a message template
pub async fn upsert_message_template(pool: &PgPool, key: &str, lang: &str, body: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO message_templates (template_key, lang, body)
         VALUES ($1, $2, $3)
         ON CONFLICT (template_key, lang) DO UPDATE SET body = EXCLUDED.body",
    )
    .bind(key)
    .bind(lang)
    .bind(body)
    .execute(pool)
    .await
    .context("Failed to save message template")?;

    Ok(())
}
