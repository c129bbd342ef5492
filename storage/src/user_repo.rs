//! User repository: SQLite persistence for [`UserRecord`].
//!
//! One row per table (`users`, `user_infos`, `user_photos`) keyed by chat id; `save` upserts all
//! three in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{MemberStatus, UserInfo, UserPhoto, UserRecord};
use crate::repository::UserStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct UserRepository {
    pool_manager: SqlitePoolManager,
}

impl UserRepository {
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> std::result::Result<(), sqlx::Error> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                chat_id INTEGER PRIMARY KEY,
                is_bot INTEGER NOT NULL DEFAULT 0,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL DEFAULT '',
                language_code TEXT NOT NULL DEFAULT '',
                is_premium INTEGER NOT NULL DEFAULT 0,
                added_to_attachment_menu INTEGER NOT NULL DEFAULT 0,
                can_join_groups INTEGER NOT NULL DEFAULT 0,
                can_read_all_group_messages INTEGER NOT NULL DEFAULT 0,
                supports_inline_queries INTEGER NOT NULL DEFAULT 0,
                can_connect_to_business INTEGER NOT NULL DEFAULT 0,
                has_main_web_app INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_infos (
                chat_id INTEGER PRIMARY KEY REFERENCES users(chat_id) ON DELETE CASCADE,
                is_active INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT '',
                latitude REAL NOT NULL DEFAULT 0,
                longitude REAL NOT NULL DEFAULT 0,
                location TEXT NOT NULL DEFAULT '',
                zone_name TEXT NOT NULL DEFAULT '',
                tz_offset INTEGER,
                is_dst INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_photos (
                chat_id INTEGER PRIMARY KEY REFERENCES users(chat_id) ON DELETE CASCADE,
                file_id TEXT NOT NULL DEFAULT '',
                file_unique_id TEXT NOT NULL DEFAULT '',
                file_size INTEGER NOT NULL DEFAULT 0,
                file_hash TEXT NOT NULL DEFAULT '',
                file_data BLOB NOT NULL,
                width INTEGER NOT NULL DEFAULT 0,
                height INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    fn user_from_row(row: &SqliteRow) -> std::result::Result<UserRecord, sqlx::Error> {
        let mut user = UserRecord::new(row.try_get("chat_id")?);
        user.is_bot = row.try_get("is_bot")?;
        user.first_name = row.try_get("first_name")?;
        user.last_name = row.try_get("last_name")?;
        user.username = row.try_get("username")?;
        user.language_code = row.try_get("language_code")?;
        user.is_premium = row.try_get("is_premium")?;
        user.added_to_attachment_menu = row.try_get("added_to_attachment_menu")?;
        user.can_join_groups = row.try_get("can_join_groups")?;
        user.can_read_all_group_messages = row.try_get("can_read_all_group_messages")?;
        user.supports_inline_queries = row.try_get("supports_inline_queries")?;
        user.can_connect_to_business = row.try_get("can_connect_to_business")?;
        user.has_main_web_app = row.try_get("has_main_web_app")?;
        user.created_at = row.try_get::<DateTime<Utc>, _>("created_at")?;
        user.updated_at = row.try_get::<DateTime<Utc>, _>("updated_at")?;
        Ok(user)
    }

    fn info_from_row(row: &SqliteRow) -> Result<UserInfo> {
        let status: String = row.try_get("status")?;
        Ok(UserInfo {
            is_active: row.try_get("is_active")?,
            status: status.parse::<MemberStatus>()?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            location: row.try_get("location")?,
            zone_name: row.try_get("zone_name")?,
            tz_offset: row.try_get("tz_offset")?,
            is_dst: row.try_get("is_dst")?,
        })
    }

    fn photo_from_row(row: &SqliteRow) -> std::result::Result<UserPhoto, sqlx::Error> {
        Ok(UserPhoto {
            file_id: row.try_get("file_id")?,
            file_unique_id: row.try_get("file_unique_id")?,
            file_size: row.try_get::<i64, _>("file_size")? as u32,
            file_hash: row.try_get("file_hash")?,
            file_data: row.try_get("file_data")?,
            width: row.try_get::<i64, _>("width")? as u32,
            height: row.try_get::<i64, _>("height")? as u32,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<UserRecord>> {
        let pool = self.pool_manager.pool();

        let Some(row) = sqlx::query("SELECT * FROM users WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(pool)
            .await?
        else {
            debug!(chat_id, "User not found");
            return Ok(None);
        };
        let mut user = Self::user_from_row(&row)?;

        if let Some(row) = sqlx::query("SELECT * FROM user_infos WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(pool)
            .await?
        {
            user.info = Self::info_from_row(&row)?;
        }

        if let Some(row) = sqlx::query("SELECT * FROM user_photos WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(pool)
            .await?
        {
            user.photo = Self::photo_from_row(&row)?;
        }

        Ok(Some(user))
    }

    async fn save(&self, user: &UserRecord) -> Result<()> {
        let mut tx = self.pool_manager.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (chat_id, is_bot, first_name, last_name, username, language_code,
                is_premium, added_to_attachment_menu, can_join_groups, can_read_all_group_messages,
                supports_inline_queries, can_connect_to_business, has_main_web_app, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
                is_bot = excluded.is_bot,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                username = excluded.username,
                language_code = excluded.language_code,
                is_premium = excluded.is_premium,
                added_to_attachment_menu = excluded.added_to_attachment_menu,
                can_join_groups = excluded.can_join_groups,
                can_read_all_group_messages = excluded.can_read_all_group_messages,
                supports_inline_queries = excluded.supports_inline_queries,
                can_connect_to_business = excluded.can_connect_to_business,
                has_main_web_app = excluded.has_main_web_app,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.chat_id)
        .bind(user.is_bot)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.language_code)
        .bind(user.is_premium)
        .bind(user.added_to_attachment_menu)
        .bind(user.can_join_groups)
        .bind(user.can_read_all_group_messages)
        .bind(user.supports_inline_queries)
        .bind(user.can_connect_to_business)
        .bind(user.has_main_web_app)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        let info = &user.info;
        sqlx::query(
            r#"
            INSERT INTO user_infos (chat_id, is_active, status, latitude, longitude, location, zone_name, tz_offset, is_dst)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
                is_active = excluded.is_active,
                status = excluded.status,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                location = excluded.location,
                zone_name = excluded.zone_name,
                tz_offset = excluded.tz_offset,
                is_dst = excluded.is_dst
            "#,
        )
        .bind(user.chat_id)
        .bind(info.is_active)
        .bind(info.status.as_str())
        .bind(info.latitude)
        .bind(info.longitude)
        .bind(&info.location)
        .bind(&info.zone_name)
        .bind(info.tz_offset)
        .bind(info.is_dst)
        .execute(&mut *tx)
        .await?;

        let photo = &user.photo;
        sqlx::query(
            r#"
            INSERT INTO user_photos (chat_id, file_id, file_unique_id, file_size, file_hash, file_data, width, height)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chat_id) DO UPDATE SET
                file_id = excluded.file_id,
                file_unique_id = excluded.file_unique_id,
                file_size = excluded.file_size,
                file_hash = excluded.file_hash,
                file_data = excluded.file_data,
                width = excluded.width,
                height = excluded.height
            "#,
        )
        .bind(user.chat_id)
        .bind(&photo.file_id)
        .bind(&photo.file_unique_id)
        .bind(photo.file_size as i64)
        .bind(&photo.file_hash)
        .bind(&photo.file_data)
        .bind(photo.width as i64)
        .bind(photo.height as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            chat_id = user.chat_id,
            is_active = user.info.is_active,
            status = user.info.status.as_str(),
            "Saved user"
        );
        Ok(())
    }
}
