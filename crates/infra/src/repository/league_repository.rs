//! # LeagueRepository
//!
//! リーグの永続化を担当するリポジトリ。
//! リーグを削除すると、参照していた予想記事の `league_id` は DB 側で NULL になる。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tipster_domain::league::{League, LeagueId};

use crate::{db, error::InfraError};

/// リーグリポジトリトレイト
#[async_trait]
pub trait LeagueRepository: Send + Sync {
    /// 全リーグをタイトル順で取得する
    async fn find_all(&self) -> Result<Vec<League>, InfraError>;

    async fn find_by_id(&self, id: LeagueId) -> Result<Option<League>, InfraError>;

    /// リーグを作成する
    async fn insert(&self, title: &str, now: DateTime<Utc>) -> Result<League, InfraError>;

    /// タイトルと更新日時を保存する
    async fn update(&self, league: &League) -> Result<(), InfraError>;

    /// リーグを削除する。削除対象が存在した場合は true
    async fn delete(&self, id: LeagueId) -> Result<bool, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct LeagueRow {
    id:         i64,
    title:      String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeagueRow> for League {
    fn from(row: LeagueRow) -> Self {
        League::from_db(
            LeagueId::from_db(row.id),
            row.title,
            row.created_at,
            row.updated_at,
        )
    }
}

/// PostgreSQL 実装の LeagueRepository
#[derive(Debug, Clone)]
pub struct PostgresLeagueRepository {
    pool:    PgPool,
    timeout: Duration,
}

impl PostgresLeagueRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl LeagueRepository for PostgresLeagueRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<League>, InfraError> {
        db::with_timeout(self.timeout, async {
            let rows: Vec<LeagueRow> = sqlx::query_as(
                "SELECT id, title, created_at, updated_at FROM league ORDER BY title, id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(League::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: LeagueId) -> Result<Option<League>, InfraError> {
        db::with_timeout(self.timeout, async {
            let row: Option<LeagueRow> = sqlx::query_as(
                "SELECT id, title, created_at, updated_at FROM league WHERE id = $1",
            )
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(League::from))
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%title))]
    async fn insert(&self, title: &str, now: DateTime<Utc>) -> Result<League, InfraError> {
        db::with_timeout(self.timeout, async {
            let row: LeagueRow = sqlx::query_as(
                r#"
                INSERT INTO league (title, created_at, updated_at)
                VALUES ($1, $2, $2)
                RETURNING id, title, created_at, updated_at
                "#,
            )
            .bind(title)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
            Ok(League::from(row))
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %league.id()))]
    async fn update(&self, league: &League) -> Result<(), InfraError> {
        db::with_timeout(self.timeout, async {
            let result = sqlx::query("UPDATE league SET title = $1, updated_at = $2 WHERE id = $3")
                .bind(league.title())
                .bind(league.updated_at())
                .bind(league.id().as_i64())
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(InfraError::unexpected(format!(
                    "更新対象のリーグが存在しません: {}",
                    league.id()
                )));
            }
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: LeagueId) -> Result<bool, InfraError> {
        db::with_timeout(self.timeout, async {
            let result = sqlx::query("DELETE FROM league WHERE id = $1")
                .bind(id.as_i64())
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
