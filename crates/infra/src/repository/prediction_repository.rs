//! # PredictionRepository
//!
//! 予想記事の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **ビジネスロジックを持たない**: 読み書きのみ。配信するかどうかの判断はユースケース層が行う
//! - **配信済みフラグは専用操作でのみ書き込む**: [`PredictionRepository::update`] は `campaigned` を
//!   SET しない。[`PredictionRepository::mark_campaigned`] が `campaigned = false` を条件に 1 行だけ更新する
//! - **タイムアウト**: 各メソッドは [`db::with_timeout`] で包む
//! - **一意制約**: スラッグ重複は [`InfraError::conflict`] に変換する

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tipster_domain::{
    league::LeagueId,
    prediction::{Prediction, PredictionDraft, PredictionId, PredictionRecord, Slug},
};

use crate::{db, error::InfraError};

/// 公開一覧の最大件数
pub const UPCOMING_LIMIT: i64 = 30;

/// 予想記事リポジトリトレイト
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// ID で予想記事を検索する
    async fn find_by_id(&self, id: PredictionId) -> Result<Option<Prediction>, InfraError>;

    /// スラッグで予想記事を検索する
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Prediction>, InfraError>;

    /// `from` 以降に予定されている予想記事を取得する
    ///
    /// リーグ名 → 予定日時 → 作成日時の順。最大 [`UPCOMING_LIMIT`] 件。
    /// `include_archived` が false の場合はアーカイブ済みを除外する。
    async fn find_upcoming(
        &self,
        from: DateTime<Utc>,
        include_archived: bool,
    ) -> Result<Vec<Prediction>, InfraError>;

    /// `from` 以降に予定されている注目記事（アーカイブ済みを除く）を取得する
    async fn find_featured(&self, from: DateTime<Utc>) -> Result<Vec<Prediction>, InfraError>;

    /// 予想記事を作成し、採番された ID を返す
    ///
    /// 配信済みフラグは false で作成される。
    async fn insert(
        &self,
        draft: &PredictionDraft,
        now: DateTime<Utc>,
    ) -> Result<PredictionId, InfraError>;

    /// 予想記事の編集可能なフィールドを保存する
    ///
    /// 配信済みフラグは書き込まない。古いスナップショットから保存しても、
    /// その間に記録された配信済みフラグは維持される。
    async fn update(&self, prediction: &Prediction) -> Result<(), InfraError>;

    /// 未配信の予想記事を配信済みにする
    ///
    /// `campaigned = false` の行だけを更新する。遷移した場合は true、
    /// 既に配信済みまたは行が存在しない場合は false。
    async fn mark_campaigned(
        &self,
        id: PredictionId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError>;

    /// 予想記事を削除する。削除対象が存在した場合は true
    async fn delete(&self, id: PredictionId) -> Result<bool, InfraError>;
}

/// DB の行
#[derive(Debug, sqlx::FromRow)]
struct PredictionRow {
    id:              i64,
    title:           String,
    slug:            String,
    body:            String,
    keywords:        String,
    odds:            f64,
    prediction_type: String,
    scheduled_at:    DateTime<Utc>,
    is_featured:     bool,
    is_archived:     bool,
    campaigned:      bool,
    league_id:       Option<i64>,
    league_title:    Option<String>,
    created_at:      DateTime<Utc>,
    updated_at:      DateTime<Utc>,
}

impl From<PredictionRow> for Prediction {
    fn from(row: PredictionRow) -> Self {
        Prediction::from_db(PredictionRecord {
            id:           PredictionId::from_db(row.id),
            slug:         Slug::from_db(row.slug),
            draft:        PredictionDraft {
                title:           row.title,
                body:            row.body,
                keywords:        row.keywords,
                odds:            row.odds,
                prediction_type: row.prediction_type,
                scheduled_at:    row.scheduled_at,
                is_featured:     row.is_featured,
                is_archived:     row.is_archived,
                league_id:       row.league_id.map(LeagueId::from_db),
            },
            campaigned:   row.campaigned,
            league_title: row.league_title,
            created_at:   row.created_at,
            updated_at:   row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        p.id, p.title, p.slug, p.body, p.keywords, p.odds, p.prediction_type,
        p.scheduled_at, p.is_featured, p.is_archived, p.campaigned,
        p.league_id, l.title AS league_title, p.created_at, p.updated_at
    FROM prediction p
    LEFT JOIN league l ON l.id = p.league_id
"#;

/// PostgreSQL 実装の PredictionRepository
#[derive(Debug, Clone)]
pub struct PostgresPredictionRepository {
    pool:    PgPool,
    timeout: Duration,
}

impl PostgresPredictionRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl PredictionRepository for PostgresPredictionRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: PredictionId) -> Result<Option<Prediction>, InfraError> {
        db::with_timeout(self.timeout, async {
            let row: Option<PredictionRow> =
                sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE p.id = $1"))
                    .bind(id.as_i64())
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row.map(Prediction::from))
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%slug))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Prediction>, InfraError> {
        db::with_timeout(self.timeout, async {
            let row: Option<PredictionRow> =
                sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE p.slug = $1"))
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row.map(Prediction::from))
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_upcoming(
        &self,
        from: DateTime<Utc>,
        include_archived: bool,
    ) -> Result<Vec<Prediction>, InfraError> {
        db::with_timeout(self.timeout, async {
            let rows: Vec<PredictionRow> = sqlx::query_as(&format!(
                r#"{SELECT_COLUMNS}
                WHERE ($1 OR p.is_archived = false)
                  AND p.scheduled_at >= $2
                ORDER BY l.title, p.scheduled_at, p.created_at
                LIMIT $3"#
            ))
            .bind(include_archived)
            .bind(from)
            .bind(UPCOMING_LIMIT)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(Prediction::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_featured(&self, from: DateTime<Utc>) -> Result<Vec<Prediction>, InfraError> {
        db::with_timeout(self.timeout, async {
            let rows: Vec<PredictionRow> = sqlx::query_as(&format!(
                r#"{SELECT_COLUMNS}
                WHERE p.is_featured = true
                  AND p.is_archived = false
                  AND p.scheduled_at >= $1
                ORDER BY p.scheduled_at, p.created_at"#
            ))
            .bind(from)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(Prediction::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(title = %draft.title))]
    async fn insert(
        &self,
        draft: &PredictionDraft,
        now: DateTime<Utc>,
    ) -> Result<PredictionId, InfraError> {
        let slug = draft.slug();
        db::with_timeout(self.timeout, async {
            let (id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO prediction (
                    title, slug, body, keywords, odds, prediction_type, scheduled_at,
                    is_featured, is_archived, campaigned, league_id, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, $10, $11, $11)
                RETURNING id
                "#,
            )
            .bind(&draft.title)
            .bind(slug.as_str())
            .bind(&draft.body)
            .bind(&draft.keywords)
            .bind(draft.odds)
            .bind(&draft.prediction_type)
            .bind(draft.scheduled_at)
            .bind(draft.is_featured)
            .bind(draft.is_archived)
            .bind(draft.league_id.map(|l| l.as_i64()))
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| InfraError::from_write(e, "Prediction", slug.as_str()))?;
            Ok(PredictionId::from_db(id))
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %prediction.id()))]
    async fn update(&self, prediction: &Prediction) -> Result<(), InfraError> {
        db::with_timeout(self.timeout, async {
            let result = sqlx::query(
                r#"
                UPDATE prediction SET
                    title = $1,
                    slug = $2,
                    body = $3,
                    keywords = $4,
                    odds = $5,
                    prediction_type = $6,
                    scheduled_at = $7,
                    is_featured = $8,
                    is_archived = $9,
                    league_id = $10,
                    updated_at = $11
                WHERE id = $12
                "#,
            )
            .bind(prediction.title())
            .bind(prediction.slug().as_str())
            .bind(prediction.body())
            .bind(prediction.keywords())
            .bind(prediction.odds())
            .bind(prediction.prediction_type())
            .bind(prediction.scheduled_at())
            .bind(prediction.is_featured())
            .bind(prediction.is_archived())
            .bind(prediction.league_id().map(|l| l.as_i64()))
            .bind(prediction.updated_at())
            .bind(prediction.id().as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| InfraError::from_write(e, "Prediction", prediction.slug().as_str()))?;

            if result.rows_affected() == 0 {
                return Err(InfraError::unexpected(format!(
                    "更新対象の予想記事が存在しません: {}",
                    prediction.id()
                )));
            }
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn mark_campaigned(
        &self,
        id: PredictionId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        db::with_timeout(self.timeout, async {
            let result = sqlx::query(
                r#"
                UPDATE prediction
                SET campaigned = true, updated_at = $2
                WHERE id = $1 AND campaigned = false
                "#,
            )
            .bind(id.as_i64())
            .bind(now)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        })
        .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: PredictionId) -> Result<bool, InfraError> {
        db::with_timeout(self.timeout, async {
            let result = sqlx::query("DELETE FROM prediction WHERE id = $1")
                .bind(id.as_i64())
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
