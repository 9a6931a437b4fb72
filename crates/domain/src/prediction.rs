//! # 予想記事
//!
//! 公開ページに掲載され、メールキャンペーンとして一度だけ配信される予想記事を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Prediction`] | 予想記事 | タイトル・本文・オッズ・配信済みフラグを持つ |
//! | [`PredictionId`] | 予想記事 ID | 正の整数。DB の BIGSERIAL |
//! | [`PredictionDraft`] | 予想記事の編集内容 | 作成・更新フォームから組み立てる |
//! | [`Slug`] | スラッグ | タイトル・種別・予定日から導出する URL 安全な文字列 |
//!
//! ## 不変条件
//!
//! - `campaigned` は配信成功の最終ステップでのみ false → true に遷移する
//! - 通常の編集（[`Prediction::with_draft`]）は `campaigned` を変更しない

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{DomainError, league::LeagueId};

/// 予想記事 ID
///
/// DB が採番する正の整数。0 以下の値は存在しない。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct PredictionId(i64);

impl PredictionId {
    /// 整数から ID を作成する
    ///
    /// 0 以下の値は `DomainError::Validation` を返す。
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::Validation(format!(
                "予想記事 ID は正の整数である必要があります: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// パスパラメータなどの文字列から ID を作成する
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            DomainError::Validation(format!("予想記事 ID の形式が不正です: {raw:?}"))
        })?;
        Self::new(value)
    }

    /// DB から読み込んだ値で ID を復元する（検証なし）
    pub fn from_db(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// スラッグ
///
/// 公開 URL `/prediction/{slug}` に使用する。
/// タイトル・予想種別・予定日（`YYYY-MM-DD`）から導出し、DB の UNIQUE 制約で一意性を保つ。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// タイトル・予想種別・予定日からスラッグを導出する
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use tipster_domain::prediction::Slug;
    ///
    /// let at = Utc.with_ymd_and_hms(2026, 5, 2, 15, 0, 0).unwrap();
    /// let slug = Slug::derive("Derby Day: Arsenal vs Spurs", "1X2", at);
    /// assert_eq!(slug.as_str(), "derby-day-arsenal-vs-spurs-1x2-2026-05-02");
    /// ```
    pub fn derive(title: &str, prediction_type: &str, scheduled_at: DateTime<Utc>) -> Self {
        let date = scheduled_at.format("%Y-%m-%d").to_string();
        let parts = [slugify(title), slugify(prediction_type), date];

        Self(
            parts
                .iter()
                .filter(|p| !p.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("-"),
        )
    }

    /// DB から読み込んだ値でスラッグを復元する
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ASCII 英数字以外を `-` に畳み込み、小文字化する
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// 予想記事の編集内容
///
/// 作成・更新フォームを検証した結果として組み立てる。
/// ID・スラッグ・配信済みフラグ・タイムスタンプは含まない。
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDraft {
    pub title:           String,
    pub body:            String,
    pub keywords:        String,
    pub odds:            f64,
    pub prediction_type: String,
    pub scheduled_at:    DateTime<Utc>,
    pub is_featured:     bool,
    pub is_archived:     bool,
    pub league_id:       Option<LeagueId>,
}

impl PredictionDraft {
    /// 編集内容から導出されるスラッグ
    pub fn slug(&self) -> Slug {
        Slug::derive(&self.title, &self.prediction_type, self.scheduled_at)
    }
}

/// DB から復元するための予想記事の全フィールド
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub id:           PredictionId,
    pub slug:         Slug,
    pub draft:        PredictionDraft,
    pub campaigned:   bool,
    pub league_title: Option<String>,
    pub created_at:   DateTime<Utc>,
    pub updated_at:   DateTime<Utc>,
}

/// 予想記事エンティティ
#[derive(Debug, Clone)]
pub struct Prediction {
    id:           PredictionId,
    slug:         Slug,
    draft:        PredictionDraft,
    campaigned:   bool,
    league_title: Option<String>,
    created_at:   DateTime<Utc>,
    updated_at:   DateTime<Utc>,
}

impl Prediction {
    /// DB から予想記事を復元する
    pub fn from_db(record: PredictionRecord) -> Self {
        Self {
            id:           record.id,
            slug:         record.slug,
            draft:        record.draft,
            campaigned:   record.campaigned,
            league_title: record.league_title,
            created_at:   record.created_at,
            updated_at:   record.updated_at,
        }
    }

    pub fn id(&self) -> PredictionId {
        self.id
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.draft.title
    }

    pub fn body(&self) -> &str {
        &self.draft.body
    }

    pub fn keywords(&self) -> &str {
        &self.draft.keywords
    }

    pub fn odds(&self) -> f64 {
        self.draft.odds
    }

    pub fn prediction_type(&self) -> &str {
        &self.draft.prediction_type
    }

    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.draft.scheduled_at
    }

    pub fn is_featured(&self) -> bool {
        self.draft.is_featured
    }

    pub fn is_archived(&self) -> bool {
        self.draft.is_archived
    }

    pub fn is_campaigned(&self) -> bool {
        self.campaigned
    }

    pub fn league_id(&self) -> Option<LeagueId> {
        self.draft.league_id
    }

    pub fn league_title(&self) -> Option<&str> {
        self.league_title.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn draft(&self) -> &PredictionDraft {
        &self.draft
    }

    /// 公開ページのパス
    pub fn public_path(&self) -> String {
        format!("/prediction/{}", self.slug)
    }

    /// 編集内容を反映した新しいインスタンスを返す
    ///
    /// スラッグは再導出する。配信済みフラグは保持する。
    pub fn with_draft(self, draft: PredictionDraft, now: DateTime<Utc>) -> Self {
        Self {
            slug: draft.slug(),
            draft,
            league_title: None,
            updated_at: now,
            ..self
        }
    }

    /// 配信済みとしてマークした新しいインスタンスを返す
    ///
    /// 既に配信済みの場合は `DomainError::Conflict` を返す。
    pub fn mark_campaigned(self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.campaigned {
            return Err(DomainError::Conflict(format!(
                "予想記事 {} は既に配信済みです",
                self.id
            )));
        }
        Ok(Self {
            campaigned: true,
            updated_at: now,
            ..self
        })
    }
}
