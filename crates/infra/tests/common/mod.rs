//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use tipster_domain::{league::LeagueId, prediction::PredictionDraft};
use tipster_infra::repository::{PostgresLeagueRepository, PostgresPredictionRepository};

pub const STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// テストで使う固定時刻（作成日時）
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 30, 12, 0, 0).unwrap()
}

/// キックオフ時刻
pub fn kickoff(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

pub fn draft(title: &str, scheduled_at: DateTime<Utc>) -> PredictionDraft {
    PredictionDraft {
        title: title.to_string(),
        body: "<p>ホーム勝利</p>".to_string(),
        keywords: "derby".to_string(),
        odds: 2.1,
        prediction_type: "1X2".to_string(),
        scheduled_at,
        is_featured: false,
        is_archived: false,
        league_id: None,
    }
}

pub fn draft_in_league(
    title: &str,
    scheduled_at: DateTime<Utc>,
    league_id: LeagueId,
) -> PredictionDraft {
    PredictionDraft {
        league_id: Some(league_id),
        ..draft(title, scheduled_at)
    }
}

pub fn prediction_repo(pool: &PgPool) -> PostgresPredictionRepository {
    PostgresPredictionRepository::new(pool.clone(), STORE_TIMEOUT)
}

pub fn league_repo(pool: &PgPool) -> PostgresLeagueRepository {
    PostgresLeagueRepository::new(pool.clone(), STORE_TIMEOUT)
}
