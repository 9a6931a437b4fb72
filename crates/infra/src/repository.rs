//! # リポジトリ実装
//!
//! 予想記事とリーグの永続化を担当する。
//!
//! ## 設計方針
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層は `Arc<dyn XRepository>` で受け取る
//! - **テスタビリティ**: `test-utils` feature の [`crate::mock`] にインメモリ実装を用意する
//! - **クエリ**: 実行時に解釈される `sqlx::query` / `sqlx::query_as` を使う

pub mod league_repository;
pub mod prediction_repository;

pub use league_repository::{LeagueRepository, PostgresLeagueRepository};
pub use prediction_repository::{
    PostgresPredictionRepository,
    PredictionRepository,
    UPCOMING_LIMIT,
};
