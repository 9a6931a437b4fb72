//! # Tipster インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とタイムアウト制御
//! - **リポジトリ実装**: 予想記事・リーグの読み書き
//! - **メールプロバイダ**: キャンペーン作成・送信、購読者リスト登録
//! - **パスワード検証**: 管理画面の Basic 認証
//!
//! ## 依存関係
//!
//! ```text
//! web → infra → domain
//!   ↘           ↗
//!     shared
//! ```
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use tipster_infra::{db, repository::PostgresPredictionRepository};
//!
//! let pool = db::create_pool("postgres://localhost/tipster", Duration::from_secs(3))?;
//! let predictions = PostgresPredictionRepository::new(pool, Duration::from_secs(3));
//! ```

pub mod db;
pub mod email_provider;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod password;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use password::{Argon2PasswordChecker, PasswordChecker};
