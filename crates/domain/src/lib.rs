//! # Tipster ドメイン層
//!
//! 予想記事とメールキャンペーン配信の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（Prediction, League）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（Slug, SubscriberEmail）
//! - **状態機械**: キャンペーン配信の進行状態（[`campaign::DispatchState`]）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! web → infra → domain
//!         ↘       ↑
//!          shared ─┘（domain は shared に依存しない）
//! ```
//!
//! ドメイン層はインフラ層（DB、メールプロバイダ）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`clock`] - 時刻プロバイダ
//! - [`prediction`] - 予想記事エンティティとスラッグ
//! - [`league`] - リーグエンティティ
//! - [`campaign`] - キャンペーン配信の状態機械・下書き・プロバイダエラー
//! - [`subscriber`] - 購読者メールアドレス
//! - [`password`] - 管理者認証用のパスワード値オブジェクト
//!
//! ## 使用例
//!
//! ```rust
//! use tipster_domain::{DomainError, prediction::PredictionId};
//!
//! let id = PredictionId::parse("42").unwrap();
//! assert_eq!(id.as_i64(), 42);
//!
//! let error = PredictionId::parse("0").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

pub mod campaign;
pub mod clock;
pub mod error;
pub mod league;
pub mod password;
pub mod prediction;
pub mod subscriber;

pub use error::DomainError;
