//! # ユースケース層
//!
//! ハンドラから呼び出されるアプリケーションロジックを提供する。
//!
//! - [`campaign`] - 予想記事のメールキャンペーン配信
//! - [`subscription`] - メーリングリストへの購読登録
//! - [`prediction`] - 予想記事の公開一覧・管理
//! - [`league`] - リーグ管理

pub mod campaign;
pub mod form;
pub mod league;
pub mod prediction;
pub mod subscription;

pub use campaign::{CampaignDispatcher, ContentRenderer, TemplateRenderer};
pub use form::FieldErrors;
pub use league::{LeagueForm, LeagueUseCaseImpl};
pub use prediction::{PredictionForm, PredictionUseCaseImpl};
pub use subscription::{SubscribeError, SubscriptionUseCaseImpl};
