//! # キャンペーンユースケース
//!
//! 予想記事のメールキャンペーン配信を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール本文生成
//! - [`dispatcher`] - 取得 → レンダリング → 作成 → 送信 → 記録の配信フロー
//! - `claim` - 同一予想記事の同時配信を防ぐプロセス内クレーム

mod claim;
pub mod dispatcher;
pub mod template_renderer;

pub use dispatcher::{CampaignDispatcher, DispatchError, DispatchFailure, DispatchReport};
pub use template_renderer::{ContentRenderer, TemplateRenderer};
