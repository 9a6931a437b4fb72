//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod campaign;
pub mod health;
pub mod league;
pub mod prediction;
pub mod subscription;

pub use campaign::{CampaignState, send_campaign};
pub use health::{ReadinessState, health_check, readiness_check};
pub use league::{LeagueState, delete_league, get_league, list_leagues, save_league};
pub use prediction::{
    PredictionState,
    admin_get_prediction,
    admin_list_predictions,
    create_prediction,
    delete_prediction,
    get_prediction_by_slug,
    list_featured_predictions,
    list_predictions,
    update_prediction,
};
pub use subscription::{SubscriptionState, subscribe};
