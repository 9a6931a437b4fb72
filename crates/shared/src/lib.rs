//! # Tipster 共有ユーティリティ
//!
//! このクレートは、Tipster の各クレートで使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / web のすべてから依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存は持たない（`IntoResponse` 変換は web の責務）

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
