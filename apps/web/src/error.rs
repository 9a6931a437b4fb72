//! # Web エラー定義
//!
//! ハンドラから返すエラーと、HTTP レスポンス（RFC 9457 Problem Details）への変換を定義する。
//!
//! ## 設計方針
//!
//! - ユースケース固有のエラー（`DispatchError`, `SubscribeError`）は `From` で [`WebError`] に集約する
//! - 5xx の detail は固定文言とし、内部情報はログにのみ出力する
//! - フォームのフィールドエラーは `errors` マップとして 422 に載せる

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tipster_domain::{DomainError, campaign::DispatchStage};
use tipster_infra::{InfraError, InfraErrorKind};
use tipster_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};

use crate::usecase::{
    FieldErrors,
    campaign::{DispatchError, DispatchFailure},
    subscription::SubscribeError,
};

/// Web サーバーで発生するエラー
#[derive(Debug, Error)]
pub enum WebError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// フォーム入力の検証失敗
    #[error("入力内容に誤りがあります: {}", .0.summary())]
    Validation(FieldErrors),

    /// 競合（スラッグ重複、配信済み、配信中）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 上流サービス（メールプロバイダ）の失敗
    #[error("上流サービスのエラー: {0}")]
    BadGateway(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

/// 422 レスポンス（Problem Details + フィールドエラー）
#[derive(Debug, Serialize)]
struct ValidationErrorResponse {
    #[serde(flatten)]
    problem: ErrorResponse,
    errors:  FieldErrors,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let problem = match self {
            WebError::NotFound(msg) => ErrorResponse::not_found(msg),
            WebError::BadRequest(msg) => ErrorResponse::bad_request(msg),
            WebError::Validation(errors) => {
                let body = ValidationErrorResponse {
                    problem: ErrorResponse::validation_error(errors.summary()),
                    errors,
                };
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            WebError::Conflict(msg) => ErrorResponse::conflict(msg),
            WebError::BadGateway(msg) => ErrorResponse::bad_gateway(msg),
            WebError::Database(e) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            WebError::Internal(msg) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(problem)).into_response()
    }
}

impl From<InfraError> for WebError {
    fn from(e: InfraError) -> Self {
        if let Some((entity, id)) = e.as_conflict() {
            return WebError::Conflict(format!("{entity} が既に存在します: {id}"));
        }
        if let InfraErrorKind::InvalidInput(msg) = e.kind() {
            return WebError::BadRequest(msg.clone());
        }
        WebError::Database(e)
    }
}

impl From<DomainError> for WebError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => WebError::BadRequest(msg),
            DomainError::NotFound { .. } => WebError::NotFound(e.to_string()),
            DomainError::Conflict(msg) => WebError::Conflict(msg),
        }
    }
}

impl From<FieldErrors> for WebError {
    fn from(errors: FieldErrors) -> Self {
        WebError::Validation(errors)
    }
}

impl From<DispatchError> for WebError {
    fn from(e: DispatchError) -> Self {
        match e {
            // 不正な ID は「存在しない予想記事」と同じ応答にする
            DispatchError::InvalidInput(msg) => WebError::NotFound(msg),
            DispatchError::NotFound(_) => WebError::NotFound(e.to_string()),
            DispatchError::AlreadyCampaigned(_) | DispatchError::InProgress(_) => {
                WebError::Conflict(e.to_string())
            }
            DispatchError::Failed { stage, cause } => match (stage, cause) {
                (DispatchStage::Submit | DispatchStage::Send, DispatchFailure::Provider(p)) => {
                    WebError::BadGateway(p.to_string())
                }
                (stage, cause) => WebError::Internal(format!("{stage} ステージで失敗: {cause}")),
            },
        }
    }
}

impl From<SubscribeError> for WebError {
    fn from(e: SubscribeError) -> Self {
        match e {
            SubscribeError::ValidationFailed { field, reason } => {
                let mut errors = FieldErrors::new();
                errors.add(field, reason);
                WebError::Validation(errors)
            }
            SubscribeError::ProviderFailed(p) => WebError::BadGateway(p.to_string()),
        }
    }
}
