//! # キャンペーン配信ハンドラ
//!
//! - `POST /admin/predictions/{id}/campaign` - 予想記事をメールキャンペーンとして配信する

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tipster_shared::observability::canonical_log::CampaignOutcome;

use super::prediction::ADMIN_HOME;
use crate::{
    error::WebError,
    usecase::{CampaignDispatcher, campaign::DispatchError},
};

pub struct CampaignState {
    pub dispatcher: CampaignDispatcher,
}

/// POST /admin/predictions/{id}/campaign
///
/// ## レスポンス
///
/// - `303 See Other`: 配信完了、`/admin` へリダイレクト
/// - `404 Not Found`: ID 不正、予想記事が存在しない
/// - `409 Conflict`: 配信済み、または同じ予想記事を配信中
/// - `502 Bad Gateway`: メールプロバイダの失敗
/// - `500 Internal Server Error`: 取得・描画・記録の失敗
///
/// 配信に進んだ場合はレスポンス拡張に [`CampaignOutcome`] を載せる。
#[tracing::instrument(skip_all, fields(%id))]
pub async fn send_campaign(
    State(state): State<Arc<CampaignState>>,
    Path(id): Path<String>,
) -> Response {
    let (outcome, mut response) = match state.dispatcher.dispatch(&id).await {
        Ok(report) => (
            Some(CampaignOutcome::dispatched(report.campaign_id.as_i64())),
            Redirect::to(ADMIN_HOME).into_response(),
        ),
        Err(e) => {
            let outcome = match &e {
                DispatchError::Failed { stage, .. } => Some(CampaignOutcome::failed(
                    (*stage).into(),
                    !stage.is_retry_safe(),
                )),
                _ => None,
            };
            (outcome, WebError::from(e).into_response())
        }
    };
    if let Some(outcome) = outcome {
        response.extensions_mut().insert(outcome);
    }
    response
}
