//! # 購読ハンドラ
//!
//! - `POST /subscribe` - メールアドレスをメーリングリストに登録する

use std::sync::Arc;

use axum::{Form, extract::State};
use serde::Deserialize;

use crate::{error::WebError, usecase::SubscriptionUseCaseImpl};

/// 購読完了メッセージ（`text/plain`）
pub const SUBSCRIBED_MESSAGE: &str = "Thank you for subscribing";

pub struct SubscriptionState {
    pub usecase: SubscriptionUseCaseImpl,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeForm {
    pub email: String,
}

/// POST /subscribe
///
/// ## レスポンス
///
/// - `200 OK`: `text/plain` の完了メッセージ
/// - `422 Unprocessable Entity`: メールアドレスが不正
/// - `502 Bad Gateway`: プロバイダの失敗
#[tracing::instrument(skip_all)]
pub async fn subscribe(
    State(state): State<Arc<SubscriptionState>>,
    Form(form): Form<SubscribeForm>,
) -> Result<&'static str, WebError> {
    state.usecase.subscribe(&form.email).await?;
    Ok(SUBSCRIBED_MESSAGE)
}
