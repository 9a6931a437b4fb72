//! # 購読ユースケース
//!
//! メールアドレスを検証し、プロバイダのメーリングリストに登録する。
//! 登録済みのアドレスは上書き登録（`updateEnabled = true`）となり、再購読も成功する。

use std::sync::Arc;

use thiserror::Error;
use tipster_domain::{
    campaign::{ListId, ProviderError},
    subscriber::SubscriberEmail,
};
use tipster_infra::email_provider::EmailProvider;
use tipster_shared::{event_log::event, log_business_event};

/// 購読エラー
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// 入力値の検証失敗（プロバイダは呼ばない）
    #[error("{field} が不正です: {reason}")]
    ValidationFailed { field: &'static str, reason: String },

    /// プロバイダ呼び出しの失敗（リトライしない）
    #[error(transparent)]
    ProviderFailed(#[from] ProviderError),
}

/// 購読ユースケース
pub struct SubscriptionUseCaseImpl {
    provider: Arc<dyn EmailProvider>,
    list_id:  ListId,
}

impl SubscriptionUseCaseImpl {
    pub fn new(provider: Arc<dyn EmailProvider>, list_id: ListId) -> Self {
        Self { provider, list_id }
    }

    /// メールアドレスを購読者リストに登録する
    #[tracing::instrument(skip_all, level = "debug")]
    pub async fn subscribe(&self, raw_email: &str) -> Result<SubscriberEmail, SubscribeError> {
        let email =
            SubscriberEmail::new(raw_email).map_err(|e| SubscribeError::ValidationFailed {
                field:  "email",
                reason: e.to_string(),
            })?;

        if let Err(e) = self.provider.upsert_contact(&email, self.list_id).await {
            log_business_event!(
                event.category = event::category::SUBSCRIPTION,
                event.action = event::action::SUBSCRIPTION_FAILED,
                event.entity_type = event::entity_type::SUBSCRIBER,
                event.result = event::result::FAILURE,
                subscription.list_id = %self.list_id,
                error = %e,
                "購読登録失敗"
            );
            return Err(e.into());
        }

        log_business_event!(
            event.category = event::category::SUBSCRIPTION,
            event.action = event::action::SUBSCRIPTION_CREATED,
            event.entity_type = event::entity_type::SUBSCRIBER,
            event.result = event::result::SUCCESS,
            subscription.list_id = %self.list_id,
            "購読登録成功"
        );

        Ok(email)
    }
}
