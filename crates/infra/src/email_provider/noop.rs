//! Noop メールプロバイダ実装
//!
//! 外部 API を呼び出さず、ログ出力のみ行う。ローカル開発で使用する。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tipster_domain::{
    campaign::{CampaignDraft, CampaignId, ListId, ProviderError},
    subscriber::SubscriberEmail,
};

use super::EmailProvider;

/// Noop メールプロバイダ（ログ出力のみ）
///
/// キャンペーン ID はプロセス内で 1 から連番で採番する。
#[derive(Debug, Default)]
pub struct NoopEmailProvider {
    last_id: AtomicI64,
}

impl NoopEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailProvider for NoopEmailProvider {
    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, ProviderError> {
        let id = CampaignId::new(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::info!(
            campaign.id = %id,
            campaign.name = %draft.name,
            campaign.list_id = %draft.list_id,
            "Noop: キャンペーン作成をスキップ"
        );
        Ok(id)
    }

    async fn send_campaign_now(&self, campaign_id: CampaignId) -> Result<(), ProviderError> {
        tracing::info!(campaign.id = %campaign_id, "Noop: キャンペーン送信をスキップ");
        Ok(())
    }

    async fn upsert_contact(
        &self,
        email: &SubscriberEmail,
        list_id: ListId,
    ) -> Result<(), ProviderError> {
        tracing::info!(%email, %list_id, "Noop: 購読者登録をスキップ");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tipster_domain::campaign::SenderIdentity;

    use super::*;

    fn make_draft() -> CampaignDraft {
        CampaignDraft {
            name:         "Prediction Derby Day".to_string(),
            subject:      "New Prediction Just Now!".to_string(),
            sender:       SenderIdentity {
                name:  "Sport Predict".to_string(),
                email: "newsletter@sportpredict.example.com".to_string(),
            },
            html_content: "<p>Derby Day</p>".to_string(),
            list_id:      ListId::new(9),
        }
    }

    #[tokio::test]
    async fn test_create_campaignは連番のidを返す() {
        let provider = NoopEmailProvider::new();

        let first = provider.create_campaign(&make_draft()).await.unwrap();
        let second = provider.create_campaign(&make_draft()).await.unwrap();

        assert_eq!(first, CampaignId::new(1));
        assert_eq!(second, CampaignId::new(2));
    }

    #[tokio::test]
    async fn test_send_campaign_nowとupsert_contactがエラーを返さない() {
        let provider = NoopEmailProvider::new();
        let email = SubscriberEmail::new("fan@example.com").unwrap();

        assert!(provider.send_campaign_now(CampaignId::new(1)).await.is_ok());
        assert!(provider.upsert_contact(&email, ListId::new(9)).await.is_ok());
    }
}
