//! # メールプロバイダ
//!
//! キャンペーン作成・即時送信と購読者リスト登録を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `EmailProvider` trait でプロバイダ API を抽象化
//! - **2 つの実装**: Brevo（本番用）、Noop（開発・テスト用）
//! - **環境変数切替**: `EMAIL_PROVIDER` でランタイム選択
//! - **リトライしない**: 失敗はそのまま呼び出し元に返す

mod brevo;
mod noop;

use async_trait::async_trait;
pub use brevo::BrevoEmailProvider;
pub use noop::NoopEmailProvider;
use tipster_domain::{
    campaign::{CampaignDraft, CampaignId, ListId, ProviderError},
    subscriber::SubscriberEmail,
};

/// メールプロバイダトレイト
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// キャンペーンを作成し、プロバイダが採番した ID を返す
    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, ProviderError>;

    /// 作成済みキャンペーンを即時送信する
    async fn send_campaign_now(&self, campaign_id: CampaignId) -> Result<(), ProviderError>;

    /// 購読者をリストに登録する（既存の場合は更新）
    async fn upsert_contact(
        &self,
        email: &SubscriberEmail,
        list_id: ListId,
    ) -> Result<(), ProviderError>;
}
