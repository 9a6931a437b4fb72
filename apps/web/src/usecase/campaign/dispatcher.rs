//! # キャンペーン配信ユースケース
//!
//! 予想記事を取得 → レンダリング → キャンペーン作成 → 即時送信 → 配信済み記録の順に処理する。
//!
//! ## 設計方針
//!
//! - **一度だけ配信**: 配信済みの予想記事はレンダリング・プロバイダ呼び出しの前に拒否する
//! - **配信中クレーム**: 同一 ID の配信はプロセス内で 1 つだけ進行し、2 つ目は [`DispatchError::InProgress`]
//! - **失敗ステージの明示**: 失敗は [`DispatchError::Failed`] に失敗したステージを持たせて返す
//! - **自動リトライなし**: 記録ステージの失敗は送信済みのため、オペレーターによる突き合わせを要求する
//! - **依存性注入**: ストア・レンダラー・プロバイダ・時刻はトレイトで抽象化

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tipster_domain::{
    campaign::{
        CampaignDraft,
        CampaignId,
        CampaignSettings,
        DispatchStage,
        DispatchState,
        PREDICTION_TEMPLATE,
        ProviderError,
        RenderError,
    },
    clock::Clock,
    prediction::PredictionId,
};
use tipster_infra::{InfraError, email_provider::EmailProvider, repository::PredictionRepository};
use tipster_shared::{
    event_log::{
        error::{category, kind},
        event,
    },
    log_business_event,
};

use super::{ContentRenderer, claim::InFlightClaims};

/// 配信成功の結果
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub prediction_id: PredictionId,
    pub campaign_id:   CampaignId,
    pub campaign_name: String,
    pub dispatched_at: DateTime<Utc>,
}

/// ステージ失敗の原因
#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error(transparent)]
    Store(#[from] InfraError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// キャンペーン配信エラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// ID が正の整数でない（ストアには問い合わせない）
    #[error("不正な予想記事 ID: {0}")]
    InvalidInput(String),

    #[error("予想記事が見つかりません: {0}")]
    NotFound(PredictionId),

    #[error("予想記事 {0} は既に配信済みです")]
    AlreadyCampaigned(PredictionId),

    #[error("予想記事 {0} の配信は実行中です")]
    InProgress(PredictionId),

    /// いずれかのステージで失敗した
    #[error("{stage} ステージで配信に失敗: {cause}")]
    Failed {
        stage: DispatchStage,
        cause: DispatchFailure,
    },
}

/// キャンペーン配信ユースケース
pub struct CampaignDispatcher {
    predictions: Arc<dyn PredictionRepository>,
    renderer:    Arc<dyn ContentRenderer>,
    provider:    Arc<dyn EmailProvider>,
    clock:       Arc<dyn Clock>,
    settings:    CampaignSettings,
    in_flight:   InFlightClaims,
}

impl CampaignDispatcher {
    pub fn new(
        predictions: Arc<dyn PredictionRepository>,
        renderer: Arc<dyn ContentRenderer>,
        provider: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
        settings: CampaignSettings,
    ) -> Self {
        Self {
            predictions,
            renderer,
            provider,
            clock,
            settings,
            in_flight: InFlightClaims::default(),
        }
    }

    /// 予想記事をキャンペーンとして配信する
    ///
    /// 1. ID の検証（ストアアクセス前）
    /// 2. 配信中クレームの取得
    /// 3. Fetch: 予想記事の取得、配信済みなら拒否
    /// 4. Render: `prediction.html` で本文を生成
    /// 5. Submit: プロバイダにキャンペーンを作成
    /// 6. Send: 作成したキャンペーンを即時送信
    /// 7. Record: 未配信を条件に `campaigned = true` を永続化（0 行ならストアの競合として失敗）
    ///
    /// 成功時は作成・送信がそれぞれ 1 回だけ呼ばれ、配信済みフラグが true になっている。
    #[tracing::instrument(skip_all, level = "debug", fields(prediction.id = raw_id))]
    pub async fn dispatch(&self, raw_id: &str) -> Result<DispatchReport, DispatchError> {
        let id = PredictionId::parse(raw_id)
            .map_err(|e| DispatchError::InvalidInput(e.to_string()))?;

        let _claim = self
            .in_flight
            .try_claim(id)
            .ok_or(DispatchError::InProgress(id))?;

        let mut state = DispatchState::Idle;

        // Fetch
        let prediction = self
            .predictions
            .find_by_id(id)
            .await
            .map_err(|e| self.failed(id, state, e.into()))?
            .ok_or(DispatchError::NotFound(id))?;
        if prediction.is_campaigned() {
            return Err(DispatchError::AlreadyCampaigned(id));
        }
        state = state.advance();

        // Render
        let html_content = self
            .renderer
            .render(PREDICTION_TEMPLATE, &prediction)
            .and_then(|bytes| {
                String::from_utf8(bytes).map_err(|e| RenderError::RenderFailed(e.to_string()))
            })
            .map_err(|e| self.failed(id, state, e.into()))?;
        let now = self.clock.now();
        let draft = CampaignDraft::for_prediction(&prediction, html_content, &self.settings, now);
        state = state.advance();

        // Submit
        let campaign_id = self
            .provider
            .create_campaign(&draft)
            .await
            .map_err(|e| self.failed(id, state, e.into()))?;
        tracing::debug!(campaign.id = %campaign_id, "キャンペーンを作成");
        state = state.advance();

        // Send
        self.provider
            .send_campaign_now(campaign_id)
            .await
            .map_err(|e| self.failed(id, state, e.into()))?;
        state = state.advance();

        // Record
        let recorded = match self.predictions.mark_campaigned(id, self.clock.now()).await {
            Ok(true) => Ok(()),
            // 送信中に別経路で配信済みになった、または行が削除された
            Ok(false) => Err(InfraError::conflict("Prediction", id.to_string())),
            Err(e) => Err(e),
        };
        if let Err(e) = recorded {
            tracing::error!(
                error.category = category::INFRASTRUCTURE,
                error.kind = kind::CAMPAIGN_RECORD,
                reconciliation_required = true,
                prediction.id = %id,
                campaign.id = %campaign_id,
                error = %e,
                "キャンペーンは送信済みだが配信済みフラグの記録に失敗"
            );
            return Err(self.failed(id, state, e.into()));
        }
        state = state.advance();
        debug_assert_eq!(state, DispatchState::Recorded);

        log_business_event!(
            event.category = event::category::CAMPAIGN,
            event.action = event::action::CAMPAIGN_DISPATCHED,
            event.entity_type = event::entity_type::PREDICTION,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            campaign.id = %campaign_id,
            campaign.list_id = %draft.list_id,
            "キャンペーン配信成功"
        );

        Ok(DispatchReport {
            prediction_id: id,
            campaign_id,
            campaign_name: draft.name,
            dispatched_at: now,
        })
    }

    /// 現在の状態で待機中のステージの失敗としてエラーを組み立て、ログに残す
    fn failed(&self, id: PredictionId, state: DispatchState, cause: DispatchFailure) -> DispatchError {
        let stage = state.pending_stage().unwrap_or(DispatchStage::Record);
        let stage_name: &str = stage.into();

        log_business_event!(
            event.category = event::category::CAMPAIGN,
            event.action = event::action::CAMPAIGN_FAILED,
            event.entity_type = event::entity_type::PREDICTION,
            event.entity_id = %id,
            event.result = event::result::FAILURE,
            campaign.stage = stage_name,
            campaign.retry_safe = stage.is_retry_safe(),
            error = %cause,
            "キャンペーン配信失敗"
        );

        DispatchError::Failed { stage, cause }
    }
}
