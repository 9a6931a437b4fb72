//! # キャンペーン配信
//!
//! 予想記事を HTML メールとしてメーリングリストに一度だけ配信する処理の
//! ドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`CampaignDraft`] | キャンペーン作成リクエスト | 送信者・件名・本文・宛先リスト・表示名 |
//! | [`CampaignId`] | キャンペーン ID | プロバイダが採番する |
//! | [`ListId`] | リスト ID | プロバイダ上の購読者リスト |
//! | [`DispatchState`] | 配信状態 | `Idle → Fetched → Rendered → Submitted → Sent → Recorded` |
//! | [`DispatchStage`] | 配信ステージ | 失敗したステージの識別に使う |
//!
//! ## 失敗時の回復可否
//!
//! | 失敗ステージ | プロバイダ側 | 再実行 |
//! |------------|------------|-------|
//! | Fetch / Render | 呼び出しなし | 安全 |
//! | Submit | キャンペーン未作成 | 安全 |
//! | Send | キャンペーンが残る可能性あり | 可能（2 つ目のキャンペーンが作成される） |
//! | Record | 送信済み | 不可（手動で突き合わせが必要） |

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::prediction::Prediction;

/// キャンペーン本文に使用するテンプレート名
pub const PREDICTION_TEMPLATE: &str = "prediction.html";

/// プロバイダが採番したキャンペーン ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct CampaignId(i64);

impl CampaignId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// プロバイダ上の購読者リスト ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ListId(i64);

impl ListId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 送信者（表示名 + 送信元アドレス）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name:  String,
    pub email: String,
}

/// キャンペーン配信の固定設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSettings {
    pub sender:  SenderIdentity,
    pub subject: String,
    pub list_id: ListId,
}

/// キャンペーン作成リクエスト
///
/// テンプレートレンダリングの出力から組み立て、`EmailProvider` に渡される。
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignDraft {
    /// プロバイダ管理画面での表示名（一意である必要はない）
    pub name:         String,
    /// 件名
    pub subject:      String,
    /// 送信者
    pub sender:       SenderIdentity,
    /// HTML 本文
    pub html_content: String,
    /// 宛先リスト
    pub list_id:      ListId,
}

impl CampaignDraft {
    /// 予想記事とレンダリング済み本文からキャンペーン作成リクエストを組み立てる
    ///
    /// 表示名は `Prediction {タイトル} {UTC タイムスタンプ}`。
    pub fn for_prediction(
        prediction: &Prediction,
        html_content: String,
        settings: &CampaignSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: format!(
                "Prediction {} {}",
                prediction.title(),
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            subject: settings.subject.clone(),
            sender: settings.sender.clone(),
            html_content,
            list_id: settings.list_id,
        }
    }
}

/// 配信ステージ
///
/// 失敗時に「どこで止まったか」を表す。ログの `campaign.stage` に snake_case で出力する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    /// 予想記事の取得
    Fetch,
    /// 本文のレンダリング
    Render,
    /// プロバイダへのキャンペーン作成
    Submit,
    /// プロバイダへの即時送信指示
    Send,
    /// 配信済みフラグの永続化
    Record,
}

impl DispatchStage {
    /// このステージで失敗した場合に再実行しても安全か
    ///
    /// Record で失敗した場合はメールが送信済みのため、再実行すると二重送信になる。
    pub fn is_retry_safe(self) -> bool {
        !matches!(self, Self::Record)
    }
}

/// 配信状態
///
/// 各ステージの完了で次の状態に進む。失敗は「現在の状態で待機中のステージ」の失敗として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Fetched,
    Rendered,
    Submitted,
    Sent,
    Recorded,
}

impl DispatchState {
    /// 現在の状態で次に実行されるステージ
    ///
    /// `Recorded` は終端状態のため `None`。
    pub fn pending_stage(self) -> Option<DispatchStage> {
        match self {
            Self::Idle => Some(DispatchStage::Fetch),
            Self::Fetched => Some(DispatchStage::Render),
            Self::Rendered => Some(DispatchStage::Submit),
            Self::Submitted => Some(DispatchStage::Send),
            Self::Sent => Some(DispatchStage::Record),
            Self::Recorded => None,
        }
    }

    /// 待機中のステージが完了した後の状態
    pub fn advance(self) -> Self {
        match self {
            Self::Idle => Self::Fetched,
            Self::Fetched => Self::Rendered,
            Self::Rendered => Self::Submitted,
            Self::Submitted => Self::Sent,
            Self::Sent | Self::Recorded => Self::Recorded,
        }
    }
}

/// テンプレートレンダリングエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// テンプレートセットに存在しない名前が指定された
    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(String),

    /// 値の埋め込みに失敗した
    #[error("テンプレートレンダリングに失敗: {0}")]
    RenderFailed(String),
}

/// メールプロバイダ呼び出しエラー
///
/// 上流のエラー内容はオペレーターの調査用にそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// プロバイダがリクエストを拒否した（4xx / 5xx）
    #[error("プロバイダがリクエストを拒否しました（{status}）: {code}: {message}")]
    Rejected {
        status:  u16,
        code:    String,
        message: String,
    },

    /// 通信エラー
    #[error("プロバイダとの通信に失敗: {0}")]
    Network(String),

    /// タイムアウト
    #[error("プロバイダ呼び出しがタイムアウトしました: {0}")]
    Timeout(String),

    /// 想定外のレスポンス
    #[error("プロバイダから想定外のレスポンス: {0}")]
    UnexpectedResponse(String),
}
