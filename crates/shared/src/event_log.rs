//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で調査しやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`campaign.stage`）を使用する。JSON 出力ではフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、`tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: [`event::entity_type`] の定数
/// - `event.entity_id`: エンティティ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const CAMPAIGN: &str = "campaign";
        pub const SUBSCRIPTION: &str = "subscription";
        pub const PREDICTION: &str = "prediction";
        pub const LEAGUE: &str = "league";
        pub const AUTH: &str = "auth";
    }

    /// イベントアクション
    pub mod action {
        // キャンペーン配信
        pub const CAMPAIGN_DISPATCHED: &str = "campaign.dispatched";
        pub const CAMPAIGN_FAILED: &str = "campaign.failed";

        // 購読
        pub const SUBSCRIPTION_CREATED: &str = "subscription.created";
        pub const SUBSCRIPTION_FAILED: &str = "subscription.failed";

        // 予想記事
        pub const PREDICTION_CREATED: &str = "prediction.created";
        pub const PREDICTION_UPDATED: &str = "prediction.updated";
        pub const PREDICTION_DELETED: &str = "prediction.deleted";

        // リーグ
        pub const LEAGUE_CREATED: &str = "league.created";
        pub const LEAGUE_UPDATED: &str = "league.updated";
        pub const LEAGUE_DELETED: &str = "league.deleted";

        // 管理画面認証
        pub const BASIC_AUTH_FAILURE: &str = "auth.basic_failure";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const PREDICTION: &str = "prediction";
        pub const LEAGUE: &str = "league";
        pub const CAMPAIGN: &str = "campaign";
        pub const SUBSCRIBER: &str = "subscriber";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メールプロバイダ）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const EMAIL_PROVIDER: &str = "email_provider";
        pub const TEMPLATE: &str = "template";
        /// 送信済みキャンペーンの記録失敗（手動での突き合わせが必要）
        pub const CAMPAIGN_RECORD: &str = "campaign_record";
        pub const PASSWORD_VERIFICATION: &str = "password_verification";
        pub const INTERNAL: &str = "internal";
    }
}
