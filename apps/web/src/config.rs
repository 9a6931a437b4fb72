//! # Web サーバー設定
//!
//! 環境変数から Web サーバーの設定を読み込む。
//!
//! 必須の環境変数が未設定、または値が不正な場合は [`ConfigError`] を返す。
//! 起動時にまとめて検証し、リクエスト処理中に設定起因のエラーが起きないようにする。

use std::{collections::HashMap, env, time::Duration};

use chrono::FixedOffset;
use thiserror::Error;
use tipster_domain::{
    campaign::{CampaignSettings, ListId, SenderIdentity},
    password::{AdminAccount, PasswordHash},
};

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} の値が不正です: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// メールプロバイダの設定
///
/// `EMAIL_PROVIDER` 環境変数で切り替える:
/// - `brevo`: Brevo v3 REST API 経由で送信（本番）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailProviderConfig {
    Noop,
    Brevo { api_key: String, base_url: String },
}

/// Web サーバーの設定
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// バインドアドレス
    pub host:             String,
    /// ポート番号
    pub port:             u16,
    /// データベース接続 URL
    pub database_url:     String,
    /// 公開 URL（メール内リンク用）
    pub base_url:         String,
    /// 管理画面の Basic 認証アカウント
    pub admin:            AdminAccount,
    pub email_provider:   EmailProviderConfig,
    /// キャンペーンの送信者・件名・宛先リスト
    pub campaign:         CampaignSettings,
    /// ストア呼び出し 1 回あたりのタイムアウト
    pub store_timeout:    Duration,
    /// プロバイダ呼び出し 1 回あたりのタイムアウト
    pub provider_timeout: Duration,
    /// フォームの日時入力を解釈するサイト固定の UTC オフセット
    pub site_offset:      FixedOffset,
}

impl WebConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の値の取得関数から設定を読み込む
    ///
    /// テストではプロセスの環境変数を汚さないよう `HashMap` を渡す。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let email_provider = match vars.or("EMAIL_PROVIDER", "noop").as_str() {
            "noop" => EmailProviderConfig::Noop,
            "brevo" => EmailProviderConfig::Brevo {
                api_key:  vars.required("BREVO_API_KEY")?,
                base_url: vars.or("BREVO_BASE_URL", "https://api.brevo.com/v3"),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name:   "EMAIL_PROVIDER",
                    reason: format!("brevo または noop を指定してください: {other:?}"),
                });
            }
        };

        let offset_hours: i32 = vars.parsed("SITE_UTC_OFFSET_HOURS", 3)?;
        let site_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                name:   "SITE_UTC_OFFSET_HOURS",
                reason: format!("範囲外のオフセットです: {offset_hours}"),
            })?;

        Ok(Self {
            host: vars.or("WEB_HOST", "0.0.0.0"),
            port: vars.parsed("WEB_PORT", 4444)?,
            database_url: vars.required("DATABASE_URL")?,
            base_url: vars.or("BASE_URL", "http://localhost:4444"),
            admin: AdminAccount {
                username:      vars.or("BASIC_AUTH_USERNAME", "admin"),
                password_hash: PasswordHash::new(vars.required("BASIC_AUTH_PASSWORD_HASH")?),
            },
            email_provider,
            campaign: CampaignSettings {
                sender:  SenderIdentity {
                    name:  vars.or("CAMPAIGN_SENDER_NAME", "Sport Predict"),
                    email: vars.or(
                        "CAMPAIGN_SENDER_EMAIL",
                        "newsletter@sportpredict.example.com",
                    ),
                },
                subject: vars.or("CAMPAIGN_SUBJECT", "New Prediction Just Now!"),
                list_id: ListId::new(vars.parsed("CAMPAIGN_LIST_ID", 9)?),
            },
            store_timeout: Duration::from_secs(vars.parsed("STORE_TIMEOUT_SECS", 3)?),
            provider_timeout: Duration::from_secs(vars.parsed("PROVIDER_TIMEOUT_SECS", 5)?),
            site_offset,
        })
    }

    /// `HashMap` から設定を読み込む
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 空文字列は未設定として扱う
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
