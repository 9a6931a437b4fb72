//! # Observability 基盤
//!
//! `tracing` の subscriber を組み立てる。
//!
//! | 環境変数 | 説明 |
//! |---------|------|
//! | `LOG_FORMAT` | `json`（本番）または `pretty`（開発、デフォルト） |
//! | `RUST_LOG` | フィルタ。未設定なら [`DEFAULT_FILTER`] |
//!
//! JSON 出力ではイベントのフィールドをトップレベルに展開するため、
//! `reconciliation_required = true` や `event.kind = "business_event"` でそのまま検索できる。

#[cfg(any(test, feature = "test-utils"))]
pub mod capture;
#[cfg(any(test, feature = "observability"))]
pub mod canonical_log;

use std::str::FromStr;

use thiserror::Error;

/// `RUST_LOG` 未設定時のフィルタ
///
/// 自クレートはデバッグまで、sqlx のクエリログは警告以上に絞る。
pub const DEFAULT_FILTER: &str =
    "info,tipster_web=debug,tipster_infra=debug,tipster_domain=debug,sqlx=warn";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("LOG_FORMAT={0:?} は json / pretty のいずれでもありません")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(UnknownLogFormat(s.to_string())),
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `app` スパンの `service` フィールド
    pub service_name: String,
    pub log_format:   LogFormat,
    pub filter:       String,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// `LOG_FORMAT` と `RUST_LOG` から読み取る
    ///
    /// 不正な `LOG_FORMAT` は pretty で続行する。subscriber 初期化前のため警告は stderr に出す。
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: UnknownLogFormat| {
                eprintln!("WARNING: {e}（pretty で出力します）");
                LogFormat::Pretty
            }),
            Err(_) => LogFormat::default(),
        };
        let mut config = Self::new(service_name, log_format);
        if let Ok(filter) = std::env::var("RUST_LOG") {
            config.filter = filter;
        }
        config
    }
}

/// グローバル subscriber を登録する
///
/// 登録する Layer:
///
/// - `EnvFilter`（[`TracingConfig::filter`]、解釈できなければ [`DEFAULT_FILTER`]）
/// - fmt（JSON または pretty）
/// - `ErrorLayer`（`InfraError` の `SpanTrace` にスパン情報を残す）
///
/// 2 回目の呼び出しはエラーを返す。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|e| {
        eprintln!("WARNING: RUST_LOG を解釈できません: {e}");
        EnvFilter::new(DEFAULT_FILTER)
    });

    let fmt = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .with(tracing_error::ErrorLayer::default())
        .try_init()
}
