//! # Tipster Web サーバー
//!
//! 予想記事の公開 API、購読受付、管理画面（Basic 認証）を提供する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `WEB_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `WEB_PORT` | No | ポート番号（デフォルト: `4444`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `BASE_URL` | No | メール内リンクの公開 URL |
//! | `BASIC_AUTH_USERNAME` | No | 管理者ユーザー名（デフォルト: `admin`） |
//! | `BASIC_AUTH_PASSWORD_HASH` | **Yes** | 管理者パスワードの Argon2id ハッシュ |
//! | `EMAIL_PROVIDER` | No | `brevo` または `noop`（デフォルト: `noop`） |
//! | `BREVO_API_KEY` | brevo 時 | Brevo API キー |
//!
//! その他は [`tipster_web::config::WebConfig`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! DATABASE_URL=postgres://... BASIC_AUTH_PASSWORD_HASH='$argon2id$...' cargo run -p tipster-web
//! ```

use std::{net::SocketAddr, sync::Arc};

use tipster_domain::clock::SystemClock;
use tipster_infra::{
    Argon2PasswordChecker,
    db,
    email_provider::{BrevoEmailProvider, EmailProvider, NoopEmailProvider},
    password::validate_hash_format,
    repository::{PostgresLeagueRepository, PostgresPredictionRepository},
};
use tipster_shared::observability::TracingConfig;
use tipster_web::{
    app_builder::{AppComponents, build_app},
    config::{EmailProviderConfig, WebConfig},
    handler::ReadinessState,
    usecase::TemplateRenderer,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("web");
    tipster_shared::observability::init_tracing(&tracing_config)?;
    let _tracing_guard =
        tracing::info_span!("app", service = %tracing_config.service_name).entered();

    let config = WebConfig::from_env()?;

    tracing::info!("Web サーバーを起動します: {}:{}", config.host, config.port);

    // 不正なハッシュでは起動しない
    validate_hash_format(&config.admin.password_hash)?;

    // 接続は最初のクエリまで遅延する
    let pool = db::create_pool(&config.database_url, config.store_timeout)?;

    let email_provider: Arc<dyn EmailProvider> = match &config.email_provider {
        EmailProviderConfig::Brevo { api_key, base_url } => {
            tracing::info!("メールプロバイダ: Brevo ({base_url})");
            Arc::new(BrevoEmailProvider::new(
                base_url,
                api_key.clone(),
                config.provider_timeout,
            )?)
        }
        EmailProviderConfig::Noop => {
            tracing::warn!("メールプロバイダ: Noop（メールは送信されません）");
            Arc::new(NoopEmailProvider::new())
        }
    };

    let components = AppComponents {
        predictions: Arc::new(PostgresPredictionRepository::new(
            pool.clone(),
            config.store_timeout,
        )),
        leagues: Arc::new(PostgresLeagueRepository::new(
            pool.clone(),
            config.store_timeout,
        )),
        email_provider,
        renderer: Arc::new(TemplateRenderer::new(&config.base_url)?),
        password_checker: Arc::new(Argon2PasswordChecker::new()),
        clock: Arc::new(SystemClock),
        readiness: Arc::new(ReadinessState {
            pool,
            timeout: config.store_timeout,
        }),
    };

    let app = build_app(&config, components);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Web サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
