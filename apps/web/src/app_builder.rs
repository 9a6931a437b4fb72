//! # アプリケーション構築
//!
//! DI（ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! ## ルート構成
//!
//! | グループ | 認証 | パス |
//! |----------|------|------|
//! | ヘルスチェック | なし | `/health`, `/health/ready` |
//! | 公開 API | なし | `/api/predictions/*`, `/subscribe` |
//! | 管理 | Basic 認証 | `/admin`, `/admin/predictions/*`, `/admin/leagues/*` |

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tipster_domain::clock::Clock;
use tipster_infra::{
    PasswordChecker,
    email_provider::EmailProvider,
    repository::{LeagueRepository, PredictionRepository},
};
use tipster_shared::observability::canonical_log::CanonicalLogLineLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    config::WebConfig,
    handler::{
        CampaignState,
        LeagueState,
        PredictionState,
        ReadinessState,
        SubscriptionState,
        admin_get_prediction,
        admin_list_predictions,
        create_prediction,
        delete_league,
        delete_prediction,
        get_league,
        get_prediction_by_slug,
        health_check,
        list_featured_predictions,
        list_leagues,
        list_predictions,
        readiness_check,
        save_league,
        send_campaign,
        subscribe,
        update_prediction,
    },
    middleware::{BasicAuthState, require_basic_auth},
    usecase::{
        CampaignDispatcher,
        ContentRenderer,
        LeagueUseCaseImpl,
        PredictionUseCaseImpl,
        SubscriptionUseCaseImpl,
    },
};

/// インフラ初期化済みの依存
///
/// 本番では Postgres / Brevo 実装、テストではモックを渡す。
pub struct AppComponents {
    pub predictions:      Arc<dyn PredictionRepository>,
    pub leagues:          Arc<dyn LeagueRepository>,
    pub email_provider:   Arc<dyn EmailProvider>,
    pub renderer:         Arc<dyn ContentRenderer>,
    pub password_checker: Arc<dyn PasswordChecker>,
    pub clock:            Arc<dyn Clock>,
    pub readiness:        Arc<ReadinessState>,
}

/// ユースケース → State → Router の順に組み立てる
pub fn build_app(config: &WebConfig, components: AppComponents) -> Router {
    let AppComponents {
        predictions,
        leagues,
        email_provider,
        renderer,
        password_checker,
        clock,
        readiness,
    } = components;

    let prediction_state = Arc::new(PredictionState {
        usecase: PredictionUseCaseImpl::new(
            predictions.clone(),
            leagues.clone(),
            clock.clone(),
            config.site_offset,
        ),
    });

    let league_state = Arc::new(LeagueState {
        usecase: LeagueUseCaseImpl::new(leagues, clock.clone()),
    });

    let campaign_state = Arc::new(CampaignState {
        dispatcher: CampaignDispatcher::new(
            predictions,
            renderer,
            email_provider.clone(),
            clock,
            config.campaign.clone(),
        ),
    });

    let subscription_state = Arc::new(SubscriptionState {
        usecase: SubscriptionUseCaseImpl::new(email_provider, config.campaign.list_id),
    });

    let basic_auth = BasicAuthState {
        account: config.admin.clone(),
        checker: password_checker,
    };

    // 管理ルート（Basic 認証）
    let admin = Router::new()
        .route("/admin", get(admin_list_predictions))
        .route(
            "/admin/predictions",
            get(admin_list_predictions).post(create_prediction),
        )
        .route(
            "/admin/predictions/{id}",
            get(admin_get_prediction)
                .post(update_prediction)
                .delete(delete_prediction),
        )
        .with_state(prediction_state.clone())
        .merge(
            Router::new()
                .route("/admin/predictions/{id}/campaign", post(send_campaign))
                .with_state(campaign_state),
        )
        .merge(
            Router::new()
                .route("/admin/leagues", get(list_leagues).post(save_league))
                .route("/admin/leagues/{id}", get(get_league).delete(delete_league))
                .with_state(league_state),
        )
        .layer(from_fn_with_state(basic_auth, require_basic_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness),
        )
        .merge(
            Router::new()
                .route("/api/predictions", get(list_predictions))
                .route("/api/predictions/featured", get(list_featured_predictions))
                .route("/api/predictions/{slug}", get(get_prediction_by_slug))
                .with_state(prediction_state),
        )
        .merge(
            Router::new()
                .route("/subscribe", post(subscribe))
                .with_state(subscription_state),
        )
        .merge(admin)
        // レイヤー順序: 下に書いたものが外側
        // CatchPanicLayer は最内（パニック由来の 500 にもヘッダーを付与する）
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("deny"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http())
}
