//! # 予想記事ハンドラ
//!
//! ## 公開エンドポイント
//!
//! - `GET /api/predictions` - 今日以降の予想記事一覧（リーグ見出しフラグ付き）
//! - `GET /api/predictions/featured` - 注目の予想記事
//! - `GET /api/predictions/{slug}` - スラッグ指定で 1 件取得
//!
//! ## 管理エンドポイント（Basic 認証）
//!
//! - `GET /admin`, `GET /admin/predictions` - アーカイブを含む一覧
//! - `POST /admin/predictions` - 作成（303 → `/admin`）
//! - `GET /admin/predictions/{id}` - 編集用に 1 件取得
//! - `POST /admin/predictions/{id}` - 更新（303 → `/admin`）
//! - `DELETE /admin/predictions/{id}` - 削除（303 → `/admin`）

use std::sync::Arc;

use axum::{
    Form,
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tipster_domain::prediction::Prediction;
use tipster_shared::ApiResponse;

use crate::{
    error::WebError,
    usecase::{
        PredictionForm,
        PredictionUseCaseImpl,
        prediction::ListingEntry,
    },
};

/// 管理画面トップ
pub const ADMIN_HOME: &str = "/admin";

/// 予想記事ハンドラの共有状態
pub struct PredictionState {
    pub usecase: PredictionUseCaseImpl,
}

// --- レスポンス型 ---

/// 予想記事 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionDto {
    pub id:              i64,
    pub slug:            String,
    pub title:           String,
    pub body:            String,
    pub keywords:        String,
    pub odds:            f64,
    pub prediction_type: String,
    pub scheduled_at:    String,
    pub is_featured:     bool,
    pub is_archived:     bool,
    pub campaigned:      bool,
    pub league_id:       Option<i64>,
    pub league_title:    Option<String>,
    pub path:            String,
}

impl From<&Prediction> for PredictionDto {
    fn from(p: &Prediction) -> Self {
        Self {
            id:              p.id().as_i64(),
            slug:            p.slug().to_string(),
            title:           p.title().to_string(),
            body:            p.body().to_string(),
            keywords:        p.keywords().to_string(),
            odds:            p.odds(),
            prediction_type: p.prediction_type().to_string(),
            scheduled_at:    p.scheduled_at().to_rfc3339(),
            is_featured:     p.is_featured(),
            is_archived:     p.is_archived(),
            campaigned:      p.is_campaigned(),
            league_id:       p.league_id().map(|id| id.as_i64()),
            league_title:    p.league_title().map(str::to_string),
            path:            p.public_path(),
        }
    }
}

/// 公開一覧の要素
///
/// `starts_league_block` はリーグ見出しを描画する位置を示す。
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionListItem {
    #[serde(flatten)]
    pub prediction:          PredictionDto,
    pub starts_league_block: bool,
}

impl From<&ListingEntry> for PredictionListItem {
    fn from(entry: &ListingEntry) -> Self {
        Self {
            prediction:          PredictionDto::from(&entry.prediction),
            starts_league_block: entry.starts_league_block,
        }
    }
}

fn to_dtos(predictions: &[Prediction]) -> Vec<PredictionDto> {
    predictions.iter().map(PredictionDto::from).collect()
}

// --- 公開ハンドラ ---

/// GET /api/predictions
#[tracing::instrument(skip_all)]
pub async fn list_predictions(
    State(state): State<Arc<PredictionState>>,
) -> Result<impl IntoResponse, WebError> {
    let entries = state.usecase.list_public().await?;
    let items: Vec<PredictionListItem> = entries.iter().map(PredictionListItem::from).collect();

    Ok(Json(ApiResponse::new(items)))
}

/// GET /api/predictions/featured
#[tracing::instrument(skip_all)]
pub async fn list_featured_predictions(
    State(state): State<Arc<PredictionState>>,
) -> Result<impl IntoResponse, WebError> {
    let predictions = state.usecase.list_featured().await?;

    Ok(Json(ApiResponse::new(to_dtos(&predictions))))
}

/// GET /api/predictions/{slug}
#[tracing::instrument(skip_all, fields(%slug))]
pub async fn get_prediction_by_slug(
    State(state): State<Arc<PredictionState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, WebError> {
    let prediction = state.usecase.get_by_slug(&slug).await?;

    Ok(Json(ApiResponse::new(PredictionDto::from(&prediction))))
}

// --- 管理ハンドラ ---

/// GET /admin, GET /admin/predictions
#[tracing::instrument(skip_all)]
pub async fn admin_list_predictions(
    State(state): State<Arc<PredictionState>>,
) -> Result<impl IntoResponse, WebError> {
    let predictions = state.usecase.list_admin().await?;

    Ok(Json(ApiResponse::new(to_dtos(&predictions))))
}

/// GET /admin/predictions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn admin_get_prediction(
    State(state): State<Arc<PredictionState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WebError> {
    let prediction = state.usecase.get(&id).await?;

    Ok(Json(ApiResponse::new(PredictionDto::from(&prediction))))
}

/// POST /admin/predictions
///
/// ## レスポンス
///
/// - `303 See Other`: `/admin` へリダイレクト
/// - `409 Conflict`: スラッグ重複
/// - `422 Unprocessable Entity`: フィールドエラー
#[tracing::instrument(skip_all)]
pub async fn create_prediction(
    State(state): State<Arc<PredictionState>>,
    Form(form): Form<PredictionForm>,
) -> Result<Redirect, WebError> {
    state.usecase.create(&form).await?;
    Ok(Redirect::to(ADMIN_HOME))
}

/// POST /admin/predictions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn update_prediction(
    State(state): State<Arc<PredictionState>>,
    Path(id): Path<String>,
    Form(form): Form<PredictionForm>,
) -> Result<Redirect, WebError> {
    state.usecase.update(&id, &form).await?;
    Ok(Redirect::to(ADMIN_HOME))
}

/// DELETE /admin/predictions/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_prediction(
    State(state): State<Arc<PredictionState>>,
    Path(id): Path<String>,
) -> Result<Redirect, WebError> {
    state.usecase.delete(&id).await?;
    Ok(Redirect::to(ADMIN_HOME))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        routing::get,
    };
    use chrono::{FixedOffset, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tipster_domain::{
        clock::FixedClock,
        league::{League, LeagueId},
    };
    use tipster_infra::mock::{MockLeagueRepository, MockPredictionRepository};
    use tower::ServiceExt;

    use super::*;

    struct Fixture {
        state:   Arc<PredictionState>,
        leagues: MockLeagueRepository,
    }

    fn fixture() -> Fixture {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap();
        let usecase = PredictionUseCaseImpl::new(
            Arc::new(predictions),
            Arc::new(leagues.clone()),
            Arc::new(FixedClock::new(now)),
            FixedOffset::east_opt(3 * 3600).unwrap(),
        );
        Fixture {
            state: Arc::new(PredictionState { usecase }),
            leagues,
        }
    }

    fn create_test_app(state: Arc<PredictionState>) -> Router {
        Router::new()
            .route("/api/predictions", get(list_predictions))
            .route("/api/predictions/featured", get(list_featured_predictions))
            .route("/api/predictions/{slug}", get(get_prediction_by_slug))
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
            .with_state(state)
    }

    fn form(title: &str, scheduled_at: &str) -> PredictionForm {
        PredictionForm {
            title: title.to_string(),
            body: "Home win".to_string(),
            scheduled_at: scheduled_at.to_string(),
            odds: "2.5".to_string(),
            prediction_type: "1X2".to_string(),
            ..Default::default()
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_作成すると303で管理画面へ戻り公開一覧に出る() {
        let fx = fixture();
        let app = create_test_app(fx.state.clone());

        let response = app
            .clone()
            .oneshot(post_form(
                "/admin/predictions",
                "title=Derby+Day&body=Home+win&scheduled_at=2026-05-02T18%3A00&odds=2.5&prediction_type=1X2",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/admin");

        let response = app.oneshot(get_request("/api/predictions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["slug"], "derby-day-1x2-2026-05-02");
        assert_eq!(items[0]["path"], "/prediction/derby-day-1x2-2026-05-02");
        assert_eq!(items[0]["starts_league_block"], true);
        assert_eq!(items[0]["campaigned"], false);
    }

    #[tokio::test]
    async fn test_フィールドエラーは422でerrorsを返す() {
        let fx = fixture();
        let app = create_test_app(fx.state);

        let response = app
            .oneshot(post_form(
                "/admin/predictions",
                "title=&scheduled_at=tomorrow&odds=-1",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(json["errors"]["title"].is_string());
        assert!(json["errors"]["scheduled_at"].is_string());
        assert!(json["errors"]["odds"].is_string());
    }

    #[tokio::test]
    async fn test_スラッグ重複は409() {
        let fx = fixture();
        let seed = form("Derby Day", "2026-05-02T18:00");
        fx.state.usecase.create(&seed).await.unwrap();
        let app = create_test_app(fx.state);

        let response = app
            .oneshot(post_form(
                "/admin/predictions",
                "title=Derby+Day&scheduled_at=2026-05-02T20%3A00&prediction_type=1X2",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_スラッグで取得_存在しなければ404() {
        let fx = fixture();
        fx.state
            .usecase
            .create(&form("Derby Day", "2026-05-02T18:00"))
            .await
            .unwrap();
        let app = create_test_app(fx.state);

        let found = app
            .clone()
            .oneshot(get_request("/api/predictions/derby-day-1x2-2026-05-02"))
            .await
            .unwrap();
        let missing = app
            .oneshot(get_request("/api/predictions/no-such-slug"))
            .await
            .unwrap();

        assert_eq!(found.status(), StatusCode::OK);
        let json = body_json(found).await;
        assert_eq!(json["data"]["title"], "Derby Day");
        assert_eq!(json["data"]["scheduled_at"], "2026-05-02T15:00:00+00:00");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_featuredはスラッグ経路より優先される() {
        let fx = fixture();
        fx.state
            .usecase
            .create(&PredictionForm {
                is_featured: Some("on".to_string()),
                ..form("Derby Day", "2026-05-02T18:00")
            })
            .await
            .unwrap();
        fx.state
            .usecase
            .create(&form("Cup Final", "2026-05-03T18:00"))
            .await
            .unwrap();
        let app = create_test_app(fx.state);

        let response = app
            .oneshot(get_request("/api/predictions/featured"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Derby Day");
        assert_eq!(items[0]["is_featured"], true);
    }

    #[tokio::test]
    async fn test_アーカイブは公開一覧から除外され管理一覧には出る() {
        let fx = fixture();
        fx.state
            .usecase
            .create(&PredictionForm {
                is_archived: Some("on".to_string()),
                ..form("Old News", "2026-05-02T18:00")
            })
            .await
            .unwrap();
        let app = create_test_app(fx.state);

        let public = body_json(
            app.clone()
                .oneshot(get_request("/api/predictions"))
                .await
                .unwrap(),
        )
        .await;
        let admin = body_json(
            app.oneshot(get_request("/admin/predictions"))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(public["data"].as_array().unwrap().len(), 0);
        assert_eq!(admin["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_更新でリーグを設定し削除後は404() {
        let fx = fixture();
        fx.leagues.add(League::from_db(
            LeagueId::from_db(7),
            "Premier League".to_string(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        ));
        let id = fx
            .state
            .usecase
            .create(&form("Derby Day", "2026-05-02T18:00"))
            .await
            .unwrap();
        let app = create_test_app(fx.state);
        let uri = format!("/admin/predictions/{id}");

        let updated = app
            .clone()
            .oneshot(post_form(
                &uri,
                "title=Derby+Day&scheduled_at=2026-05-02T18%3A00&prediction_type=1X2&league_id=7",
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::SEE_OTHER);

        let fetched = body_json(app.clone().oneshot(get_request(&uri)).await.unwrap()).await;
        assert_eq!(fetched["data"]["league_id"], 7);

        let deleted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::SEE_OTHER);

        let missing = app.oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_不正なidは404() {
        let fx = fixture();
        let app = create_test_app(fx.state);

        let response = app
            .oneshot(get_request("/admin/predictions/abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
