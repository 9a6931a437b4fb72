//! # リーグ管理ハンドラ
//!
//! - `GET /admin/leagues` - リーグ一覧
//! - `POST /admin/leagues` - 作成または更新（303 → `/admin/leagues`）
//! - `GET /admin/leagues/{id}` - 1 件取得
//! - `DELETE /admin/leagues/{id}` - 削除（303 → `/admin/leagues`）

use std::sync::Arc;

use axum::{
    Form,
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tipster_domain::league::League;
use tipster_shared::ApiResponse;

use crate::{
    error::WebError,
    usecase::{LeagueForm, LeagueUseCaseImpl},
};

const LEAGUES_HOME: &str = "/admin/leagues";

pub struct LeagueState {
    pub usecase: LeagueUseCaseImpl,
}

/// リーグ DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LeagueDto {
    pub id:         i64,
    pub title:      String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&League> for LeagueDto {
    fn from(league: &League) -> Self {
        Self {
            id:         league.id().as_i64(),
            title:      league.title().to_string(),
            created_at: league.created_at().to_rfc3339(),
            updated_at: league.updated_at().to_rfc3339(),
        }
    }
}

/// GET /admin/leagues
#[tracing::instrument(skip_all)]
pub async fn list_leagues(
    State(state): State<Arc<LeagueState>>,
) -> Result<impl IntoResponse, WebError> {
    let leagues = state.usecase.list().await?;
    let items: Vec<LeagueDto> = leagues.iter().map(LeagueDto::from).collect();

    Ok(Json(ApiResponse::new(items)))
}

/// GET /admin/leagues/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn get_league(
    State(state): State<Arc<LeagueState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, WebError> {
    let league = state.usecase.get(&id).await?;

    Ok(Json(ApiResponse::new(LeagueDto::from(&league))))
}

/// POST /admin/leagues
///
/// フォームに `id` があれば更新、なければ作成する。
#[tracing::instrument(skip_all)]
pub async fn save_league(
    State(state): State<Arc<LeagueState>>,
    Form(form): Form<LeagueForm>,
) -> Result<Redirect, WebError> {
    state.usecase.save(&form).await?;
    Ok(Redirect::to(LEAGUES_HOME))
}

/// DELETE /admin/leagues/{id}
#[tracing::instrument(skip_all, fields(%id))]
pub async fn delete_league(
    State(state): State<Arc<LeagueState>>,
    Path(id): Path<String>,
) -> Result<Redirect, WebError> {
    state.usecase.delete(&id).await?;
    Ok(Redirect::to(LEAGUES_HOME))
}
