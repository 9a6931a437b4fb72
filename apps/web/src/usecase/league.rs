//! リーグ管理ユースケース

use std::sync::Arc;

use serde::Deserialize;
use tipster_domain::{
    clock::Clock,
    league::{League, LeagueId, validate_league_title},
};
use tipster_infra::repository::LeagueRepository;
use tipster_shared::{event_log::event, log_business_event};

use super::form::FieldErrors;
use crate::error::WebError;

/// リーグの作成・更新フォーム
///
/// `id` が指定されていれば更新、空なら作成。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeagueForm {
    pub id:    String,
    pub title: String,
}

/// 検証済みのリーグ入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueInput {
    pub id:    Option<LeagueId>,
    pub title: String,
}

impl LeagueForm {
    pub fn validate(&self) -> Result<LeagueInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let id = match self.id.trim() {
            "" => None,
            raw => LeagueId::parse(raw)
                .map_err(|_| errors.add("id", "リーグ ID の形式が不正です"))
                .ok(),
        };

        let title = validate_league_title(&self.title)
            .map_err(|_| errors.add("title", "リーグ名は必須です"))
            .unwrap_or_default();

        errors.into_result(LeagueInput { id, title })
    }
}

/// リーグ管理ユースケース
pub struct LeagueUseCaseImpl {
    leagues: Arc<dyn LeagueRepository>,
    clock:   Arc<dyn Clock>,
}

impl LeagueUseCaseImpl {
    pub fn new(leagues: Arc<dyn LeagueRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { leagues, clock }
    }

    /// リーグ一覧を取得する（タイトル順）
    pub async fn list(&self) -> Result<Vec<League>, WebError> {
        let leagues = self.leagues.find_all().await?;
        Ok(leagues)
    }

    pub async fn get(&self, raw_id: &str) -> Result<League, WebError> {
        let id = parse_id(raw_id)?;
        self.leagues
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// リーグを保存する（`id` があれば更新、なければ作成）
    #[tracing::instrument(skip_all, level = "debug")]
    pub async fn save(&self, form: &LeagueForm) -> Result<League, WebError> {
        let input = form.validate()?;
        let now = self.clock.now();

        let Some(id) = input.id else {
            let league = self.leagues.insert(&input.title, now).await?;
            log_business_event!(
                event.category = event::category::LEAGUE,
                event.action = event::action::LEAGUE_CREATED,
                event.entity_type = event::entity_type::LEAGUE,
                event.entity_id = %league.id(),
                event.result = event::result::SUCCESS,
                "リーグ作成"
            );
            return Ok(league);
        };

        let current = self
            .leagues
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let updated = current.with_title(input.title, now);
        self.leagues.update(&updated).await?;

        log_business_event!(
            event.category = event::category::LEAGUE,
            event.action = event::action::LEAGUE_UPDATED,
            event.entity_type = event::entity_type::LEAGUE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "リーグ更新"
        );
        Ok(updated)
    }

    /// リーグを削除する
    ///
    /// 参照していた予想記事はストア側でリーグ未設定になる。
    #[tracing::instrument(skip_all, level = "debug", fields(%raw_id))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), WebError> {
        let id = parse_id(raw_id)?;
        if !self.leagues.delete(id).await? {
            return Err(not_found(id));
        }

        log_business_event!(
            event.category = event::category::LEAGUE,
            event.action = event::action::LEAGUE_DELETED,
            event.entity_type = event::entity_type::LEAGUE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "リーグ削除"
        );
        Ok(())
    }
}

fn parse_id(raw_id: &str) -> Result<LeagueId, WebError> {
    LeagueId::parse(raw_id).map_err(|e| WebError::NotFound(e.to_string()))
}

fn not_found(id: LeagueId) -> WebError {
    WebError::NotFound(format!("リーグが見つかりません: {id}"))
}
