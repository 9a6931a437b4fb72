//! # 予想記事ユースケース
//!
//! 公開一覧と管理画面の予想記事 CRUD を提供する。
//!
//! ## 設計方針
//!
//! - **フォーム検証**: [`PredictionForm::validate`] で型付きの [`PredictionDraft`] に変換する
//! - **日時入力**: `YYYY-MM-DDTHH:MM` をサイト固定の UTC オフセットで解釈する
//! - **配信済みフラグ**: 編集では変更しない（[`Prediction::with_draft`] が保持する）
//! - **「今日以降」**: 一覧の下限はサイトのローカル日付の 0 時

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tipster_domain::{
    clock::Clock,
    league::LeagueId,
    prediction::{Prediction, PredictionDraft, PredictionId},
};
use tipster_infra::repository::{LeagueRepository, PredictionRepository};
use tipster_shared::{event_log::event, log_business_event};

use super::form::{FieldErrors, parse_checkbox};
use crate::error::WebError;

/// 日時入力の形式（`<input type="datetime-local">`）
const SCHEDULED_AT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// 予想記事の作成・更新フォーム
///
/// 値はすべて文字列で受け取り、[`validate`](Self::validate) で検証する。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredictionForm {
    pub title:           String,
    pub body:            String,
    pub keywords:        String,
    pub scheduled_at:    String,
    pub odds:            String,
    pub prediction_type: String,
    pub is_featured:     Option<String>,
    pub is_archived:     Option<String>,
    pub league_id:       String,
}

impl PredictionForm {
    /// フォームを検証して編集内容に変換する
    pub fn validate(&self, site_offset: FixedOffset) -> Result<PredictionDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "タイトルは必須です");
        }

        let scheduled_at = match parse_scheduled_at(&self.scheduled_at, site_offset) {
            Ok(at) => Some(at),
            Err(message) => {
                errors.add("scheduled_at", message);
                None
            }
        };

        let odds = match self.odds.trim() {
            "" => 0.0,
            raw => match raw.parse::<f64>() {
                Ok(odds) if odds.is_finite() && odds >= 0.0 => odds,
                Ok(_) => {
                    errors.add("odds", "オッズは 0 以上の数値である必要があります");
                    0.0
                }
                Err(_) => {
                    errors.add("odds", "オッズの形式が不正です");
                    0.0
                }
            },
        };

        let league_id = match self.league_id.trim() {
            "" => None,
            raw => match LeagueId::parse(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("league_id", "リーグ ID の形式が不正です");
                    None
                }
            },
        };

        let Some(scheduled_at) = scheduled_at else {
            return Err(errors);
        };

        errors.into_result(PredictionDraft {
            title: title.to_string(),
            body: self.body.clone(),
            keywords: self.keywords.trim().to_string(),
            odds,
            prediction_type: self.prediction_type.trim().to_string(),
            scheduled_at,
            is_featured: parse_checkbox(self.is_featured.as_deref()),
            is_archived: parse_checkbox(self.is_archived.as_deref()),
            league_id,
        })
    }
}

/// サイトのローカル日時として入力された値を UTC に変換する
fn parse_scheduled_at(raw: &str, site_offset: FixedOffset) -> Result<DateTime<Utc>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("予定日時は必須です");
    }

    let naive = SCHEDULED_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or("予定日時の形式が不正です（YYYY-MM-DDTHH:MM）")?;

    site_offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or("予定日時を解釈できません")
}

/// 公開一覧の 1 行
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub prediction:          Prediction,
    /// 直前の行とリーグが異なる（リーグ見出しを出す位置）
    pub starts_league_block: bool,
}

/// 一覧の各行にリーグ見出しの位置を付与する
pub fn league_blocks(predictions: Vec<Prediction>) -> Vec<ListingEntry> {
    let mut previous: Option<Option<LeagueId>> = None;
    predictions
        .into_iter()
        .map(|prediction| {
            let league = prediction.league_id();
            let starts_league_block = previous != Some(league);
            previous = Some(league);
            ListingEntry {
                prediction,
                starts_league_block,
            }
        })
        .collect()
}

/// 予想記事ユースケース
pub struct PredictionUseCaseImpl {
    predictions: Arc<dyn PredictionRepository>,
    leagues:     Arc<dyn LeagueRepository>,
    clock:       Arc<dyn Clock>,
    site_offset: FixedOffset,
}

impl PredictionUseCaseImpl {
    pub fn new(
        predictions: Arc<dyn PredictionRepository>,
        leagues: Arc<dyn LeagueRepository>,
        clock: Arc<dyn Clock>,
        site_offset: FixedOffset,
    ) -> Self {
        Self {
            predictions,
            leagues,
            clock,
            site_offset,
        }
    }

    /// 公開一覧（アーカイブ除外、リーグ見出し付き）
    pub async fn list_public(&self) -> Result<Vec<ListingEntry>, WebError> {
        let predictions = self
            .predictions
            .find_upcoming(self.clock.start_of_local_day(self.site_offset), false)
            .await?;
        Ok(league_blocks(predictions))
    }

    /// 注目の予想記事
    pub async fn list_featured(&self) -> Result<Vec<Prediction>, WebError> {
        let predictions = self
            .predictions
            .find_featured(self.clock.start_of_local_day(self.site_offset))
            .await?;
        Ok(predictions)
    }

    /// 管理画面の一覧（アーカイブ含む）
    pub async fn list_admin(&self) -> Result<Vec<Prediction>, WebError> {
        let predictions = self
            .predictions
            .find_upcoming(self.clock.start_of_local_day(self.site_offset), true)
            .await?;
        Ok(predictions)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Prediction, WebError> {
        self.predictions
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| WebError::NotFound(format!("予想記事が見つかりません: {slug}")))
    }

    /// ID で取得する。不正な ID は存在しない ID と同じ扱い
    pub async fn get(&self, raw_id: &str) -> Result<Prediction, WebError> {
        let id = parse_id(raw_id)?;
        self.find_existing(id).await
    }

    /// 予想記事を作成する
    ///
    /// スラッグが既存の予想記事と重複する場合は `Conflict`。
    #[tracing::instrument(skip_all, level = "debug")]
    pub async fn create(&self, form: &PredictionForm) -> Result<PredictionId, WebError> {
        let draft = self.validate(form).await?;
        let id = self.predictions.insert(&draft, self.clock.now()).await?;

        log_business_event!(
            event.category = event::category::PREDICTION,
            event.action = event::action::PREDICTION_CREATED,
            event.entity_type = event::entity_type::PREDICTION,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "予想記事作成"
        );
        Ok(id)
    }

    /// 予想記事を更新する
    ///
    /// スラッグは再導出する。配信済みフラグはストアに書き込まない。
    #[tracing::instrument(skip_all, level = "debug", fields(%raw_id))]
    pub async fn update(&self, raw_id: &str, form: &PredictionForm) -> Result<Prediction, WebError> {
        let id = parse_id(raw_id)?;
        let draft = self.validate(form).await?;
        let current = self.find_existing(id).await?;

        let updated = current.with_draft(draft, self.clock.now());
        self.predictions.update(&updated).await?;

        log_business_event!(
            event.category = event::category::PREDICTION,
            event.action = event::action::PREDICTION_UPDATED,
            event.entity_type = event::entity_type::PREDICTION,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "予想記事更新"
        );
        Ok(updated)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%raw_id))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), WebError> {
        let id = parse_id(raw_id)?;
        if !self.predictions.delete(id).await? {
            return Err(not_found(id));
        }

        log_business_event!(
            event.category = event::category::PREDICTION,
            event.action = event::action::PREDICTION_DELETED,
            event.entity_type = event::entity_type::PREDICTION,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "予想記事削除"
        );
        Ok(())
    }

    async fn find_existing(&self, id: PredictionId) -> Result<Prediction, WebError> {
        self.predictions
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// フォームを検証し、参照先リーグの存在も確認する
    async fn validate(&self, form: &PredictionForm) -> Result<PredictionDraft, WebError> {
        let draft = form.validate(self.site_offset)?;

        let Some(league_id) = draft.league_id else {
            return Ok(draft);
        };
        if self.leagues.find_by_id(league_id).await?.is_none() {
            let mut errors = FieldErrors::new();
            errors.add("league_id", format!("リーグが存在しません: {league_id}"));
            return Err(errors.into());
        }

        Ok(draft)
    }
}

fn parse_id(raw_id: &str) -> Result<PredictionId, WebError> {
    PredictionId::parse(raw_id).map_err(|e| WebError::NotFound(e.to_string()))
}

fn not_found(id: PredictionId) -> WebError {
    WebError::NotFound(format!("予想記事が見つかりません: {id}"))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tipster_domain::{clock::FixedClock, league::League};
    use tipster_infra::mock::{MockLeagueRepository, MockPredictionRepository};

    use super::*;

    fn site_offset() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap()
    }

    fn make_form(title: &str, scheduled_at: &str) -> PredictionForm {
        PredictionForm {
            title: title.to_string(),
            body: "<p>Home win expected.</p>".to_string(),
            keywords: "derby".to_string(),
            scheduled_at: scheduled_at.to_string(),
            odds: "2.5".to_string(),
            prediction_type: "1X2".to_string(),
            ..Default::default()
        }
    }

    fn make_sut(
        predictions: &MockPredictionRepository,
        leagues: &MockLeagueRepository,
    ) -> PredictionUseCaseImpl {
        PredictionUseCaseImpl::new(
            Arc::new(predictions.clone()),
            Arc::new(leagues.clone()),
            Arc::new(FixedClock::new(fixed_now())),
            site_offset(),
        )
    }

    // --- フォーム検証 ---

    #[test]
    fn test_日時はサイトのオフセットで解釈してutcに変換する() {
        let draft = make_form("Derby Day", "2026-05-02T18:00")
            .validate(site_offset())
            .unwrap();

        assert_eq!(
            draft.scheduled_at,
            Utc.with_ymd_and_hms(2026, 5, 2, 15, 0, 0).unwrap()
        );
        assert_eq!(draft.odds, 2.5);
        assert!(!draft.is_featured);
        assert_eq!(draft.league_id, None);
    }

    #[test]
    fn test_チェックボックスとリーグidを解釈する() {
        let form = PredictionForm {
            is_featured: Some("on".to_string()),
            is_archived: Some("true".to_string()),
            league_id: "3".to_string(),
            odds: String::new(),
            ..make_form("Derby Day", "2026-05-02T18:00:30")
        };

        let draft = form.validate(site_offset()).unwrap();

        assert!(draft.is_featured);
        assert!(draft.is_archived);
        assert_eq!(draft.league_id, Some(LeagueId::new(3).unwrap()));
        assert_eq!(draft.odds, 0.0);
        assert_eq!(draft.scheduled_at.second(), 30);
    }

    #[rstest]
    #[case::タイトル未入力(make_form("  ", "2026-05-02T18:00"), "title")]
    #[case::日時未入力(make_form("Derby Day", ""), "scheduled_at")]
    #[case::日時形式不正(make_form("Derby Day", "02/05/2026 18:00"), "scheduled_at")]
    #[case::オッズ負数(PredictionForm { odds: "-1".to_string(), ..make_form("Derby Day", "2026-05-02T18:00") }, "odds")]
    #[case::オッズ形式不正(PredictionForm { odds: "evens".to_string(), ..make_form("Derby Day", "2026-05-02T18:00") }, "odds")]
    #[case::リーグid不正(PredictionForm { league_id: "0".to_string(), ..make_form("Derby Day", "2026-05-02T18:00") }, "league_id")]
    fn test_不正な入力はフィールドエラーになる(
        #[case] form: PredictionForm,
        #[case] field: &str,
    ) {
        let errors = form.validate(site_offset()).unwrap_err();

        assert!(errors.get(field).is_some(), "{field} のエラーがありません");
    }

    #[test]
    fn test_複数のエラーをまとめて返す() {
        let form = PredictionForm {
            odds: "x".to_string(),
            ..make_form("", "")
        };

        let errors = form.validate(site_offset()).unwrap_err();

        assert_eq!(errors.len(), 3);
    }

    // --- ユースケース ---

    #[tokio::test]
    async fn test_作成した予想記事がスラッグで取得できる() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);

        let id = sut
            .create(&make_form("Derby Day", "2026-05-02T18:00"))
            .await
            .unwrap();

        let found = sut.get_by_slug("derby-day-1x2-2026-05-02").await.unwrap();
        assert_eq!(found.id(), id);
        assert!(!found.is_campaigned());
        assert_eq!(found.created_at(), fixed_now());
    }

    #[tokio::test]
    async fn test_スラッグが重複する場合はconflict() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        let form = make_form("Derby Day", "2026-05-02T18:00");

        sut.create(&form).await.unwrap();
        let result = sut.create(&form).await;

        assert!(matches!(result, Err(WebError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_存在しないリーグを参照するとフィールドエラー() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        let form = PredictionForm {
            league_id: "5".to_string(),
            ..make_form("Derby Day", "2026-05-02T18:00")
        };

        let result = sut.create(&form).await;

        let Err(WebError::Validation(errors)) = result else {
            panic!("Validation ではありません");
        };
        assert!(errors.get("league_id").is_some());
        assert_eq!(predictions.call_count(), 0);
    }

    #[tokio::test]
    async fn test_更新はスラッグを再導出し配信済みフラグを保持する() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        leagues.add(League::from_db(
            LeagueId::new(1).unwrap(),
            "Premier League".to_string(),
            fixed_now(),
            fixed_now(),
        ));
        let sut = make_sut(&predictions, &leagues);
        let id = sut
            .create(&make_form("Derby Day", "2026-05-02T18:00"))
            .await
            .unwrap();
        assert!(predictions.mark_campaigned(id, fixed_now()).await.unwrap());

        let form = PredictionForm {
            league_id: "1".to_string(),
            ..make_form("Cup Final", "2026-05-09T18:00")
        };
        let updated = sut.update(&id.to_string(), &form).await.unwrap();

        assert_eq!(updated.slug().as_str(), "cup-final-1x2-2026-05-09");
        assert!(updated.is_campaigned());
        let stored = predictions.get(id).unwrap();
        assert!(stored.is_campaigned());
        assert_eq!(stored.title(), "Cup Final");
        assert_eq!(stored.league_id(), Some(LeagueId::new(1).unwrap()));
    }

    #[rstest]
    #[case("99")]
    #[case("abc")]
    #[case("-1")]
    #[tokio::test]
    async fn test_存在しないまたは不正なidの取得_更新_削除はnot_found(#[case] raw_id: &str) {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        let form = make_form("Derby Day", "2026-05-02T18:00");

        assert!(matches!(sut.get(raw_id).await, Err(WebError::NotFound(_))));
        assert!(matches!(
            sut.update(raw_id, &form).await,
            Err(WebError::NotFound(_))
        ));
        assert!(matches!(sut.delete(raw_id).await, Err(WebError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_削除した予想記事は取得できない() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        let id = sut
            .create(&make_form("Derby Day", "2026-05-02T18:00"))
            .await
            .unwrap();

        sut.delete(&id.to_string()).await.unwrap();

        assert!(matches!(
            sut.get(&id.to_string()).await,
            Err(WebError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_公開一覧は今日以降かつアーカイブ以外() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        // 現在時刻はサイト時刻で 2026-05-01 11:30
        sut.create(&make_form("Early Kickoff", "2026-05-01T01:00"))
            .await
            .unwrap();
        sut.create(&make_form("Yesterday", "2026-04-30T20:00"))
            .await
            .unwrap();
        sut.create(&PredictionForm {
            is_archived: Some("on".to_string()),
            ..make_form("Archived", "2026-05-03T18:00")
        })
        .await
        .unwrap();

        let public: Vec<String> = sut
            .list_public()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.prediction.title().to_string())
            .collect();
        let admin = sut.list_admin().await.unwrap();

        assert_eq!(public, vec!["Early Kickoff".to_string()]);
        assert_eq!(admin.len(), 2);
    }

    #[tokio::test]
    async fn test_注目一覧はフラグ付きのみ() {
        let predictions = MockPredictionRepository::new();
        let leagues = MockLeagueRepository::new();
        let sut = make_sut(&predictions, &leagues);
        sut.create(&PredictionForm {
            is_featured: Some("on".to_string()),
            ..make_form("Derby Day", "2026-05-02T18:00")
        })
        .await
        .unwrap();
        sut.create(&make_form("Cup Final", "2026-05-09T18:00"))
            .await
            .unwrap();

        let featured = sut.list_featured().await.unwrap();

        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].title(), "Derby Day");
    }

    #[test]
    fn test_リーグが変わる行で見出しフラグが立つ() {
        let league_a = Some(LeagueId::new(1).unwrap());
        let league_b = Some(LeagueId::new(2).unwrap());
        let make = |id: i64, league_id: Option<LeagueId>| {
            let draft = PredictionDraft {
                league_id,
                ..make_form(&format!("Match {id}"), "2026-05-02T18:00")
                    .validate(site_offset())
                    .unwrap()
            };
            Prediction::from_db(tipster_domain::prediction::PredictionRecord {
                id: PredictionId::new(id).unwrap(),
                slug: draft.slug(),
                draft,
                campaigned: false,
                league_title: None,
                created_at: fixed_now(),
                updated_at: fixed_now(),
            })
        };

        let entries = league_blocks(vec![
            make(1, league_a),
            make(2, league_a),
            make(3, league_b),
            make(4, None),
            make(5, None),
        ]);

        let flags: Vec<bool> = entries.iter().map(|e| e.starts_league_block).collect();
        assert_eq!(flags, vec![true, false, true, true, false]);
    }
}
