//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリとメールプロバイダ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! tipster-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 各モックは呼び出し回数を記録し、任意の操作を失敗させられる。

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tipster_domain::{
    campaign::{CampaignDraft, CampaignId, ListId, ProviderError},
    league::{League, LeagueId},
    prediction::{Prediction, PredictionDraft, PredictionId, PredictionRecord},
    subscriber::SubscriberEmail,
};

use crate::{
    email_provider::EmailProvider,
    error::InfraError,
    repository::{LeagueRepository, PredictionRepository, UPCOMING_LIMIT},
};

// ===== MockPredictionRepository =====

#[derive(Clone)]
pub struct MockPredictionRepository {
    predictions:  Arc<Mutex<Vec<Prediction>>>,
    next_id:      Arc<AtomicI64>,
    calls:        Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    fail_find:    Arc<AtomicBool>,
    fail_update:  Arc<AtomicBool>,
}

impl Default for MockPredictionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPredictionRepository {
    pub fn new() -> Self {
        Self {
            predictions:  Arc::new(Mutex::new(Vec::new())),
            next_id:      Arc::new(AtomicI64::new(1)),
            calls:        Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(AtomicUsize::new(0)),
            fail_find:    Arc::new(AtomicBool::new(false)),
            fail_update:  Arc::new(AtomicBool::new(false)),
        }
    }

    /// 予想記事を登録する（採番済み ID をそのまま使う）
    pub fn add(&self, prediction: Prediction) {
        let next = prediction.id().as_i64() + 1;
        self.next_id.fetch_max(next, Ordering::SeqCst);
        self.predictions.lock().unwrap().push(prediction);
    }

    /// 現在保存されている予想記事を取得する（呼び出し回数に数えない）
    pub fn get(&self, id: PredictionId) -> Option<Prediction> {
        self.predictions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    /// 全メソッドの呼び出し回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// 以降の検索系メソッドを失敗させる
    pub fn fail_find(&self) {
        self.fail_find.store(true, Ordering::SeqCst);
    }

    /// 以降の `update` と `mark_campaigned` を失敗させる
    pub fn fail_update(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_find(&self) -> Result<(), InfraError> {
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("mock: find failed"));
        }
        Ok(())
    }
}

/// PostgreSQL の `ORDER BY l.title, p.scheduled_at, p.created_at` と同じ並び（NULL は末尾）
fn upcoming_order(a: &Prediction, b: &Prediction) -> std::cmp::Ordering {
    let key = |p: &Prediction| {
        (
            p.league_title().is_none(),
            p.league_title().map(str::to_string),
            p.scheduled_at(),
            p.created_at(),
        )
    };
    key(a).cmp(&key(b))
}

#[async_trait]
impl PredictionRepository for MockPredictionRepository {
    async fn find_by_id(&self, id: PredictionId) -> Result<Option<Prediction>, InfraError> {
        self.record_call();
        self.check_find()?;
        Ok(self.get(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Prediction>, InfraError> {
        self.record_call();
        self.check_find()?;
        Ok(self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug().as_str() == slug)
            .cloned())
    }

    async fn find_upcoming(
        &self,
        from: DateTime<Utc>,
        include_archived: bool,
    ) -> Result<Vec<Prediction>, InfraError> {
        self.record_call();
        self.check_find()?;
        let mut found: Vec<Prediction> = self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.scheduled_at() >= from && (include_archived || !p.is_archived()))
            .cloned()
            .collect();
        found.sort_by(upcoming_order);
        found.truncate(UPCOMING_LIMIT as usize);
        Ok(found)
    }

    async fn find_featured(&self, from: DateTime<Utc>) -> Result<Vec<Prediction>, InfraError> {
        self.record_call();
        self.check_find()?;
        let mut found: Vec<Prediction> = self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_featured() && !p.is_archived() && p.scheduled_at() >= from)
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.scheduled_at(), p.created_at()));
        Ok(found)
    }

    async fn insert(
        &self,
        draft: &PredictionDraft,
        now: DateTime<Utc>,
    ) -> Result<PredictionId, InfraError> {
        self.record_call();
        let slug = draft.slug();
        let mut predictions = self.predictions.lock().unwrap();
        if predictions.iter().any(|p| p.slug() == &slug) {
            return Err(InfraError::conflict("Prediction", slug.as_str()));
        }

        let id = PredictionId::from_db(self.next_id.fetch_add(1, Ordering::SeqCst));
        predictions.push(Prediction::from_db(PredictionRecord {
            id,
            slug,
            draft: draft.clone(),
            campaigned: false,
            league_title: None,
            created_at: now,
            updated_at: now,
        }));
        Ok(id)
    }

    async fn update(&self, prediction: &Prediction) -> Result<(), InfraError> {
        self.record_call();
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("mock: update failed"));
        }

        let mut predictions = self.predictions.lock().unwrap();
        if predictions
            .iter()
            .any(|p| p.id() != prediction.id() && p.slug() == prediction.slug())
        {
            return Err(InfraError::conflict("Prediction", prediction.slug().as_str()));
        }
        let Some(stored) = predictions.iter_mut().find(|p| p.id() == prediction.id()) else {
            return Err(InfraError::unexpected(format!(
                "更新対象の予想記事が存在しません: {}",
                prediction.id()
            )));
        };
        // 配信済みフラグは保存済みの値を維持する
        *stored = Prediction::from_db(PredictionRecord {
            id:           prediction.id(),
            slug:         prediction.slug().clone(),
            draft:        prediction.draft().clone(),
            campaigned:   stored.is_campaigned(),
            league_title: prediction.league_title().map(str::to_string),
            created_at:   prediction.created_at(),
            updated_at:   prediction.updated_at(),
        });
        Ok(())
    }

    async fn mark_campaigned(
        &self,
        id: PredictionId,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        self.record_call();
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(InfraError::unexpected("mock: mark_campaigned failed"));
        }

        let mut predictions = self.predictions.lock().unwrap();
        let Some(stored) = predictions.iter_mut().find(|p| p.id() == id) else {
            return Ok(false);
        };
        match stored.clone().mark_campaigned(now) {
            Ok(marked) => {
                *stored = marked;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn delete(&self, id: PredictionId) -> Result<bool, InfraError> {
        self.record_call();
        let mut predictions = self.predictions.lock().unwrap();
        let before = predictions.len();
        predictions.retain(|p| p.id() != id);
        Ok(predictions.len() < before)
    }
}

// ===== MockLeagueRepository =====

#[derive(Clone)]
pub struct MockLeagueRepository {
    leagues: Arc<Mutex<Vec<League>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for MockLeagueRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLeagueRepository {
    pub fn new() -> Self {
        Self {
            leagues: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn add(&self, league: League) {
        let next = league.id().as_i64() + 1;
        self.next_id.fetch_max(next, Ordering::SeqCst);
        self.leagues.lock().unwrap().push(league);
    }
}

#[async_trait]
impl LeagueRepository for MockLeagueRepository {
    async fn find_all(&self) -> Result<Vec<League>, InfraError> {
        let mut leagues = self.leagues.lock().unwrap().clone();
        leagues.sort_by(|a, b| a.title().cmp(b.title()).then(a.id().cmp(&b.id())));
        Ok(leagues)
    }

    async fn find_by_id(&self, id: LeagueId) -> Result<Option<League>, InfraError> {
        Ok(self
            .leagues
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id() == id)
            .cloned())
    }

    async fn insert(&self, title: &str, now: DateTime<Utc>) -> Result<League, InfraError> {
        let id = LeagueId::from_db(self.next_id.fetch_add(1, Ordering::SeqCst));
        let league = League::from_db(id, title.to_string(), now, now);
        self.leagues.lock().unwrap().push(league.clone());
        Ok(league)
    }

    async fn update(&self, league: &League) -> Result<(), InfraError> {
        let mut leagues = self.leagues.lock().unwrap();
        let Some(stored) = leagues.iter_mut().find(|l| l.id() == league.id()) else {
            return Err(InfraError::unexpected(format!(
                "更新対象のリーグが存在しません: {}",
                league.id()
            )));
        };
        *stored = league.clone();
        Ok(())
    }

    async fn delete(&self, id: LeagueId) -> Result<bool, InfraError> {
        let mut leagues = self.leagues.lock().unwrap();
        let before = leagues.len();
        leagues.retain(|l| l.id() != id);
        Ok(leagues.len() < before)
    }
}

// ===== MockEmailProvider =====

/// 送信を記録するメールプロバイダ
///
/// キャンペーン ID は `starting_campaign_id` から連番で採番する。
#[derive(Clone)]
pub struct MockEmailProvider {
    created:      Arc<Mutex<Vec<CampaignDraft>>>,
    sent:         Arc<Mutex<Vec<CampaignId>>>,
    contacts:     Arc<Mutex<Vec<(String, ListId)>>>,
    next_id:      Arc<AtomicI64>,
    create_error: Arc<Mutex<Option<ProviderError>>>,
    send_error:   Arc<Mutex<Option<ProviderError>>>,
    upsert_error: Arc<Mutex<Option<ProviderError>>>,
    create_delay: Arc<Mutex<Option<Duration>>>,
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(starting_campaign_id: i64) -> Self {
        Self {
            created:      Arc::new(Mutex::new(Vec::new())),
            sent:         Arc::new(Mutex::new(Vec::new())),
            contacts:     Arc::new(Mutex::new(Vec::new())),
            next_id:      Arc::new(AtomicI64::new(starting_campaign_id)),
            create_error: Arc::new(Mutex::new(None)),
            send_error:   Arc::new(Mutex::new(None)),
            upsert_error: Arc::new(Mutex::new(None)),
            create_delay: Arc::new(Mutex::new(None)),
        }
    }

    /// 作成リクエストの記録
    pub fn created(&self) -> Vec<CampaignDraft> {
        self.created.lock().unwrap().clone()
    }

    /// 送信されたキャンペーン ID の記録
    pub fn sent(&self) -> Vec<CampaignId> {
        self.sent.lock().unwrap().clone()
    }

    /// 登録された購読者の記録
    pub fn contacts(&self) -> Vec<(String, ListId)> {
        self.contacts.lock().unwrap().clone()
    }

    /// 全メソッドの呼び出し回数
    pub fn call_count(&self) -> usize {
        self.created.lock().unwrap().len()
            + self.sent.lock().unwrap().len()
            + self.contacts.lock().unwrap().len()
    }

    pub fn fail_create(&self, error: ProviderError) {
        *self.create_error.lock().unwrap() = Some(error);
    }

    pub fn fail_send(&self, error: ProviderError) {
        *self.send_error.lock().unwrap() = Some(error);
    }

    pub fn fail_upsert(&self, error: ProviderError) {
        *self.upsert_error.lock().unwrap() = Some(error);
    }

    /// `create_campaign` の応答を遅らせる（並行実行のテスト用）
    pub fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, ProviderError> {
        self.created.lock().unwrap().push(draft.clone());
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(CampaignId::new(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn send_campaign_now(&self, campaign_id: CampaignId) -> Result<(), ProviderError> {
        self.sent.lock().unwrap().push(campaign_id);
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(())
    }

    async fn upsert_contact(
        &self,
        email: &SubscriberEmail,
        list_id: ListId,
    ) -> Result<(), ProviderError> {
        self.contacts
            .lock()
            .unwrap()
            .push((email.as_str().to_string(), list_id));
        if let Some(error) = self.upsert_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(())
    }
}
