//! # Canonical Log Line
//!
//! リクエストごとに 1 行のサマリログを出力する tower Layer。
//!
//! ## 出力フィールド
//!
//! | フィールド | 内容 |
//! |-----------|------|
//! | `http.route_group` | `public` / `admin`（[`RouteGroup`]） |
//! | `http.method`, `http.path`, `http.status_code`, `http.latency_ms` | リクエストの要約 |
//! | `campaign.id` | 配信成功時に作成されたキャンペーン ID |
//! | `campaign.failed_stage` | 配信失敗時のステージ |
//! | `reconciliation_required` | 送信済みだが記録に失敗した配信で true |
//!
//! `campaign.*` と `reconciliation_required` は、配信ハンドラがレスポンス拡張に
//! [`CampaignOutcome`] を載せた場合のみ出力される。
//! 5xx はエラーレベル、それ以外は情報レベル。ヘルスチェックは出力しない。
//!
//! `TraceLayer` の内側に置き、リクエストスパンのフィールドが JSON ログに含まれるようにする。

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use http::{Request, Response};
use tower::{Layer, Service};

/// ルートの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// `/health`, `/health/ready`
    Health,
    /// `/admin` 配下（Basic 認証）
    Admin,
    /// 公開 API と購読受付
    Public,
}

impl RouteGroup {
    pub fn of(path: &str) -> Self {
        if path.starts_with("/health") {
            Self::Health
        } else if path == "/admin" || path.starts_with("/admin/") {
            Self::Admin
        } else {
            Self::Public
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Admin => "admin",
            Self::Public => "public",
        }
    }
}

/// キャンペーン配信の結果
///
/// 配信ハンドラがレスポンス拡張に挿入し、[`CanonicalLogLineLayer`] が読み取る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignOutcome {
    pub campaign_id:             Option<i64>,
    pub failed_stage:            Option<&'static str>,
    pub reconciliation_required: bool,
}

impl CampaignOutcome {
    pub fn dispatched(campaign_id: i64) -> Self {
        Self {
            campaign_id:             Some(campaign_id),
            failed_stage:            None,
            reconciliation_required: false,
        }
    }

    pub fn failed(stage: &'static str, reconciliation_required: bool) -> Self {
        Self {
            campaign_id: None,
            failed_stage: Some(stage),
            reconciliation_required,
        }
    }
}

macro_rules! canonical_line {
    ($level:expr, $line:ident, $status:ident, $outcome:ident) => {
        tracing::event!(
            $level,
            log.r#type = "canonical",
            http.route_group = $line.group.as_str(),
            http.method = %$line.method,
            http.path = %$line.path,
            http.status_code = $status,
            http.latency_ms = $line.latency_ms(),
            campaign.id = $outcome.and_then(|o| o.campaign_id),
            campaign.failed_stage = $outcome.and_then(|o| o.failed_stage),
            reconciliation_required = $outcome.map(|o| o.reconciliation_required),
            "リクエスト完了"
        )
    };
}

/// 1 リクエスト分の記録
struct RequestLine {
    group:   RouteGroup,
    method:  http::Method,
    path:    String,
    started: Instant,
}

impl RequestLine {
    fn latency_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn emit<B>(&self, response: &Response<B>) {
        let line = self;
        let status = response.status().as_u16();
        let outcome = response.extensions().get::<CampaignOutcome>();
        if response.status().is_server_error() {
            canonical_line!(tracing::Level::ERROR, line, status, outcome);
        } else {
            canonical_line!(tracing::Level::INFO, line, status, outcome);
        }
    }

    fn emit_error(&self, err: &dyn Display) {
        tracing::error!(
            log.r#type = "canonical",
            http.route_group = self.group.as_str(),
            http.method = %self.method,
            http.path = %self.path,
            http.latency_ms = self.latency_ms(),
            error.message = %err,
            "リクエスト処理エラー"
        );
    }
}

/// Canonical Log Line を出力する Layer
#[derive(Clone, Debug)]
pub struct CanonicalLogLineLayer;

impl<S> Layer<S> for CanonicalLogLineLayer {
    type Service = CanonicalLogLineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CanonicalLogLineService { inner }
    }
}

#[derive(Clone, Debug)]
pub struct CanonicalLogLineService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CanonicalLogLineService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Display + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // poll_ready 済みのインスタンスで呼び出す
        let ready = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, ready);

        let group = RouteGroup::of(req.uri().path());
        if group == RouteGroup::Health {
            return Box::pin(inner.call(req));
        }

        let line = RequestLine {
            group,
            method: req.method().clone(),
            path: req.uri().path().to_owned(),
            started: Instant::now(),
        };

        Box::pin(async move {
            let result = inner.call(req).await;
            match &result {
                Ok(response) => line.emit(response),
                Err(err) => line.emit_error(err),
            }
            result
        })
    }
}
