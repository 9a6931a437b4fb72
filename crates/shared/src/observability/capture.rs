//! # ログキャプチャ（テスト用）
//!
//! スレッドローカルの subscriber でイベントを記録し、フィールドを文字列で検査できるようにする。
//! `#[tokio::test]`（current_thread）の中で使う。
//!
//! ```toml
//! [dev-dependencies]
//! tipster-shared = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{
    Event,
    Level,
    Subscriber,
    field::{Field, Visit},
    subscriber::DefaultGuard,
};
use tracing_subscriber::{
    Layer,
    layer::{Context, SubscriberExt},
};

/// 記録されたイベント
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level:   Level,
    pub message: String,
    fields:      Vec<(String, String)>,
}

impl CapturedEvent {
    /// フィールドの値（Display / Debug 表現）
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// キャプチャ中のログ
///
/// ドロップすると subscriber が元に戻る。
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn start() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Recorder {
            events: events.clone(),
        });
        Self {
            events,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `name = value` のフィールドを持つイベント
    pub fn with_field(&self, name: &str, value: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.field(name) == Some(value))
            .collect()
    }
}

struct Recorder {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level:   *event.metadata().level(),
            message: visitor.message,
            fields:  visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields:  Vec<(String, String)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    // 数値・真偽値・`%` / `?` 指定の値はここに来る
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}
