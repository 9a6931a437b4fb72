//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで予想記事をキャンペーン用の HTML メール本文に変換する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **[`ContentRenderer`] トレイト**: 配信ユースケースはテンプレートエンジンに直接依存しない
//! - **自動エスケープ**: 管理者が入力した HTML 本文 `body` と公開 URL `url` 以外はエスケープする
//! - **純粋関数**: レンダリングは外部呼び出しを行わない

use tera::{Context, Tera};
use tipster_domain::{
    campaign::{PREDICTION_TEMPLATE, RenderError},
    prediction::Prediction,
};

/// 予想記事からメール本文を生成するトレイト
pub trait ContentRenderer: Send + Sync {
    /// 名前付きテンプレートに予想記事の各フィールドを埋め込んだ文書を返す
    fn render(&self, template_name: &str, prediction: &Prediction) -> Result<Vec<u8>, RenderError>;
}

/// tera によるテンプレートレンダラー
pub struct TemplateRenderer {
    engine:   Tera,
    base_url: String,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `base_url` は公開ページへのリンク（`{base_url}/prediction/{slug}`）に使う。
    pub fn new(base_url: impl Into<String>) -> Result<Self, RenderError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![(
                PREDICTION_TEMPLATE,
                include_str!("../../../templates/emails/prediction.html"),
            )])
            .map_err(|e| RenderError::RenderFailed(e.to_string()))?;

        Ok(Self {
            engine,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn build_context(&self, prediction: &Prediction) -> Context {
        let mut context = Context::new();
        context.insert("title", prediction.title());
        context.insert("body", prediction.body());
        context.insert("odds", &format!("{:.2}", prediction.odds()));
        context.insert("prediction_type", prediction.prediction_type());
        context.insert(
            "scheduled_at",
            &prediction
                .scheduled_at()
                .format("%a %d %b %Y, %H:%M UTC")
                .to_string(),
        );
        context.insert("league_title", &prediction.league_title().unwrap_or(""));
        context.insert(
            "url",
            &format!("{}{}", self.base_url, prediction.public_path()),
        );
        context
    }
}

impl ContentRenderer for TemplateRenderer {
    fn render(&self, template_name: &str, prediction: &Prediction) -> Result<Vec<u8>, RenderError> {
        if !self
            .engine
            .get_template_names()
            .any(|name| name == template_name)
        {
            return Err(RenderError::TemplateNotFound(template_name.to_string()));
        }

        let context = self.build_context(prediction);
        self.engine
            .render(template_name, &context)
            .map(String::into_bytes)
            .map_err(|e| RenderError::RenderFailed(e.to_string()))
    }
}
