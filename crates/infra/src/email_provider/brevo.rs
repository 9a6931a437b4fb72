//! Brevo メールプロバイダ実装
//!
//! Brevo v3 REST API を使用する。認証は `api-key` ヘッダー。
//!
//! | 操作 | エンドポイント | 成功時 |
//! |------|--------------|-------|
//! | キャンペーン作成 | `POST /emailCampaigns` | `201 {"id": n}` |
//! | 即時送信 | `POST /emailCampaigns/{id}/sendNow` | `204` |
//! | 購読者登録 | `POST /contacts` | `201` / `204` |
//!
//! エラー時のボディ `{"code", "message"}` は [`ProviderError::Rejected`] にそのまま保持する。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tipster_domain::{
    campaign::{CampaignDraft, CampaignId, ListId, ProviderError},
    subscriber::SubscriberEmail,
};

use super::EmailProvider;

/// Brevo メールプロバイダ
#[derive(Clone)]
pub struct BrevoEmailProvider {
    base_url: String,
    api_key:  String,
    client:   reqwest::Client,
}

impl std::fmt::Debug for BrevoEmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrevoEmailProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl BrevoEmailProvider {
    /// 新しいクライアントを作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: API のベース URL（例: `https://api.brevo.com/v3`）
    /// - `api_key`: API キー
    /// - `timeout`: 1 リクエストあたりのタイムアウト
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("HTTP クライアント構築失敗: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }
}

// --- リクエスト / レスポンス型 ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCampaignRequest<'a> {
    name:                    &'a str,
    subject:                 &'a str,
    sender:                  SenderBody<'a>,
    html_content:            &'a str,
    recipients:              Recipients,
    inline_image_activation: bool,
    send_at_best_time:       bool,
    ab_testing:              bool,
    ip_warmup_enable:        bool,
}

impl<'a> CreateCampaignRequest<'a> {
    fn from_draft(draft: &'a CampaignDraft) -> Self {
        Self {
            name:                    &draft.name,
            subject:                 &draft.subject,
            sender:                  SenderBody {
                name:  &draft.sender.name,
                email: &draft.sender.email,
            },
            html_content:            &draft.html_content,
            recipients:              Recipients {
                list_ids: vec![draft.list_id.as_i64()],
            },
            inline_image_activation: false,
            send_at_best_time:       false,
            ab_testing:              false,
            ip_warmup_enable:        false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SenderBody<'a> {
    name:  &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipients {
    list_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContactRequest<'a> {
    email:          &'a str,
    list_ids:       Vec<i64>,
    update_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code:    String,
    message: String,
}

// --- レスポンスハンドリング ---

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// エラーレスポンスを [`ProviderError::Rejected`] に変換する
///
/// ボディが `{"code", "message"}` 形式でない場合はボディ全体を message に入れる。
async fn rejection(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => ProviderError::Rejected {
            status,
            code: error.code,
            message: error.message,
        },
        Err(_) => ProviderError::Rejected {
            status,
            code: "unknown".to_string(),
            message: body,
        },
    }
}

/// キャンペーン作成レスポンスから ID を取り出す
async fn parse_created(response: reqwest::Response) -> Result<CampaignId, ProviderError> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    let created: CreatedResponse = serde_json::from_str(&body).map_err(|e| {
        ProviderError::UnexpectedResponse(format!("キャンペーン ID を読み取れません: {e}: {body}"))
    })?;
    Ok(CampaignId::new(created.id))
}

#[async_trait]
impl EmailProvider for BrevoEmailProvider {
    #[tracing::instrument(skip_all, fields(campaign.name = %draft.name))]
    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, ProviderError> {
        let response = self
            .post("/emailCampaigns", &CreateCampaignRequest::from_draft(draft))
            .await?;
        parse_created(response).await
    }

    #[tracing::instrument(skip_all, fields(campaign.id = %campaign_id))]
    async fn send_campaign_now(&self, campaign_id: CampaignId) -> Result<(), ProviderError> {
        self.post(
            &format!("/emailCampaigns/{campaign_id}/sendNow"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(%list_id))]
    async fn upsert_contact(
        &self,
        email: &SubscriberEmail,
        list_id: ListId,
    ) -> Result<(), ProviderError> {
        let body = CreateContactRequest {
            email:          email.as_str(),
            list_ids:       vec![list_id.as_i64()],
            update_enabled: true,
        };
        self.post("/contacts", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tipster_domain::campaign::SenderIdentity;

    use super::*;

    /// テスト用の HTTP レスポンスを構築する
    fn make_response(status: u16, body: &str) -> reqwest::Response {
        let http_resp = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body.to_string())
            .unwrap();
        reqwest::Response::from(http_resp)
    }

    fn make_draft() -> CampaignDraft {
        CampaignDraft {
            name:         "Prediction Derby Day 2026-05-01 08:30:00 UTC".to_string(),
            subject:      "New Prediction Just Now!".to_string(),
            sender:       SenderIdentity {
                name:  "Sport Predict".to_string(),
                email: "newsletter@sportpredict.example.com".to_string(),
            },
            html_content: "<p>Derby Day</p>".to_string(),
            list_id:      ListId::new(9),
        }
    }

    #[test]
    fn test_キャンペーン作成リクエストのjson形状() {
        let draft = make_draft();
        let json = serde_json::to_value(CreateCampaignRequest::from_draft(&draft)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "Prediction Derby Day 2026-05-01 08:30:00 UTC",
                "subject": "New Prediction Just Now!",
                "sender": {
                    "name": "Sport Predict",
                    "email": "newsletter@sportpredict.example.com"
                },
                "htmlContent": "<p>Derby Day</p>",
                "recipients": { "listIds": [9] },
                "inlineImageActivation": false,
                "sendAtBestTime": false,
                "abTesting": false,
                "ipWarmupEnable": false
            })
        );
    }

    #[test]
    fn test_購読者登録リクエストはupdate_enabledを含む() {
        let body = CreateContactRequest {
            email:          "fan@example.com",
            list_ids:       vec![9],
            update_enabled: true,
        };

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({
                "email": "fan@example.com",
                "listIds": [9],
                "updateEnabled": true
            })
        );
    }

    #[tokio::test]
    async fn test_作成レスポンスからキャンペーンidを取り出す() {
        let response = make_response(201, r#"{"id": 1001}"#);

        let id = parse_created(response).await.unwrap();

        assert_eq!(id, CampaignId::new(1001));
    }

    #[tokio::test]
    async fn test_作成レスポンスにidがなければunexpected_response() {
        let response = make_response(201, r#"{"status": "ok"}"#);

        let result = parse_created(response).await;

        assert!(matches!(result, Err(ProviderError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_エラーボディのcodeとmessageをそのまま保持する() {
        let response = make_response(
            400,
            r#"{"code": "invalid_parameter", "message": "listIds is invalid"}"#,
        );

        let error = rejection(response).await;

        assert_eq!(
            error,
            ProviderError::Rejected {
                status:  400,
                code:    "invalid_parameter".to_string(),
                message: "listIds is invalid".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_json以外のエラーボディはmessageに入る() {
        let response = make_response(502, "Bad Gateway");

        let error = rejection(response).await;

        assert_eq!(
            error,
            ProviderError::Rejected {
                status:  502,
                code:    "unknown".to_string(),
                message: "Bad Gateway".to_string(),
            }
        );
    }

    #[test]
    fn test_debug出力でapi_keyがマスクされる() {
        let provider = BrevoEmailProvider::new(
            "https://api.brevo.com/v3/",
            "xkeysib-secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let debug = format!("{provider:?}");
        assert!(!debug.contains("xkeysib-secret"));
        assert!(debug.contains("https://api.brevo.com/v3\""));
    }
}
