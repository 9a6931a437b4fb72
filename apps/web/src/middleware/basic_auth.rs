//! # Basic 認証ミドルウェア
//!
//! 管理画面（`/admin/*`）を単一の管理者アカウントで保護する。
//!
//! ユーザー名は定数時間比較、パスワードは Argon2id ハッシュで検証する。
//! 認証に失敗した場合は `WWW-Authenticate` ヘッダー付きの 401 を返す。
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/admin", get(admin_list_predictions))
//!     .layer(from_fn_with_state(basic_auth_state, require_basic_auth))
//! ```

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use subtle::ConstantTimeEq;
use tipster_domain::password::{AdminAccount, PlainPassword};
use tipster_infra::PasswordChecker;
use tipster_shared::{
    ErrorResponse,
    event_log::{
        error::{category, kind},
        event,
    },
    log_business_event,
};

use crate::error::WebError;

/// 401 応答に付与するチャレンジ
const CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;

/// Basic 認証ミドルウェアの状態
#[derive(Clone)]
pub struct BasicAuthState {
    pub account: AdminAccount,
    pub checker: Arc<dyn PasswordChecker>,
}

/// Basic 認証ミドルウェア
pub async fn require_basic_auth(
    State(state): State<BasicAuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some((username, password)) = parse_credentials(request.headers()) else {
        return unauthorized_response();
    };

    let username_matches: bool = username
        .as_bytes()
        .ct_eq(state.account.username.as_bytes())
        .into();

    let password_matches = match state
        .checker
        .verify(&password, &state.account.password_hash)
    {
        Ok(result) => result.is_match(),
        Err(e) => {
            tracing::error!(
                error.category = category::INFRASTRUCTURE,
                error.kind = kind::PASSWORD_VERIFICATION,
                error = %e,
                "パスワード検証に失敗"
            );
            return WebError::Internal("パスワード検証に失敗".to_string()).into_response();
        }
    };

    if !(username_matches && password_matches) {
        log_business_event!(
            event.category = event::category::AUTH,
            event.action = event::action::BASIC_AUTH_FAILURE,
            event.result = event::result::FAILURE,
            "管理画面の認証に失敗"
        );
        return unauthorized_response();
    }

    next.run(request).await
}

/// `Authorization: Basic <base64(username:password)>` を分解する
fn parse_credentials(headers: &HeaderMap) -> Option<(String, PlainPassword)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), PlainPassword::new(password)))
}

fn unauthorized_response() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::unauthorized("認証が必要です")),
    )
        .into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(CHALLENGE),
    );
    response
}
