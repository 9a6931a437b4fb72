//! # パスワード検証
//!
//! 管理画面の Basic 認証で使う Argon2id パスワード検証を提供する。
//!
//! 検証時のコストパラメータはハッシュ文字列（PHC 形式）に埋め込まれた値を使う。

use argon2::{Argon2, PasswordVerifier as _, password_hash::PasswordHash as Argon2PasswordHash};
use tipster_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// パスワード検証を担当するトレイト
pub trait PasswordChecker: Send + Sync {
    /// パスワードを検証する
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;
}

/// Argon2id によるパスワード検証の実装
#[derive(Default)]
pub struct Argon2PasswordChecker {
    argon2: Argon2<'static>,
}

impl Argon2PasswordChecker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordChecker for Argon2PasswordChecker {
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let parsed = Argon2PasswordHash::new(hash.as_str())
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        let matched = self
            .argon2
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok();

        Ok(PasswordVerifyResult::from(matched))
    }
}

/// ハッシュ文字列が PHC 形式として読めるかを確認する（起動時の設定検証用）
pub fn validate_hash_format(hash: &PasswordHash) -> Result<(), InfraError> {
    Argon2PasswordHash::new(hash.as_str())
        .map(|_| ())
        .map_err(|e| InfraError::invalid_input(format!("不正なハッシュ形式: {e}")))
}
