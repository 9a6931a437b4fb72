//! # 購読者
//!
//! メーリングリストへの購読申し込みで受け付けるメールアドレス。
//! ローカルには保存せず、検証後にプロバイダのリストへ登録する。

use derive_more::Display;
use validator::ValidateEmail;

use crate::DomainError;

/// 購読者メールアドレス
///
/// 標準的なアドレス形式の検証（`validator` クレート）を通過した値のみを保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// メールアドレスを作成する
    ///
    /// 前後の空白は除去する。空文字列・形式不正・254 文字超は `DomainError::Validation`。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        if value.chars().count() > 254 {
            return Err(DomainError::Validation(
                "メールアドレスは 254 文字以内である必要があります".to_string(),
            ));
        }

        if !value.validate_email() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("fan@example.com")]
    #[case("  fan+derby@example.co.uk ")]
    #[case("first.last@sub.example.org")]
    fn test_正しい形式のアドレスを受け付ける(#[case] raw: &str) {
        let email = SubscriberEmail::new(raw).unwrap();
        assert_eq!(email.as_str(), raw.trim());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-an-email")]
    #[case("@example.com")]
    #[case("fan@")]
    #[case("fan example@example.com")]
    fn test_不正な形式のアドレスを拒否する(#[case] raw: &str) {
        assert!(matches!(
            SubscriberEmail::new(raw),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_長すぎるアドレスを拒否する() {
        let raw = format!("{}@example.com", "a".repeat(250));
        assert!(SubscriberEmail::new(raw).is_err());
    }
}
