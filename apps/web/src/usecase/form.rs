//! # フォーム入力の検証
//!
//! 管理画面フォームの検証結果をフィールド単位のエラーとして集約する。

use std::collections::BTreeMap;

use serde::Serialize;

/// フィールド名 → エラーメッセージ
///
/// 最初に見つかったエラーのみ保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// エラーがなければ `value` を返す
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// `field: message` 形式の要約
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// チェックボックスの値を解釈する
///
/// HTML フォームは未チェックの項目を送信しない。送信された場合は
/// `false` / `off` / `0` / 空文字列以外を true とみなす。
pub fn parse_checkbox(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "off" | "0"
        ),
    }
}
