//! # リーグ
//!
//! 予想記事のグルーピング単位。予想記事は任意で 1 つのリーグを参照する。
//! リーグを削除しても予想記事は削除されない（参照は DB 側で NULL になる）。

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// リーグ ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct LeagueId(i64);

impl LeagueId {
    /// 整数から ID を作成する（0 以下は不正）
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::Validation(format!(
                "リーグ ID は正の整数である必要があります: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::Validation(format!("リーグ ID の形式が不正です: {raw:?}")))?;
        Self::new(value)
    }

    pub fn from_db(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// リーグエンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct League {
    id:         LeagueId,
    title:      String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl League {
    pub fn from_db(
        id: LeagueId,
        title: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> LeagueId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// タイトルを変更した新しいインスタンスを返す
    pub fn with_title(self, title: String, now: DateTime<Utc>) -> Self {
        Self {
            title,
            updated_at: now,
            ..self
        }
    }
}

/// リーグタイトルを検証する
///
/// 前後の空白を除去し、空文字列を拒否する。
pub fn validate_league_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("リーグ名は必須です".to_string()));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_idは0以下を拒否する() {
        assert!(LeagueId::new(0).is_err());
        assert!(LeagueId::new(-1).is_err());
        assert_eq!(LeagueId::new(3).unwrap().as_i64(), 3);
    }

    #[test]
    fn test_validate_league_titleは空白のみを拒否する() {
        assert!(validate_league_title("   ").is_err());
        assert_eq!(
            validate_league_title(" Premier League ").unwrap(),
            "Premier League"
        );
    }

    #[test]
    fn test_with_titleでタイトルと更新日時が変わる() {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let now = DateTime::from_timestamp(1_700_000_600, 0).unwrap();
        let league = League::from_db(
            LeagueId::new(1).unwrap(),
            "La Liga".to_string(),
            created,
            created,
        );

        let renamed = league.with_title("LaLiga EA Sports".to_string(), now);

        assert_eq!(renamed.title(), "LaLiga EA Sports");
        assert_eq!(renamed.created_at(), created);
        assert_eq!(renamed.updated_at(), now);
    }
}
