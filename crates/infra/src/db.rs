//! # PostgreSQL データベース接続管理
//!
//! データベース接続プールの作成と、ストア呼び出しのタイムアウト制御を行う。
//!
//! ## 設計方針
//!
//! - **接続プール**: 起動時に一度だけ作成し、アプリケーション全体で共有する
//! - **タイムアウト**: 接続取得は `acquire_timeout`、クエリ全体は [`with_timeout`] で制限する
//! - **マイグレーションは行わない**: スキーマは運用側で適用する（`migrations/` はテスト用フィクスチャ）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use tipster_infra::db;
//!
//! async fn example() -> Result<(), tipster_infra::InfraError> {
//!     let pool = db::create_pool("postgres://localhost/tipster", Duration::from_secs(3))?;
//!     db::ping(&pool, Duration::from_secs(3)).await?;
//!     Ok(())
//! }
//! ```

use std::{future::Future, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::error::InfraError;

/// PostgreSQL 接続プールを作成する
///
/// - `max_connections(10)`: 最大接続数
/// - `acquire_timeout`: 接続取得のタイムアウト（ストアタイムアウトと同じ値）
///
/// 接続は遅延確立するため、DB が停止していても起動は成功する。
/// 稼働確認は `/health/ready` で行う。
pub fn create_pool(database_url: &str, acquire_timeout: Duration) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)?;
    Ok(pool)
}

/// ストア呼び出しをタイムアウト付きで実行する
///
/// 期限を超えた場合、実行中のクエリ future はドロップされ [`InfraError::timeout`] を返す。
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, InfraError>
where
    F: Future<Output = Result<T, InfraError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(InfraError::timeout(format!(
            "ストア呼び出しが {} ms 以内に完了しませんでした",
            limit.as_millis()
        ))),
    }
}

/// DB への疎通を確認する（Readiness Check 用）
pub async fn ping(pool: &PgPool, limit: Duration) -> Result<(), InfraError> {
    with_timeout(limit, async {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    })
    .await
}
