//! PredictionRepository 統合テスト
//!
//! sqlx::test マクロでテストごとに空のデータベースを作成し、
//! `migrations/` のスキーマを適用する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/tipster_test cargo test -p tipster-infra --test prediction_repository_test
//! ```

mod common;

use chrono::Duration;
use common::{draft, draft_in_league, kickoff, league_repo, now, prediction_repo};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use tipster_domain::prediction::PredictionId;
use tipster_infra::repository::{LeagueRepository, PredictionRepository};

#[sqlx::test(migrations = "../../migrations")]
async fn test_insertした予想記事をidで取得できる(pool: PgPool) {
    let repo = prediction_repo(&pool);

    let id = repo.insert(&draft("Derby Day", kickoff(2, 15)), now()).await.unwrap();

    let found = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.id(), id);
    assert_eq!(found.title(), "Derby Day");
    assert_eq!(found.slug().as_str(), "derby-day-1x2-2026-05-02");
    assert!(!found.is_campaigned());
    assert_eq!(found.created_at(), now());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しないidの場合noneを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);

    let found = repo.find_by_id(PredictionId::new(999).unwrap()).await.unwrap();

    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_スラッグで取得でき_リーグ名が結合される(pool: PgPool) {
    let league = league_repo(&pool).insert("Premier League", now()).await.unwrap();
    let repo = prediction_repo(&pool);
    repo.insert(
        &draft_in_league("Derby Day", kickoff(2, 15), league.id()),
        now(),
    )
    .await
    .unwrap();

    let found = repo
        .find_by_slug("derby-day-1x2-2026-05-02")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.league_id(), Some(league.id()));
    assert_eq!(found.league_title(), Some("Premier League"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_スラッグが重複するとconflictを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);
    repo.insert(&draft("Derby Day", kickoff(2, 15)), now()).await.unwrap();

    let err = repo
        .insert(&draft("Derby Day", kickoff(2, 18)), now())
        .await
        .unwrap_err();

    assert_eq!(
        err.as_conflict(),
        Some(("Prediction", "derby-day-1x2-2026-05-02"))
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_mark_campaignedで配信済みになり_2回目はfalseを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);
    let id = repo.insert(&draft("Derby Day", kickoff(2, 15)), now()).await.unwrap();
    let later = now() + Duration::minutes(5);

    let first = repo.mark_campaigned(id, later).await.unwrap();
    let second = repo
        .mark_campaigned(id, later + Duration::minutes(1))
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.is_campaigned());
    assert_eq!(stored.updated_at(), later);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しない予想記事のmark_campaignedはfalseを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);

    let marked = repo
        .mark_campaigned(PredictionId::new(999).unwrap(), now())
        .await
        .unwrap();

    assert!(!marked);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_配信前に読んだ記事を配信後に保存しても配信済みフラグは戻らない(pool: PgPool) {
    let repo = prediction_repo(&pool);
    let id = repo.insert(&draft("Derby Day", kickoff(2, 15)), now()).await.unwrap();
    let stale = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(repo.mark_campaigned(id, now()).await.unwrap());

    let edited = stale.with_draft(draft("Cup Final", kickoff(9, 15)), now());
    repo.update(&edited).await.unwrap();

    let stored = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.is_campaigned());
    assert_eq!(stored.slug().as_str(), "cup-final-1x2-2026-05-09");
    assert!(!repo.mark_campaigned(id, now()).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_upcomingはリーグ名_予定日時の順で過去とアーカイブを除く(pool: PgPool) {
    let leagues = league_repo(&pool);
    let serie_a = leagues.insert("Serie A", now()).await.unwrap();
    let la_liga = leagues.insert("La Liga", now()).await.unwrap();
    let repo = prediction_repo(&pool);

    repo.insert(&draft_in_league("Milan Derby", kickoff(3, 18), serie_a.id()), now())
        .await
        .unwrap();
    repo.insert(&draft_in_league("El Clasico", kickoff(4, 20), la_liga.id()), now())
        .await
        .unwrap();
    repo.insert(&draft_in_league("Seville Derby", kickoff(2, 20), la_liga.id()), now())
        .await
        .unwrap();
    repo.insert(&draft("Old Match", kickoff(1, 10) - Duration::days(7)), now())
        .await
        .unwrap();
    let mut archived = draft("Archived Match", kickoff(5, 10));
    archived.is_archived = true;
    repo.insert(&archived, now()).await.unwrap();

    let from = kickoff(1, 0);
    let titles = |list: Vec<tipster_domain::prediction::Prediction>| {
        list.iter().map(|p| p.title().to_string()).collect::<Vec<_>>()
    };

    let public = repo.find_upcoming(from, false).await.unwrap();
    assert_eq!(
        titles(public),
        vec!["Seville Derby", "El Clasico", "Milan Derby"]
    );

    let admin = repo.find_upcoming(from, true).await.unwrap();
    assert_eq!(
        titles(admin),
        vec!["Seville Derby", "El Clasico", "Milan Derby", "Archived Match"]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_featuredは注目かつ非アーカイブのみ(pool: PgPool) {
    let repo = prediction_repo(&pool);
    let mut featured = draft("Featured Match", kickoff(3, 15));
    featured.is_featured = true;
    repo.insert(&featured, now()).await.unwrap();
    let mut featured_archived = draft("Featured Archived", kickoff(3, 18));
    featured_archived.is_featured = true;
    featured_archived.is_archived = true;
    repo.insert(&featured_archived, now()).await.unwrap();
    repo.insert(&draft("Plain Match", kickoff(3, 20)), now())
        .await
        .unwrap();

    let found = repo.find_featured(kickoff(1, 0)).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title(), "Featured Match");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_deleteで削除され_2回目はfalseを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);
    let id = repo.insert(&draft("Derby Day", kickoff(2, 15)), now()).await.unwrap();

    assert!(repo.delete(id).await.unwrap());
    assert!(!repo.delete(id).await.unwrap());
    assert!(repo.find_by_id(id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しないリーグを参照するとinvalid_inputを返す(pool: PgPool) {
    let repo = prediction_repo(&pool);
    let orphan = draft_in_league(
        "Derby Day",
        kickoff(2, 15),
        tipster_domain::league::LeagueId::new(404).unwrap(),
    );

    let err = repo.insert(&orphan, now()).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        tipster_infra::InfraErrorKind::InvalidInput(_)
    ));
}
