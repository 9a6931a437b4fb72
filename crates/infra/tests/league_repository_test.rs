//! LeagueRepository 統合テスト

mod common;

use common::{draft_in_league, kickoff, league_repo, now, prediction_repo};
use sqlx::PgPool;
use tipster_infra::repository::{LeagueRepository, PredictionRepository};

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_allはタイトル順で返す(pool: PgPool) {
    let repo = league_repo(&pool);
    repo.insert("Serie A", now()).await.unwrap();
    repo.insert("Bundesliga", now()).await.unwrap();

    let titles: Vec<String> = repo
        .find_all()
        .await
        .unwrap()
        .iter()
        .map(|l| l.title().to_string())
        .collect();

    assert_eq!(titles, vec!["Bundesliga", "Serie A"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_updateでタイトルが変わる(pool: PgPool) {
    let repo = league_repo(&pool);
    let league = repo.insert("La Liga", now()).await.unwrap();

    repo.update(&league.clone().with_title("LaLiga EA Sports".to_string(), now()))
        .await
        .unwrap();

    let stored = repo.find_by_id(league.id()).await.unwrap().unwrap();
    assert_eq!(stored.title(), "LaLiga EA Sports");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_リーグを削除しても予想記事は残りリーグ参照がnullになる(pool: PgPool) {
    let leagues = league_repo(&pool);
    let league = leagues.insert("Premier League", now()).await.unwrap();
    let predictions = prediction_repo(&pool);
    let id = predictions
        .insert(
            &draft_in_league("Derby Day", kickoff(2, 15), league.id()),
            now(),
        )
        .await
        .unwrap();

    assert!(leagues.delete(league.id()).await.unwrap());

    let prediction = predictions.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(prediction.league_id(), None);
    assert_eq!(prediction.league_title(), None);
}
