use std::sync::Arc;

use chrono::{Duration, FixedOffset, NaiveDate};
use srs_core::model::{CardId, CardRef, CardStatus, DeckId, Quality};
use srs_core::time::fixed_now;
use services::{Clock, SessionError, SessionLoopService, StatsService};
use storage::repository::{
    DeckCatalog, InMemoryRepository, ProgressRepository, ReviewLogRepository,
    SessionSummaryRepository,
};

fn card(deck: u64, id: u64) -> CardRef {
    CardRef::new(DeckId::new(deck), CardId::new(id))
}

async fn seeded(cards: &[CardRef]) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for c in cards {
        repo.add_card(*c).await.unwrap();
    }
    repo
}

fn loop_at(repo: &InMemoryRepository, clock: Clock) -> SessionLoopService {
    SessionLoopService::new(
        clock,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

async fn run_to_completion(
    svc: &SessionLoopService,
    decks: &[DeckId],
    quality: Quality,
) -> Result<i64, SessionError> {
    let mut session = svc.start_session(decks).await?;
    let mut summary_id = None;
    while !session.is_complete() {
        summary_id = svc.answer_current(&mut session, quality).await?.summary_id;
    }
    Ok(summary_id.unwrap())
}

#[tokio::test]
async fn session_loop_persists_summary() {
    let deck = DeckId::new(1);
    let repo = seeded(&[card(1, 1), card(1, 2), card(1, 3)]).await;
    let svc = loop_at(&repo, Clock::fixed(fixed_now()));

    let summary_id = run_to_completion(&svc, &[deck], Quality::Good).await.unwrap();

    let stored = repo.get_summary(summary_id).await.unwrap();
    assert_eq!(stored.deck_ids, vec![deck]);
    assert_eq!(stored.summary.total_reviews(), 3);
    assert_eq!(stored.summary.good(), 3);
    assert_eq!(stored.summary.reward(), 6);
    assert_eq!(stored.studied_on, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());

    for id in 1..=3 {
        let record = repo.load(card(1, id)).await.unwrap().unwrap();
        assert_eq!(record.status(), CardStatus::Learning);
        assert_eq!(record.interval_minutes(), 10);
        assert_eq!(repo.logs_for_card(card(1, id)).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn learning_cards_return_once_their_step_elapses() {
    let deck = DeckId::new(1);
    let repo = seeded(&[card(1, 1), card(1, 2)]).await;
    let mut clock = Clock::fixed(fixed_now());
    run_to_completion(&loop_at(&repo, clock), &[deck], Quality::Good)
        .await
        .unwrap();

    let err = loop_at(&repo, clock)
        .start_session(&[deck])
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Empty));

    clock.advance(Duration::minutes(11));
    let later = loop_at(&repo, clock);
    let plan = later.plan(&[deck]).await.unwrap();
    assert_eq!(plan.learning_selected, 2);
    assert_eq!(plan.new_selected, 0);

    run_to_completion(&later, &[deck], Quality::Good).await.unwrap();
    let record = repo.load(card(1, 1)).await.unwrap().unwrap();
    assert_eq!(record.status(), CardStatus::Review);
    assert_eq!(record.interval_minutes(), 1_440);
    assert_eq!(record.correct_count(), 2);
}

#[tokio::test]
async fn multi_deck_summary_keeps_deck_order_and_local_date() {
    let repo = seeded(&[card(2, 1), card(1, 1), card(1, 2)]).await;
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let svc = loop_at(&repo, Clock::fixed(fixed_now())).with_utc_offset(tokyo);
    let decks = [DeckId::new(2), DeckId::new(1)];

    let summary_id = run_to_completion(&svc, &decks, Quality::Easy).await.unwrap();
    let stored = repo.get_summary(summary_id).await.unwrap();
    assert_eq!(stored.deck_ids, decks.to_vec());
    assert_eq!(stored.summary.easy(), 3);
    assert_eq!(stored.studied_on, NaiveDate::from_ymd_opt(2023, 11, 15).unwrap());

    let stats = StatsService::new(
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let week = stats.weekly(stored.studied_on).await.unwrap();
    assert_eq!(week.total_studied, 3);
    assert_eq!(week.accuracy_pct, 100);
    assert_eq!(week.total_reward, 9);

    let mastery = stats.mastery(DeckId::new(1)).await.unwrap();
    assert_eq!(mastery.review, 2);
    assert_eq!(mastery.new, 0);
}
