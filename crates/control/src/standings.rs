//! Session standings: rank by total, then lighter body weight, then lot.

use std::cmp::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storage::RecordStore;
use storage::models::{Athlete, Medal};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{NotFoundExt, Result};
use crate::locks::KeyedLocks;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StandingsEntry {
    pub rank: Option<i32>,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub start_number: i32,
    pub lot_number: Option<i32>,
    pub bodyweight: Option<Decimal>,
    pub best_snatch: Option<Decimal>,
    pub best_clean_and_jerk: Option<Decimal>,
    pub total: Option<Decimal>,
    pub medal: Option<Medal>,
    pub is_disqualified: bool,
}

/// Ranked athletes first, then everyone without a rank by start number.
/// Disqualified athletes and athletes without a total are never ranked.
pub fn rank_athletes(athletes: &[Athlete]) -> Vec<StandingsEntry> {
    let (mut ranked, mut unranked): (Vec<&Athlete>, Vec<&Athlete>) = athletes
        .iter()
        .partition(|a| !a.is_disqualified && a.total.is_some());

    ranked.sort_by(|a, b| compare_for_rank(a, b));
    unranked.sort_by_key(|a| a.start_number);

    let ranked = ranked.into_iter().enumerate().map(|(index, athlete)| {
        let rank = index as i32 + 1;
        entry(athlete, Some(rank), Medal::for_rank(rank))
    });
    let unranked = unranked.into_iter().map(|athlete| entry(athlete, None, None));

    ranked.chain(unranked).collect()
}

fn compare_for_rank(a: &Athlete, b: &Athlete) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| last_if_missing(a.bodyweight, b.bodyweight))
        .then_with(|| last_if_missing(a.lot_number, b.lot_number))
        .then_with(|| a.start_number.cmp(&b.start_number))
}

fn last_if_missing<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn entry(athlete: &Athlete, rank: Option<i32>, medal: Option<Medal>) -> StandingsEntry {
    StandingsEntry {
        rank,
        athlete_id: athlete.athlete_id,
        athlete_name: athlete.full_name(),
        start_number: athlete.start_number,
        lot_number: athlete.lot_number,
        bodyweight: athlete.bodyweight,
        best_snatch: athlete.best_snatch,
        best_clean_and_jerk: athlete.best_clean_and_jerk,
        total: athlete.total,
        medal,
        is_disqualified: athlete.is_disqualified,
    }
}

pub struct StandingsService {
    store: Arc<dyn RecordStore>,
    athlete_locks: Arc<KeyedLocks>,
}

impl StandingsService {
    pub fn new(store: Arc<dyn RecordStore>, athlete_locks: Arc<KeyedLocks>) -> Self {
        Self {
            store,
            athlete_locks,
        }
    }

    /// Computes the standings and persists rank and medal on every athlete
    /// whose placing changed.
    pub async fn standings(&self, session_id: Uuid) -> Result<Vec<StandingsEntry>> {
        self.store
            .find_session(session_id)
            .await
            .or_not_found("Session", session_id)?;

        let athletes = self.store.list_session_athletes(session_id).await?;
        let standings = rank_athletes(&athletes);

        let mut updated = 0;
        for placing in &standings {
            let _guard = self.athlete_locks.acquire(placing.athlete_id).await;
            let mut athlete = self
                .store
                .find_athlete(placing.athlete_id)
                .await
                .or_not_found("Athlete", placing.athlete_id)?;

            if athlete.rank != placing.rank || athlete.medal != placing.medal {
                athlete.rank = placing.rank;
                athlete.medal = placing.medal;
                self.store.update_athlete(&athlete).await?;
                updated += 1;
            }
        }

        if updated > 0 {
            info!(session_id = %session_id, updated, "Standings updated");
        }

        Ok(standings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_athlete, seed_session};
    use storage::MemoryStore;

    fn kg(value: i64) -> Decimal {
        Decimal::from(value)
    }

    async fn finished(
        store: &MemoryStore,
        session_id: Uuid,
        start_number: i32,
        bodyweight: i64,
        total: Option<i64>,
    ) -> Athlete {
        let mut athlete = seed_athlete(store, session_id, start_number, Some(start_number), kg(100)).await;
        athlete.bodyweight = Some(kg(bodyweight));
        athlete.total = total.map(kg);
        store.update_athlete(&athlete).await.unwrap();
        athlete
    }

    #[tokio::test]
    async fn test_rank_by_total_then_bodyweight() {
        let store = Arc::new(MemoryStore::new());
        let session = seed_session(store.as_ref()).await;
        let heavy = finished(&store, session.session_id, 1, 88, Some(300)).await;
        let light = finished(&store, session.session_id, 2, 86, Some(300)).await;
        let best = finished(&store, session.session_id, 3, 89, Some(310)).await;
        let fourth = finished(&store, session.session_id, 4, 85, Some(250)).await;

        let service = StandingsService::new(store.clone(), Arc::new(KeyedLocks::new()));
        let standings = service.standings(session.session_id).await.unwrap();

        let order: Vec<Uuid> = standings.iter().map(|s| s.athlete_id).collect();
        assert_eq!(
            order,
            vec![best.athlete_id, light.athlete_id, heavy.athlete_id, fourth.athlete_id]
        );
        assert_eq!(standings[0].medal, Some(Medal::Gold));
        assert_eq!(standings[2].medal, Some(Medal::Bronze));
        assert_eq!(standings[3].medal, None);
        assert_eq!(standings[3].rank, Some(4));

        let stored = store.find_athlete(light.athlete_id).await.unwrap();
        assert_eq!(stored.rank, Some(2));
        assert_eq!(stored.medal, Some(Medal::Silver));
    }

    #[tokio::test]
    async fn test_no_rank_without_total_or_when_disqualified() {
        let store = Arc::new(MemoryStore::new());
        let session = seed_session(store.as_ref()).await;
        let bombed = finished(&store, session.session_id, 1, 88, None).await;
        let mut dq = finished(&store, session.session_id, 2, 88, Some(320)).await;
        dq.is_disqualified = true;
        store.update_athlete(&dq).await.unwrap();
        let winner = finished(&store, session.session_id, 3, 88, Some(280)).await;

        let service = StandingsService::new(store.clone(), Arc::new(KeyedLocks::new()));
        let standings = service.standings(session.session_id).await.unwrap();

        assert_eq!(standings[0].athlete_id, winner.athlete_id);
        assert_eq!(standings[0].rank, Some(1));
        assert_eq!(standings[1].athlete_id, bombed.athlete_id);
        assert_eq!(standings[1].rank, None);
        assert_eq!(standings[2].athlete_id, dq.athlete_id);
        assert_eq!(standings[2].medal, None);
        assert!(standings[2].is_disqualified);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = Arc::new(MemoryStore::new());
        let service = StandingsService::new(store, Arc::new(KeyedLocks::new()));
        let err = service.standings(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, crate::error::ControlError::NotFound(_)));
    }
}
