use chrono::Utc;
use rust_decimal::Decimal;
use storage::RecordStore;
use storage::models::{Athlete, Session};
use uuid::Uuid;

pub(crate) async fn seed_session(store: &dyn RecordStore) -> Session {
    let session = Session::new("Men 89 A");
    store.insert_session(&session).await.unwrap();
    session
}

/// Weighed-in athlete opening the clean & jerk 20kg above the snatch.
pub(crate) async fn seed_athlete(
    store: &dyn RecordStore,
    session_id: Uuid,
    start_number: i32,
    lot_number: Option<i32>,
    opening_snatch: Decimal,
) -> Athlete {
    let athlete = Athlete {
        athlete_id: Uuid::new_v4(),
        session_id,
        first_name: format!("Lifter{}", start_number),
        last_name: "Test".to_string(),
        gender: "M".to_string(),
        bodyweight: Some(Decimal::from(88)),
        lot_number,
        start_number,
        opening_snatch,
        opening_clean_and_jerk: opening_snatch + Decimal::from(20),
        weighed_in: true,
        is_disqualified: false,
        disqualified_reason: None,
        best_snatch: None,
        best_clean_and_jerk: None,
        total: None,
        rank: None,
        medal: None,
        created_at: Utc::now(),
    };
    store.insert_athlete(&athlete).await.unwrap();
    athlete
}
