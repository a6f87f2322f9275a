use std::sync::Arc;

use control::{
    AttemptStateMachine, EventBroadcaster, LiftingOrderCalculator, StandingsService, TimerConfig,
    TimerRegistry, WeightChangeGovernor,
};
use storage::RecordStore;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub events: Arc<dyn EventBroadcaster>,
    pub attempts: Arc<AttemptStateMachine>,
    pub weight_changes: Arc<WeightChangeGovernor>,
    pub lifting_order: Arc<LiftingOrderCalculator>,
    pub standings: Arc<StandingsService>,
    pub timers: Arc<TimerRegistry>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        events: Arc<dyn EventBroadcaster>,
        timer_config: TimerConfig,
    ) -> Self {
        let weight_changes = Arc::new(WeightChangeGovernor::new(store.clone(), events.clone()));
        let attempts = Arc::new(AttemptStateMachine::new(
            store.clone(),
            events.clone(),
            weight_changes.clone(),
        ));
        let standings = Arc::new(StandingsService::new(store.clone(), attempts.athlete_locks()));

        Self {
            lifting_order: Arc::new(LiftingOrderCalculator::new(store.clone())),
            store,
            timers: Arc::new(TimerRegistry::new(events.clone(), timer_config)),
            events,
            attempts,
            weight_changes,
            standings,
        }
    }
}
