//! Technical control of a weightlifting session: attempts, referee and jury
//! decisions, lifting order, the attempt clock and weight changes.

pub mod attempts;
pub mod error;
pub mod events;
pub mod jury;
pub mod lifting_order;
pub mod locks;
pub mod referee;
pub mod standings;
pub mod timer;
pub mod weight_change;

#[cfg(test)]
mod test_support;

pub use attempts::{AttemptStateMachine, Declaration};
pub use error::{ControlError, Result};
pub use events::{ChannelBroadcaster, DomainEvent, EventBroadcaster, InMemoryBroadcaster};
pub use lifting_order::{LiftingOrderCalculator, LiftingOrderEntry, LiftingPositions};
pub use standings::{StandingsEntry, StandingsService};
pub use timer::{TimerConfig, TimerHint, TimerRegistry, TimerSnapshot};
pub use weight_change::WeightChangeGovernor;
