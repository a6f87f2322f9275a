mod athlete;
mod attempt;
mod lift_type;
mod session;
mod timer;
mod weight_change;

pub use athlete::{Athlete, AthleteRow, Medal};
pub use attempt::{
    Attempt, AttemptResult, AttemptRow, AttemptState, Decision, RefereeCall, RefereePosition,
};
pub use lift_type::LiftType;
pub use session::Session;
pub use timer::{TimerMode, TimerPreset};
pub use weight_change::{WeightChangeRequest, WeightChangeRow};
