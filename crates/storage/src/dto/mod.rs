pub mod attempt;
pub mod timer;
pub mod weight_change;
