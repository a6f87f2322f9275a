pub mod athlete;
pub mod attempt;
pub mod session;
pub mod weight_change;
