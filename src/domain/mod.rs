pub mod boat;
pub mod catalog;
pub mod status;
pub mod units;
