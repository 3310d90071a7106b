//! Synthetic flights for exercising tasks.

pub mod flight;
pub mod paths;

pub use flight::{fly, plan_turns, FlightLog, FlightPlan};
pub use paths::{FlightPath, LinearPath, RoutePath};
