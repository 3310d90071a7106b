//! Numeric searches over glide solutions.
//!
//! Every solver is a pure function of a leg snapshot, the aircraft state and
//! the polar. Results are returned for the caller to apply.

pub mod best_mc;
pub mod cruise_efficiency;
pub mod glide_required;
pub mod min_target;
pub mod opt_target;
pub mod zero_finder;

/// Upper bound of MacCready searches in m/s.
pub const MC_MAX: f64 = 10.0;

pub use best_mc::best_mc;
pub use cruise_efficiency::{cruise_efficiency, effective_mc};
pub use glide_required::required_glide;
pub use min_target::{min_target, target_legs, TargetPoint};
pub use opt_target::opt_target;
pub use zero_finder::{find_min, find_zero};
