//! Glide polar and MacCready solutions.

pub mod maccready;
pub mod polar;
pub mod result;
pub mod state;

pub use maccready::{GlideLeg, MacCready, TaskGlide, TaskMacCready};
pub use polar::{GlidePolar, GlideSettings, PolarCoefficients};
pub use result::{GlideResult, GlideResultValidity};
pub use state::GlideState;
