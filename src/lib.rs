//! Battery energy-storage sizing from metered load and PV series.
//!
//! A [`TimeSeries`](sim::types::TimeSeries) is dispatched under a
//! [`DispatchPolicy`](sim::policy::DispatchPolicy), integrated into a state of
//! charge and reduced by a [`SizingMethod`](sim::sizing::SizingMethod) to the
//! power and energy rating the policy needs. [`runner::SizingRun`] wires the
//! steps together.

pub mod config;
pub mod error;
pub mod io;
pub mod reporting;
pub mod runner;
/// Dispatch, integration and sizing engine.
pub mod sim;

pub use error::{ConfigurationError, Error, ValidationError};
