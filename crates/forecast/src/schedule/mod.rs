//! Cron simulation: expands a schedule into concrete firing instants.
//!
//! Expressions use standard 5-field cron (`min hour dom month dow`). They are
//! validated and normalized here, then evaluated with the `cron` crate. A
//! [`SimulationWindow`] bounds every expansion, so each sequence is finite.

pub(crate) mod cron;
mod firings;
mod window;

#[cfg(test)]
mod tests;

pub use self::cron::CronSchedule;
pub use self::firings::{simulate_job, FiringEvent, Firings};
pub use self::window::{truncate_to_minute, SimulationWindow};
