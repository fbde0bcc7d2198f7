//! Terminal viewer for the foreground time each application got today, as reported by the
//! platform usage statistics service. Nothing is stored: the view asks the platform again on
//! start, every 5 minutes and whenever the user requests it.
//!

pub mod bridge;
pub mod cli;
pub mod refresh;
pub mod usage;
pub mod utils;
