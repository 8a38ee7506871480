//! Terminal front-end for agpulse.

pub mod status;
pub mod ui;
