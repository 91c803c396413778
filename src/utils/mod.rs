//! Small helpers shared across modules

pub mod humanize;
pub mod slack_ts;
