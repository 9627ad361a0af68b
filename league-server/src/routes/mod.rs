//! HTTP route handlers

pub mod agents;
pub mod leagues;
pub mod matches;
pub mod rankings;
pub mod status;
