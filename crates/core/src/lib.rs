#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod time;

pub use scoring::calculate_score;
pub use time::Clock;
