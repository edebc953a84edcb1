pub mod charge;
pub mod engine;
pub mod feed;
pub mod plan;
pub mod schedule;
