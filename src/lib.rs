pub mod board;
pub mod constants;
pub mod engine;
pub mod entity;
pub mod error;
pub mod logging;
pub mod pathfind;
pub mod rng;
pub mod server_protocol;
pub mod types;
