pub mod catalog;
pub mod config;
pub mod constants;
pub mod flight;
pub mod game;
pub mod rng;
pub mod session_record;
pub mod shop;
pub mod spawner;
pub mod types;
pub mod wallet;
