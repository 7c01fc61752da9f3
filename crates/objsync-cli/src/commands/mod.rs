pub mod amm;
pub mod config;
pub mod mock;
