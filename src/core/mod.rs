pub mod composer;
pub mod config;
pub mod controller;
pub mod database;
pub mod gate;
pub mod persistence;
pub mod reducer;
pub mod shard;
