//! Topic collector library.
//!
//! Collects posts and comment threads about a topic from Reddit and 4chan, normalizes
//! them into one record shape and exports posts and comments as two CSV tables.

pub mod config;
pub mod constants;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod text;
