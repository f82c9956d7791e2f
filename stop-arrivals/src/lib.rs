//! Stop arrivals server.
//!
//! Answers "what arrives at this stop next?" by fusing an agency's GTFS
//! schedule with live vehicle positions from the Tranzy OpenData API.

pub mod board;
pub mod cache;
pub mod domain;
pub mod engine;
pub mod poller;
pub mod tranzy;
pub mod web;
