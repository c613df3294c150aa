//! Satellite prediction coverage cache and refresh scheduler.
//!
//! Keeps precomputed position predictions cached for every satellite on the current
//! dashboard, ahead of a map clock that can run faster, slower, backwards or be paused.
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
