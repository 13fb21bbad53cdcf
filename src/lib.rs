//! Log what you spend your time on and see each day as a pie of tracked time.
//! Activities are kept by a hosted backend; this crate mirrors them locally in an
//! [store::ActivityStore] and turns a day's worth of them into pie segments with
//! [timeline::build_daily_timeline].
//!

pub mod activity;
pub mod cli;
pub mod config;
pub mod repository;
pub mod store;
pub mod timeline;
pub mod utils;
