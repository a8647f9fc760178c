//! SelectLab Core — engine, domain types, candidate feeds, allocator, simulation loop.
//!
//! This crate contains the heart of the strategy-comparison engine:
//! - Domain types (bars, candidates, orders, positions, trades, ledgers)
//! - Immutable market series with as-of views (the no-lookahead boundary)
//! - Candidate provider trait with a prioritized fallback chain
//! - Pluggable strategy variants (pure decision functions)
//! - Allocator with pro-rata scaling and sell-before-buy ordering
//! - Date-by-date simulation loop with next-bar-open execution

pub mod allocator;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod market;
pub mod strategy;
