// src/lib.rs

//! Tax rulings crawler library.
//!
//! Scrapes newly-published rulings from two publisher sites behind
//! authenticated sessions, deduplicates them against a persisted ledger,
//! and commits them to an external sheet plus a local JSON backup.

pub mod browser;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod sheets;
pub mod storage;
pub mod utils;
