// src/services/mod.rs

//! Pipeline services: session lifecycle, listing traversal, record
//! extraction, and the retry controller they share.

pub mod extractor;
pub mod retry;
pub mod session;
pub mod walker;

pub use extractor::RecordExtractor;
pub use retry::{RetryPolicy, with_retry};
pub use session::{LoginCredentials, LoginState, Session, SessionManager};
pub use walker::{ListingWalker, WalkOutcome};
