//! Core business logic - framework-agnostic ingestion, matching and review operations.
//!
//! Nothing in here knows about HTTP. Database-facing functions are generic over
//! `ConnectionTrait` (or `TransactionTrait` when they open their own transaction).

pub mod asset;
pub mod credentials;
pub mod ingest;
pub mod matcher;
pub mod parser;
pub mod period;
pub mod review;
pub mod transaction;
