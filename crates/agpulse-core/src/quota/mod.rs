//! Fetching and parsing the companion's per-model quota data.
//!
//! One `GetUserStatus` call returns a flat list of model configs; the parser
//! groups them into pools that share an allowance.

pub mod client;
pub mod parser;
pub mod types;

pub use client::{HttpQuotaClient, QuotaSource, Scheme};
pub use parser::{parse_user_status, PoolKind};
pub use types::{Model, Pool, QuotaSnapshot};
