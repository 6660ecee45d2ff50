//! Freelancer payment tracker: projects, partial payments, status and
//! dashboard figures, with CSV and PDF exports.

pub mod dates;
pub mod error;
pub mod export;
pub mod ledger;
pub mod models;
pub mod normalize;
pub mod store;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use tracker::Tracker;
