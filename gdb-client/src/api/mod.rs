pub mod client;
pub mod error;
pub mod raw;

pub use client::{DateRange, GdbClient, Scale, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use raw::{RawUsageEntry, RawUsagePayload, TOTAL_KEY};
