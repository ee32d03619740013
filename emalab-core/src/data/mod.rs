//! Price-series ingestion and canonicalization

pub mod canonicalize;
pub mod ingest;

pub use canonicalize::{canonicalize, is_canonical};
pub use ingest::{
    check_price, ingest, parse_sample, screen_points, IngestReport, RawSample, SkipReason,
    SkippedSample,
};
