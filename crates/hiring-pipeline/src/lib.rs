//! Applicant interview pipeline: the ordered stage catalog, the gates deciding what an applicant
//! may do next, and the service that applies those decisions to stored records.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
