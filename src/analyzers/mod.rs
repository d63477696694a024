//! Survey score aggregation.
//!
//! This module drops neutral answers, bins the remaining Likert values into
//! rating buckets, derives percentages and averages, and summarizes the
//! accreditation criteria into JSON reports.

pub mod aggregate;
pub mod analyzer;
pub mod average;
pub mod bucket;
pub mod grade;
pub mod neutral;
pub mod reshape;
pub mod score;
pub mod types;
pub mod utility;
