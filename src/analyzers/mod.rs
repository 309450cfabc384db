//! Rating import and score analytics.
//!
//! This module maps ingested ratings tables onto rubric criteria, classifies
//! subjects into median-split quadrants, correlates paired measures per scope,
//! and tests agreement between rater groups.

pub mod aggregate;
pub mod agreement;
pub mod analyzer;
pub mod correlation;
pub mod distribution;
pub mod quadrant;
pub mod types;
pub mod utility;
