//! State module for tracking visits
//!
//! Every URL handed to the fetcher gets a [`VisitRecord`] whose outcome moves
//! from pending to succeeded or failed. A failed visit can still succeed when
//! a retry recovers it.

mod visit_state;

pub use visit_state::{VisitOutcome, VisitRecord};
