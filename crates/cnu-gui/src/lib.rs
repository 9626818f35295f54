//! CN Upload Results - GUI library
//!
//! State and background work live here so they can be tested without a
//! window.

pub mod state;
pub mod theme;
pub mod worker;
