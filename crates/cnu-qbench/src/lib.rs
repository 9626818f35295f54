//! QBench LIMS client.
//!
//! A small blocking client for the three calls the uploader needs: token
//! exchange, sample lookup with tests, and worksheet updates.

mod client;
mod error;
mod types;

pub use client::QBenchClient;
pub use error::{QBenchError, Result};
pub use types::{
    ASSAY_ID_CN, ASSAY_ID_HO, AssayRef, QBenchSample, QBenchTest, TokenResponse, WorksheetUpdate,
    decode_sample,
};
