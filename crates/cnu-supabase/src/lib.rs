//! Supabase access for the uploader.
//!
//! Password sign-in for the desktop app and the single audit insert made at
//! the end of every run.

mod client;
mod error;
mod session;

pub use client::SupabaseClient;
pub use error::{Result, SupabaseError};
pub use session::{Session, SessionUser};
