//! Library side of the `cnu` command: logging setup and table rendering.

pub mod logging;
pub mod summary;
