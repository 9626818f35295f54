//! Screens and overlays.

mod login;
mod overlay;
mod preview;
mod upload;

pub use login::LoginView;
pub use overlay::ProgressOverlay;
pub use upload::{UploadAction, UploadView};
