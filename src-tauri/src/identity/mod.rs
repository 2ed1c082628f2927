//! Identity Layer
//!
//! Google sign-in behind the `IdentityProvider` seam, with the session
//! persisted across restarts.

mod google;
mod session_file;

pub use google::GoogleIdentity;
pub use session_file::SessionFile;
