//! Domain types and models

pub mod session;
pub mod user;

pub use session::{Notice, NoticeKind, SessionPhase, SessionSnapshot};
pub use user::UserProfile;
