//! Session services shared by every front end.

mod session;

pub use session::{Session, SessionSnapshot};
