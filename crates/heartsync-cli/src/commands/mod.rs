pub mod common;
pub mod compete;
pub mod completions;
pub mod images;
pub mod scene;
pub mod send_love;
pub mod status;
pub mod upload;
pub mod watch;
