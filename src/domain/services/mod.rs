mod app;
mod notes_store;
mod session_store;
mod session_teardown;

pub use app::*;
pub use notes_store::*;
pub use session_store::*;
pub use session_teardown::*;
