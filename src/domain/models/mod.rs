mod api_error;
mod event;
mod invalidator;
mod note;
mod session;
mod storage;

pub use api_error::*;
pub use event::*;
pub use invalidator::*;
pub use note::*;
pub use session::*;
pub use storage::*;
