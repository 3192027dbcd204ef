pub mod route_guard;
pub mod session;

pub use route_guard::route_guard;
pub use session::{CurrentUser, RequestSession};
