pub mod catalog;
pub mod identity;
pub mod session_storage;
pub mod session_store;

pub use catalog::{MockCatalog, ProductCatalog};
pub use identity::{IdentityLookup, MockCredentialTable};
pub use session_storage::{MemoryStorage, SessionStorage, StorageError};
pub use session_store::{SessionCookie, SessionState, SessionStore, SESSION_KEY};
