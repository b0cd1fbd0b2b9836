pub mod session;
pub mod store;

pub use session::{ApiError, Session};
pub use store::TokenStore;
