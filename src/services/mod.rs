pub mod lifecycle;
pub mod ranking;
pub mod tokens;

pub use lifecycle::ProjectStatus;
pub use tokens::{Claims, TokenError, TokenSigner};
