//! Session-held state for the storefront.

pub mod cart;
pub mod session;

pub use cart::SessionCart;
pub use session::{CurrentMember, keys as session_keys};
