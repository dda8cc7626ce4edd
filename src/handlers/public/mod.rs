// Public handlers: service info, health and token acquisition.
// No authentication, so every input is validated here.
pub mod auth;
pub mod root;

pub use root::{health, root};
