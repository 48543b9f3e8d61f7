// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus service discovery and health.

pub mod auth;
pub mod system;

pub use auth::login_post;
pub use system::{health_get, root_get};
