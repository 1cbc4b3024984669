//! # gfd-auth
//!
//! Authentication primitives for the admin area.
//!
//! Passwords are hashed with bcrypt (off the async runtime via
//! `spawn_blocking`). A successful login mints an opaque random session token
//! that is stored server-side and handed to the browser in an `HttpOnly`
//! cookie. Persistence of sessions lives in `gfd-db`; this crate only knows
//! how to create, check, and transport them.

pub mod cookie;
pub mod error;
pub mod password;
pub mod principal;
pub mod token;

pub use error::AuthError;
pub use principal::{AuthSession, Principal};
