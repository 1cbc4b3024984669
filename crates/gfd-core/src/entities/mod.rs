//! Entity structs for all Game for Devs domain objects.
//!
//! Each entity maps to a table in the libSQL database. All structs derive
//! `Serialize`, `Deserialize`, and `JsonSchema`, and serialize with camelCase
//! field names to match the browser client and admin UI.

mod audit_log;
mod game_session;
mod track;
mod user;

pub use audit_log::{AuditEvent, AuditLog, SYSTEM_USERNAME};
pub use game_session::GameSession;
pub use track::{
    MAX_DIFFICULTY, MAX_TRACK_NAME_LEN, MIN_DIFFICULTY, Track, validate_difficulty,
    validate_start, validate_track_name,
};
pub use user::{
    MAX_USERNAME_LEN, MIN_PASSWORD_LEN, MIN_USERNAME_LEN, User, compose_full_name,
    validate_email, validate_password, validate_username,
};
