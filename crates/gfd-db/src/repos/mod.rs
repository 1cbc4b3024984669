//! Domain operations, one `impl GameService` block per entity.
//!
//! Each module owns the SQL for its table(s): row mapping, filters, and the
//! audit entries its mutations record.

pub mod audit;
pub mod auth_session;
pub mod game_session;
pub mod statistics;
pub mod track;
pub mod user;
