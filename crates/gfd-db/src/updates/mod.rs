//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some`
//! fields generate SET clauses in the dynamic UPDATE SQL. The update struct
//! is serialized into the audit entry's `details` (changed fields only).

pub mod game_session;
pub mod track;
pub mod user;
