//! Track repository: CRUD, soft delete, search, random pick, import/export.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::Deserialize;

use gfd_core::entities::{
    Track, validate_difficulty, validate_start, validate_track_name,
};
use gfd_core::enums::{AuditActionType, Direction};
use gfd_core::grid::TrackGrid;
use gfd_core::paging::{Page, PageRequest};
use gfd_core::stats::TrackStats;
use gfd_core::transfer::{TrackExport, dedupe_name};

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_datetime, get_bool, get_count, get_i32, get_opt_string, like_contains, parse_datetime,
    parse_enum,
};
use crate::service::{ActionContext, GameService};
use crate::updates::track::TrackUpdate;

const SELECT_COLS: &str = "id, name, grid_config, start_x, start_y, start_direction, \
     created_at, updated_at, created_by, is_active, difficulty_level, description";

/// Columns a track listing may be sorted by.
const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("difficultyLevel", "difficulty_level"),
    ("difficulty_level", "difficulty_level"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("updatedAt", "updated_at"),
    ("updated_at", "updated_at"),
];

const RESOURCE: &str = "TRACK";

/// `WHERE` condition on a `tracks` row: deactivating it still leaves an active track.
/// Checked inside the `UPDATE` so concurrent deactivations cannot both pass.
const LEAVES_ANOTHER_ACTIVE_TRACK: &str = "(is_active = 0 OR EXISTS \
     (SELECT 1 FROM tracks AS other WHERE other.is_active = 1 AND other.id <> tracks.id))";

fn row_to_track(row: &libsql::Row) -> Result<Track, DatabaseError> {
    Ok(Track {
        id: row.get(0)?,
        name: row.get(1)?,
        grid_config: row.get(2)?,
        start_x: get_i32(row, 3)?,
        start_y: get_i32(row, 4)?,
        start_direction: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
        created_by: get_opt_string(row, 8)?,
        is_active: get_bool(row, 9)?,
        difficulty_level: get_i32(row, 10)?,
        description: get_opt_string(row, 11)?,
    })
}

fn sort_column(sort_by: &str) -> &'static str {
    SORTABLE
        .iter()
        .find(|(key, _)| *key == sort_by)
        .map_or("id", |(_, column)| *column)
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Input for a new track, as posted by the admin UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub name: String,
    pub grid_config: String,
    pub start_x: i32,
    pub start_y: i32,
    pub start_direction: Direction,
    #[serde(default)]
    pub difficulty_level: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A track that passed every field rule, with its grid in canonical form.
struct ValidTrack {
    name: String,
    grid: TrackGrid,
    start_x: i32,
    start_y: i32,
    start_direction: Direction,
    difficulty_level: i32,
    description: Option<String>,
}

impl NewTrack {
    fn validate(self) -> Result<ValidTrack, DatabaseError> {
        let name = validate_track_name(&self.name)?;
        let grid = TrackGrid::parse(&self.grid_config)?;
        validate_start(&grid, self.start_x, self.start_y)?;
        let difficulty_level = validate_difficulty(self.difficulty_level.unwrap_or(1))?;
        Ok(ValidTrack {
            name,
            grid,
            start_x: self.start_x,
            start_y: self.start_y,
            start_direction: self.start_direction,
            difficulty_level,
            description: clean_description(self.description),
        })
    }
}

impl From<TrackExport> for NewTrack {
    fn from(doc: TrackExport) -> Self {
        Self {
            name: doc.name,
            grid_config: doc.grid_config,
            start_x: doc.start_x,
            start_y: doc.start_y,
            start_direction: doc.start_direction,
            difficulty_level: Some(doc.difficulty_level),
            description: doc.description,
        }
    }
}

impl GameService {
    async fn insert_track(
        &self,
        track: &ValidTrack,
        created_by: Option<&str>,
    ) -> Result<Track, DatabaseError> {
        let now = fmt_datetime(Utc::now());
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO tracks (name, grid_config, start_x, start_y, start_direction, \
                     created_at, updated_at, created_by, is_active, difficulty_level, description)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params![
                    track.name.as_str(),
                    track.grid.to_json(),
                    track.start_x,
                    track.start_y,
                    track.start_direction.as_str(),
                    now.as_str(),
                    now.as_str(),
                    created_by,
                    track.difficulty_level,
                    track.description.as_deref()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_track(&row)
    }

    /// Validate and store a new active track.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for bad fields and
    /// `DatabaseError::Conflict` if an active track already has the name.
    pub async fn create_track(
        &self,
        input: NewTrack,
        ctx: &ActionContext,
    ) -> Result<Track, DatabaseError> {
        let valid = input.validate()?;
        if !self.is_track_name_available(&valid.name, None).await? {
            return Err(DatabaseError::Conflict("Track name already exists".into()));
        }

        let track = self.insert_track(&valid, ctx.username.as_deref()).await?;
        tracing::info!(id = track.id, name = %track.name, "track created");
        self.log_action(
            ctx.event("Track created", AuditActionType::Create, RESOURCE)
                .resource(track.id, &track.name),
        )
        .await;
        Ok(track)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no track has this id.
    pub async fn get_track(&self, id: i64) -> Result<Track, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM tracks WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Track", id))?;
        row_to_track(&row)
    }

    /// Like [`Self::get_track`] but treats inactive tracks as missing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no active track has this id.
    pub async fn get_active_track(&self, id: i64) -> Result<Track, DatabaseError> {
        let track = self.get_track(id).await?;
        if track.is_active {
            Ok(track)
        } else {
            Err(DatabaseError::not_found("Track", id))
        }
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, `Validation` for bad fields, or
    /// `Conflict` for a duplicate name or deactivating the last active track.
    pub async fn update_track(
        &self,
        id: i64,
        update: TrackUpdate,
        ctx: &ActionContext,
    ) -> Result<Track, DatabaseError> {
        let current = self.get_track(id).await?;

        let name = update.name.as_deref().map(validate_track_name).transpose()?;
        let will_be_active = update.is_active.unwrap_or(current.is_active);
        let final_name = name.as_deref().unwrap_or(&current.name);
        let name_or_activation_changes =
            name.is_some() || (will_be_active && !current.is_active);
        if will_be_active
            && name_or_activation_changes
            && !self.is_track_name_available(final_name, Some(id)).await?
        {
            return Err(DatabaseError::Conflict("Track name already exists".into()));
        }

        let grid = match update.grid_config.as_deref() {
            Some(json) => Some(TrackGrid::parse(json)?),
            None => None,
        };
        if update.touches_layout() {
            let layout = match grid {
                Some(grid) => grid,
                None => current.grid()?,
            };
            validate_start(
                &layout,
                update.start_x.unwrap_or(current.start_x),
                update.start_y.unwrap_or(current.start_y),
            )?;
        }
        if let Some(level) = update.difficulty_level {
            validate_difficulty(level)?;
        }
        let deactivates = current.is_active && !will_be_active;

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref name) = name {
            sets.push(format!("name = ?{idx}"));
            params.push(name.clone().into());
            idx += 1;
        }
        if let Some(grid) = grid {
            sets.push(format!("grid_config = ?{idx}"));
            params.push(grid.to_json().into());
            idx += 1;
        }
        if let Some(x) = update.start_x {
            sets.push(format!("start_x = ?{idx}"));
            params.push(i64::from(x).into());
            idx += 1;
        }
        if let Some(y) = update.start_y {
            sets.push(format!("start_y = ?{idx}"));
            params.push(i64::from(y).into());
            idx += 1;
        }
        if let Some(direction) = update.start_direction {
            sets.push(format!("start_direction = ?{idx}"));
            params.push(direction.as_str().into());
            idx += 1;
        }
        if let Some(level) = update.difficulty_level {
            sets.push(format!("difficulty_level = ?{idx}"));
            params.push(i64::from(level).into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(
                clean_description(description.clone()).map_or(libsql::Value::Null, Into::into),
            );
            idx += 1;
        }
        if let Some(active) = update.is_active {
            sets.push(format!("is_active = ?{idx}"));
            params.push(i64::from(active).into());
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(current);
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(fmt_datetime(Utc::now()).into());
        idx += 1;

        params.push(id.into());
        let mut sql = format!("UPDATE tracks SET {} WHERE id = ?{idx}", sets.join(", "));
        if deactivates {
            sql.push_str(" AND ");
            sql.push_str(LEAVES_ANOTHER_ACTIVE_TRACK);
        }
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            if deactivates {
                return Err(DatabaseError::Conflict("Cannot deactivate the last active track".into()));
            }
            return Err(DatabaseError::not_found("Track", id));
        }

        let updated = self.get_track(id).await?;
        let details = serde_json::to_string(&update).map_err(|e| DatabaseError::Other(e.into()))?;
        self.log_action(
            ctx.event("Track updated", AuditActionType::Update, RESOURCE)
                .resource(updated.id, &updated.name)
                .details(details),
        )
        .await;
        Ok(updated)
    }

    async fn set_track_active(&self, id: i64, active: bool) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE tracks SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![i64::from(active), fmt_datetime(Utc::now()), id],
            )
            .await?;
        Ok(())
    }

    /// Soft delete: the track is deactivated, sessions keep referencing it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, or `Conflict` when it is the last active track.
    pub async fn delete_track(&self, id: i64, ctx: &ActionContext) -> Result<(), DatabaseError> {
        let track = self.get_track(id).await?;
        if !track.is_active {
            return Ok(());
        }

        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE tracks SET is_active = 0, updated_at = ?1 \
                     WHERE id = ?2 AND is_active = 1 AND {LEAVES_ANOTHER_ACTIVE_TRACK}"
                ),
                libsql::params![fmt_datetime(Utc::now()), id],
            )
            .await?;
        if changed == 0 {
            if !self.get_track(id).await?.is_active {
                return Ok(());
            }
            return Err(DatabaseError::Conflict(
                "Cannot delete the last active track".into(),
            ));
        }
        tracing::info!(id, name = %track.name, "track deactivated");
        self.log_action(
            ctx.event("Track deleted", AuditActionType::Delete, RESOURCE)
                .resource(track.id, &track.name),
        )
        .await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, or `Conflict` when an active track holds the name.
    pub async fn reactivate_track(
        &self,
        id: i64,
        ctx: &ActionContext,
    ) -> Result<Track, DatabaseError> {
        let track = self.get_track(id).await?;
        if track.is_active {
            return Ok(track);
        }
        if !self.is_track_name_available(&track.name, Some(id)).await? {
            return Err(DatabaseError::Conflict(
                "An active track with this name already exists".into(),
            ));
        }

        self.set_track_active(id, true).await?;
        self.log_action(
            ctx.event("Track reactivated", AuditActionType::Update, RESOURCE)
                .resource(track.id, &track.name),
        )
        .await;
        self.get_track(id).await
    }

    async fn collect_tracks(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Track>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut tracks = Vec::new();
        while let Some(row) = rows.next().await? {
            tracks.push(row_to_track(&row)?);
        }
        Ok(tracks)
    }

    /// One page of all tracks, active or not.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tracks(&self, page: &PageRequest) -> Result<Page<Track>, DatabaseError> {
        let total = self.count_tracks().await?;
        let tracks = self
            .collect_tracks(
                &format!(
                    "SELECT {SELECT_COLS} FROM tracks ORDER BY {} {}, id ASC LIMIT {} OFFSET {}",
                    sort_column(&page.sort_by),
                    page.sort_dir.as_sql(),
                    page.size,
                    page.offset()
                ),
                (),
            )
            .await?;
        Ok(Page::new(tracks, page, total))
    }

    /// Every track, for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn all_tracks(&self) -> Result<Vec<Track>, DatabaseError> {
        self.collect_tracks(&format!("SELECT {SELECT_COLS} FROM tracks ORDER BY id"), ())
            .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_active_tracks(&self) -> Result<Vec<Track>, DatabaseError> {
        self.collect_tracks(
            &format!("SELECT {SELECT_COLS} FROM tracks WHERE is_active = 1 ORDER BY id"),
            (),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn random_active_track(&self) -> Result<Option<Track>, DatabaseError> {
        Ok(self
            .collect_tracks(
                &format!(
                    "SELECT {SELECT_COLS} FROM tracks WHERE is_active = 1 ORDER BY RANDOM() LIMIT 1"
                ),
                (),
            )
            .await?
            .into_iter()
            .next())
    }

    /// A random active track other than `exclude_id`, or any active track if
    /// it is the only one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn random_active_track_excluding(
        &self,
        exclude_id: i64,
    ) -> Result<Option<Track>, DatabaseError> {
        let other = self
            .collect_tracks(
                &format!(
                    "SELECT {SELECT_COLS} FROM tracks WHERE is_active = 1 AND id != ?1 \
                     ORDER BY RANDOM() LIMIT 1"
                ),
                [exclude_id],
            )
            .await?
            .into_iter()
            .next();
        match other {
            Some(track) => Ok(Some(track)),
            None => self.random_active_track().await,
        }
    }

    /// Active tracks whose name contains `term` (case-insensitive), newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search_tracks(&self, term: &str) -> Result<Vec<Track>, DatabaseError> {
        let term = term.trim();
        if term.is_empty() {
            return self
                .collect_tracks(
                    &format!(
                        "SELECT {SELECT_COLS} FROM tracks WHERE is_active = 1 \
                         ORDER BY created_at DESC, id DESC"
                    ),
                    (),
                )
                .await;
        }
        self.collect_tracks(
            &format!(
                "SELECT {SELECT_COLS} FROM tracks \
                 WHERE is_active = 1 AND lower(name) LIKE ?1 ESCAPE '\\' \
                 ORDER BY created_at DESC, id DESC"
            ),
            [like_contains(term)],
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn tracks_by_difficulty(&self, level: i32) -> Result<Vec<Track>, DatabaseError> {
        self.collect_tracks(
            &format!(
                "SELECT {SELECT_COLS} FROM tracks WHERE is_active = 1 AND difficulty_level = ?1 \
                 ORDER BY id"
            ),
            [i64::from(level)],
        )
        .await
    }

    /// Whether no active track (other than `exclude_id`) uses `name`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn is_track_name_available(
        &self,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let taken = self
            .query_count(
                "SELECT COUNT(*) FROM tracks WHERE is_active = 1 AND name = ?1 AND id != ?2",
                libsql::params![name.trim(), exclude_id.unwrap_or(-1)],
            )
            .await?;
        Ok(taken == 0)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_active_tracks(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM tracks WHERE is_active = 1", ())
            .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_tracks(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM tracks", ()).await
    }

    /// Active track count, total and per difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn track_stats(&self) -> Result<TrackStats, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT difficulty_level, COUNT(*) FROM tracks WHERE is_active = 1 \
                 GROUP BY difficulty_level",
                (),
            )
            .await?;
        let mut by_difficulty = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            by_difficulty.insert(get_i32(&row, 0)?, get_count(&row, 1)?);
        }
        Ok(TrackStats {
            total_active: by_difficulty.values().sum(),
            by_difficulty,
        })
    }

    /// Transfer document for one track. Audited as EXPORT.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no track has this id.
    pub async fn export_track(
        &self,
        id: i64,
        ctx: &ActionContext,
    ) -> Result<TrackExport, DatabaseError> {
        let track = self.get_track(id).await?;
        self.log_action(
            ctx.event("Track exported", AuditActionType::Export, RESOURCE)
                .resource(track.id, &track.name),
        )
        .await;
        Ok(TrackExport::from_track(&track, Utc::now()))
    }

    /// Transfer documents for all (or only active) tracks. Audited as EXPORT.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn export_tracks(
        &self,
        active_only: bool,
        ctx: &ActionContext,
    ) -> Result<Vec<TrackExport>, DatabaseError> {
        let tracks = if active_only {
            self.list_active_tracks().await?
        } else {
            self.all_tracks().await?
        };
        let now = Utc::now();
        let docs: Vec<TrackExport> = tracks
            .iter()
            .map(|track| TrackExport::from_track(track, now))
            .collect();
        self.log_action(
            ctx.event("Tracks exported", AuditActionType::Export, RESOURCE)
                .details(format!("{} tracks, activeOnly={active_only}", docs.len())),
        )
        .await;
        Ok(docs)
    }

    /// Create a track from a transfer document.
    ///
    /// A name already used by an active track gets ` (n)` appended with the
    /// smallest free `n`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an unsupported version or bad fields.
    pub async fn import_track(
        &self,
        doc: TrackExport,
        ctx: &ActionContext,
    ) -> Result<Track, DatabaseError> {
        doc.check_version()?;
        let mut input = NewTrack::from(doc);
        let base = validate_track_name(&input.name)?;

        let taken: HashSet<String> = self
            .list_active_tracks()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        input.name = dedupe_name(&base, |candidate| taken.contains(candidate));

        let valid = input.validate()?;
        let track = self.insert_track(&valid, ctx.username.as_deref()).await?;
        tracing::info!(id = track.id, name = %track.name, "track imported");
        self.log_action(
            ctx.event("Track imported", AuditActionType::Import, RESOURCE)
                .resource(track.id, &track.name),
        )
        .await;
        Ok(track)
    }
}
