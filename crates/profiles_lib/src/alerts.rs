//! The alert feed of a user.
//!
//! An alert is a moderation action made on a map of the user, that they should be notified
//! about. The feed is bounded to the [`MAX_ALERTS`] most recent ones.

use chrono::NaiveDateTime;
use entity::{maps, mod_log, types::ModLogKind};
use sea_orm::{
    ColumnTrait as _, ConnectionTrait, EntityTrait as _, QueryFilter as _, QueryOrder as _,
    QuerySelect as _,
};
use serde::Serialize;

use crate::{error::ProfilesResult, internal};

/// The maximum amount of alerts returned at once.
pub const MAX_ALERTS: u64 = 30;

/// The map concerned by an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMap {
    /// The map ID.
    pub id: i32,
    /// The name of the map.
    pub name: String,
}

/// A moderation action made on a map of the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// The map the action was made on.
    pub map: AlertMap,
    /// When the action happened.
    pub time: NaiveDateTime,
    /// The kind of the action.
    pub kind: ModLogKind,
}

/// Returns the most recent alerts of the user with the provided ID, the newest first.
///
/// The `limit` is clamped to [`MAX_ALERTS`], which is also the default.
pub async fn list_alerts<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    limit: Option<u64>,
) -> ProfilesResult<Vec<Alert>> {
    let limit = limit.unwrap_or(MAX_ALERTS).min(MAX_ALERTS);

    let events = mod_log::Entity::find()
        .find_also_related(maps::Entity)
        .filter(
            maps::Column::Uploader
                .eq(user_id)
                .and(mod_log::Column::Kind.is_in(ModLogKind::ALERTS)),
        )
        .order_by_desc(mod_log::Column::OpAt)
        .order_by_desc(mod_log::Column::Id)
        .limit(limit)
        .all(conn)
        .await?;

    events
        .into_iter()
        .map(|(event, map)| {
            let map = map.ok_or_else(|| {
                internal!("Map of moderation event {} must be in database", event.id)
            })?;
            Ok(Alert {
                map: AlertMap {
                    id: map.id,
                    name: map.name,
                },
                time: event.op_at,
                kind: event.kind,
            })
        })
        .collect()
}
