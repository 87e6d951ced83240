//! The stats aggregator.
//!
//! The stats of a user are computed on demand from its non-deleted maps, with two aggregate
//! queries run in the same read-only transaction. The maps themselves are never loaded.

use entity::{difficulties, maps, types::DifficultyTier};
use rust_decimal::{RoundingStrategy, prelude::ToPrimitive as _};
use sea_orm::{
    ColumnTrait as _, ConnectionTrait, DbBackend, EntityTrait as _, FromQueryResult,
    QueryFilter as _, QuerySelect as _, TransactionTrait,
    prelude::{Decimal, Expr},
    sea_query::{Func, SimpleExpr},
};
use serde::Serialize;

use crate::{error::ProfilesResult, sync};

/// The distribution of the difficulties of the maps of a user, by tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    /// The total amount of difficulties, including the untagged ones.
    pub total: i64,
    /// The amount of Easy difficulties.
    pub easy: i64,
    /// The amount of Normal difficulties.
    pub normal: i64,
    /// The amount of Hard difficulties.
    pub hard: i64,
    /// The amount of Expert difficulties.
    pub expert: i64,
    /// The amount of Expert+ difficulties.
    pub expert_plus: i64,
}

impl DiffStats {
    /// Returns the amount of difficulties of the provided tier.
    pub fn get(&self, tier: DifficultyTier) -> i64 {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Normal => self.normal,
            DifficultyTier::Hard => self.hard,
            DifficultyTier::Expert => self.expert,
            DifficultyTier::ExpertPlus => self.expert_plus,
        }
    }
}

/// The stats of a user, computed from its non-deleted maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// The sum of the up-votes of the maps.
    pub total_upvotes: i64,
    /// The sum of the down-votes of the maps.
    pub total_downvotes: i64,
    /// The amount of maps.
    pub total_maps: i64,
    /// The average tempo, in beats per minute.
    pub avg_bpm: f64,
    /// The average score, rounded to 2 decimal places.
    pub avg_score: f64,
    /// The average duration, in seconds.
    pub avg_duration: f64,
    /// The distribution of the difficulties of the maps.
    pub diff_stats: DiffStats,
}

#[derive(FromQueryResult)]
struct MapsAggregate {
    total_maps: i64,
    total_upvotes: Option<i64>,
    total_downvotes: Option<i64>,
    total_bpm: Option<f64>,
    total_score: Option<Decimal>,
    total_duration: Option<i64>,
}

#[derive(FromQueryResult)]
struct DiffAggregate {
    total: i64,
    easy: Option<i64>,
    normal: Option<i64>,
    hard: Option<i64>,
    expert: Option<i64>,
    expert_plus: Option<i64>,
}

/// Returns the name of the integer type to cast the sums to.
///
/// MySQL returns a decimal for the sum of integers, and only accepts `SIGNED` as target type.
fn int_type(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::MySql => "SIGNED",
        _ => "BIGINT",
    }
}

fn int_sum<E: Into<SimpleExpr>>(expr: E, backend: DbBackend) -> SimpleExpr {
    Func::cast_as(Func::sum(expr), int_type(backend)).into()
}

/// Returns the average of a sum over `count` rows, or 0 if there is no row.
fn average(sum: f64, count: i64) -> f64 {
    if count == 0 { 0. } else { sum / count as f64 }
}

/// Returns the average score over `count` rows, rounded to 2 decimal places.
///
/// The scores are fixed-point, so the sum is exact and the rounding only happens once
/// the average is computed.
fn average_score(sum: Decimal, count: i64) -> f64 {
    if count == 0 {
        return 0.;
    }

    (sum / Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

async fn maps_aggregate<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> ProfilesResult<MapsAggregate> {
    let backend = conn.get_database_backend();

    let aggregate = maps::Entity::find()
        .select_only()
        .expr_as(Func::count(Expr::col(maps::Column::Id)), "total_maps")
        .expr_as(
            int_sum(Expr::col(maps::Column::Upvotes), backend),
            "total_upvotes",
        )
        .expr_as(
            int_sum(Expr::col(maps::Column::Downvotes), backend),
            "total_downvotes",
        )
        .expr_as(Func::sum(Expr::col(maps::Column::Bpm)), "total_bpm")
        .expr_as(Func::sum(Expr::col(maps::Column::Score)), "total_score")
        .expr_as(
            int_sum(Expr::col(maps::Column::Duration), backend),
            "total_duration",
        )
        .filter(
            maps::Column::Uploader
                .eq(user_id)
                .and(maps::Column::DeletedAt.is_null()),
        )
        .into_model::<MapsAggregate>()
        .one(conn)
        .await?
        .unwrap_or(MapsAggregate {
            total_maps: 0,
            total_upvotes: None,
            total_downvotes: None,
            total_bpm: None,
            total_score: None,
            total_duration: None,
        });

    Ok(aggregate)
}

async fn diff_aggregate<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> ProfilesResult<DiffAggregate> {
    let backend = conn.get_database_backend();

    let tiers = [
        DifficultyTier::Easy,
        DifficultyTier::Normal,
        DifficultyTier::Hard,
        DifficultyTier::Expert,
        DifficultyTier::ExpertPlus,
    ];

    let mut query = difficulties::Entity::find()
        .inner_join(maps::Entity)
        .select_only()
        .expr_as(
            Func::count(Expr::col((difficulties::Entity, difficulties::Column::Id))),
            "total",
        );

    // One conditional sum per tier, so the rows are scanned once
    for tier in tiers {
        let is_tier = Expr::case(difficulties::Column::Difficulty.eq(tier), Expr::val(1))
            .finally(Expr::val(0));
        query = query.expr_as(int_sum(is_tier, backend), tier.column_alias());
    }

    let aggregate = query
        .filter(
            maps::Column::Uploader
                .eq(user_id)
                .and(maps::Column::DeletedAt.is_null()),
        )
        .into_model::<DiffAggregate>()
        .one(conn)
        .await?
        .unwrap_or(DiffAggregate {
            total: 0,
            easy: None,
            normal: None,
            hard: None,
            expert: None,
            expert_plus: None,
        });

    Ok(aggregate)
}

impl From<(MapsAggregate, DiffAggregate)> for UserStats {
    fn from((maps, diffs): (MapsAggregate, DiffAggregate)) -> Self {
        let count = maps.total_maps;

        Self {
            total_upvotes: maps.total_upvotes.unwrap_or(0),
            total_downvotes: maps.total_downvotes.unwrap_or(0),
            total_maps: count,
            avg_bpm: average(maps.total_bpm.unwrap_or(0.), count),
            avg_score: average_score(maps.total_score.unwrap_or_default(), count),
            avg_duration: average(maps.total_duration.unwrap_or(0) as f64, count),
            diff_stats: DiffStats {
                total: diffs.total,
                easy: diffs.easy.unwrap_or(0),
                normal: diffs.normal.unwrap_or(0),
                hard: diffs.hard.unwrap_or(0),
                expert: diffs.expert.unwrap_or(0),
                expert_plus: diffs.expert_plus.unwrap_or(0),
            },
        }
    }
}

/// Computes the stats of the user with the provided ID.
///
/// A user without any map, or an unknown user, has all-zero stats.
pub async fn compute<C: TransactionTrait>(conn: &C, user_id: i32) -> ProfilesResult<UserStats> {
    sync::read_only(conn, async |txn| {
        let maps = maps_aggregate(txn, user_id).await?;
        let diffs = diff_aggregate(txn, user_id).await?;
        Ok((maps, diffs).into())
    })
    .await
}
