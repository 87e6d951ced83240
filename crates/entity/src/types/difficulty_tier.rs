use sea_orm::entity::prelude::*;

/// The tier of a map difficulty, from the easiest to the hardest.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum DifficultyTier {
    #[sea_orm(num_value = 0)]
    Easy,
    #[sea_orm(num_value = 1)]
    Normal,
    #[sea_orm(num_value = 2)]
    Hard,
    #[sea_orm(num_value = 3)]
    Expert,
    #[sea_orm(num_value = 4)]
    ExpertPlus,
}

impl DifficultyTier {
    /// Returns the name of the column holding the amount of difficulties of this tier
    /// in an aggregate query.
    pub const fn column_alias(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Expert => "expert",
            Self::ExpertPlus => "expert_plus",
        }
    }
}
