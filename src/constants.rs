use crate::types::{FruitTier, Position};

pub const PLAYER_MOVE_COOLDOWN_MS: u64 = 100;
pub const PURSUER_MOVE_COOLDOWN_MS: u64 = 400;

pub const POWER_BASE_DURATION_MS: u64 = 5_000;
pub const POWER_DURATION_STEP_MS: u64 = 1_000;
pub const POWER_MIN_DURATION_MS: u64 = 1_000;

pub const STARTING_LIVES: u32 = 3;
pub const EXTRA_LIFE_SCORE: u32 = 10_000;

pub const DOT_REWARD: u32 = 10;
pub const PILL_REWARD: u32 = 50;
pub const GHOST_BASE_REWARD: u32 = 200;

pub const FRUIT_FIRST_THRESHOLD: u32 = 70;
pub const FRUIT_SECOND_THRESHOLD: u32 = 100;
pub const MAX_FRUIT_SPAWNS_PER_LEVEL: u32 = 2;

pub const PLAYER_START: Position = Position { row: 17, col: 9 };
pub const PURSUER_START: Position = Position { row: 7, col: 7 };

/// Frame cadence used by the WebSocket driver.
pub const FRAME_MS: u64 = 16;

/// Shrinks by one second per level, never below the floor.
pub fn power_duration_ms(level: u32) -> u64 {
    let reduction = POWER_DURATION_STEP_MS.saturating_mul(level.saturating_sub(1) as u64);
    POWER_BASE_DURATION_MS
        .saturating_sub(reduction)
        .max(POWER_MIN_DURATION_MS)
}

pub fn fruit_tier_for_level(level: u32) -> FruitTier {
    if level <= 1 {
        return FruitTier::Cherry;
    }
    if level == 2 {
        return FruitTier::Strawberry;
    }
    FruitTier::Orange
}

/// Start cell of the pursuer at `index` in the roster; the cluster is staggered by column.
pub fn pursuer_start(index: usize) -> Position {
    Position {
        row: PURSUER_START.row,
        col: PURSUER_START.col + index as i32,
    }
}
