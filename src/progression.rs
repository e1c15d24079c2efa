//! Coins, upgrade levels and the shop rules
//!
//! The record is read once at round start (to build the player's loadout)
//! and written once at round end. Nothing here runs during a tick.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_UPGRADE_LEVEL;

/// Price of the first level of any upgrade; every level doubles it
const BASE_UPGRADE_COST: u64 = 40;
/// Stat bonus per upgrade level
const BONUS_PER_LEVEL: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Health,
    Speed,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 2] = [UpgradeKind::Health, UpgradeKind::Speed];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeKind::Health => "health",
            UpgradeKind::Speed => "speed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("{} upgrade is already at the maximum level", .kind.as_str())]
    MaxLevel { kind: UpgradeKind },
    #[error("not enough coins: need {cost}, have {available}")]
    InsufficientCoins { cost: u64, available: u64 },
}

/// Persisted player progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    pub coins: u64,
    pub health_level: u8,
    pub speed_level: u8,
    pub games_played: u32,
    pub deaths: u32,
}

impl Progression {
    pub fn level(&self, kind: UpgradeKind) -> u8 {
        match kind {
            UpgradeKind::Health => self.health_level,
            UpgradeKind::Speed => self.speed_level,
        }
    }

    fn level_mut(&mut self, kind: UpgradeKind) -> &mut u8 {
        match kind {
            UpgradeKind::Health => &mut self.health_level,
            UpgradeKind::Speed => &mut self.speed_level,
        }
    }

    /// Price of the next level
    pub fn cost(&self, kind: UpgradeKind) -> u64 {
        let level = u32::from(self.level(kind));
        BASE_UPGRADE_COST.saturating_mul(2u64.saturating_pow(level))
    }

    pub fn can_buy(&self, kind: UpgradeKind) -> bool {
        self.level(kind) < MAX_UPGRADE_LEVEL && self.coins >= self.cost(kind)
    }

    /// Buy one level. Returns the new level; on error nothing changes.
    pub fn buy(&mut self, kind: UpgradeKind) -> Result<u8, PurchaseError> {
        if self.level(kind) >= MAX_UPGRADE_LEVEL {
            return Err(PurchaseError::MaxLevel { kind });
        }
        let cost = self.cost(kind);
        if self.coins < cost {
            return Err(PurchaseError::InsufficientCoins {
                cost,
                available: self.coins,
            });
        }

        self.coins -= cost;
        let level = self.level_mut(kind);
        *level += 1;
        log::info!("Bought {} level {} for {} coins", kind.as_str(), *level, cost);
        Ok(*level)
    }

    /// Book a finished round
    pub fn record_round(&mut self, victory: bool, reward: u64) {
        self.games_played = self.games_played.saturating_add(1);
        if victory {
            self.coins = self.coins.saturating_add(reward);
        } else {
            self.deaths = self.deaths.saturating_add(1);
        }
    }

    pub fn loadout(&self) -> Loadout {
        Loadout::from_levels(self.health_level, self.speed_level)
    }
}

/// Stat multipliers applied to the player when a round starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub health_multiplier: f32,
    pub speed_multiplier: f32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            health_multiplier: 1.0,
            speed_multiplier: 1.0,
        }
    }
}

impl Loadout {
    /// Levels above the cap count as the cap
    pub fn from_levels(health_level: u8, speed_level: u8) -> Self {
        let bonus = |level: u8| 1.0 + f32::from(level.min(MAX_UPGRADE_LEVEL)) * BONUS_PER_LEVEL;
        Self {
            health_multiplier: bonus(health_level),
            speed_multiplier: bonus(speed_level),
        }
    }
}
