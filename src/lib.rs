//! Storm Arena - top-down arena shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, bot AI, collisions, storm)
//! - `tuning`: Data-driven game balance
//! - `progression`: Coins, upgrades and the shop rules
//! - `persistence`: Durable store for the progression record

pub mod persistence;
pub mod progression;
pub mod sim;
pub mod tuning;

pub use progression::{Progression, PurchaseError, UpgradeKind};
pub use tuning::SimConfig;

use glam::Vec2;

/// Fixed simulation constants (not balance knobs, see `tuning` for those)
pub mod consts {
    /// Reference frame rate the per-tick speeds are tuned for
    pub const TICKS_PER_SECOND: f32 = 60.0;
    /// Duration of one tick at that rate
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// Threat look-ahead horizon (seconds of simulated flight)
    pub const THREAT_LOOKAHEAD_SECS: f32 = 0.5;
    /// Projectile must be inside this cone around its heading to threaten
    pub const THREAT_CONE: f32 = std::f32::consts::FRAC_PI_3;
    /// Projectiles farther than this are ignored by threat detection
    pub const THREAT_RANGE: f32 = 150.0;
    /// Extra clearance added to the radii sum for the predicted miss distance
    pub const THREAT_MARGIN: f32 = 20.0;
    /// Nearest threat closer than this makes a bot drop everything and dodge
    pub const EVADE_DISTANCE: f32 = 100.0;

    /// Urgency is the distance past the storm edge divided by this
    pub const URGENCY_SPAN: f32 = 200.0;

    /// Patrol destination refresh window (ms)
    pub const PATROL_INTERVAL_MIN_MS: f64 = 3000.0;
    pub const PATROL_INTERVAL_MAX_MS: f64 = 5000.0;
    /// A patrol destination closer than this counts as reached
    pub const PATROL_ARRIVAL: f32 = 30.0;
    /// Patrol destinations stay this far from the world edge
    pub const PATROL_EDGE_MARGIN: f32 = 100.0;

    /// Spawned projectiles start this far beyond the shooter's radius
    pub const MUZZLE_OFFSET: f32 = 8.0;

    /// Upgrade tracks are capped at this level
    pub const MAX_UPGRADE_LEVEL: u8 = 10;
}

/// Smallest absolute difference between two angles, in [0, π]
#[inline]
pub fn angle_between(a: f32, b: f32) -> f32 {
    let diff = (a - b).abs() % std::f32::consts::TAU;
    diff.min(std::f32::consts::TAU - diff)
}

/// Heading angle of a vector
#[inline]
pub fn heading_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Unit vector for a direction, `None` for a zero (or non-finite) vector
#[inline]
pub fn unit(v: Vec2) -> Option<Vec2> {
    v.try_normalize()
}
