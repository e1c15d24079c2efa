//! Game balance configuration
//!
//! Every value a designer may want to tweak lives here. A host can override
//! any subset from JSON.

use serde::{Deserialize, Serialize};

/// Per-bot behaviour thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Closer than this to its target, a bot backs off and holds fire
    pub flee_distance: f32,
    /// Preferred standoff range; the bot strafes inside it
    pub ideal_combat_distance: f32,
    /// Targets beyond this range are ignored
    pub detection_range: f32,
    /// Minimum time between two shots (ms)
    pub shoot_cooldown_ms: f64,
    /// Speed scale used while patrolling
    pub patrol_speed: f32,
    /// Speed scale used while strafing around a target
    pub strafe_speed: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            flee_distance: 80.0,
            ideal_combat_distance: 200.0,
            detection_range: 500.0,
            shoot_cooldown_ms: 1000.0,
            patrol_speed: 0.3,
            strafe_speed: 0.5,
        }
    }
}

/// Storm (shrinking safe zone) parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StormTuning {
    /// Initial radius as a fraction of the smaller world dimension
    pub start_radius_factor: f32,
    /// Radius never shrinks below this
    pub min_radius: f32,
    /// Radius lost per tick
    pub shrink_per_tick: f32,
    /// Damage applied once per interval to everything outside
    pub damage_per_pulse: f32,
    /// Time between damage pulses (ms)
    pub damage_interval_ms: f64,
    /// Cosmetic phase advance per tick
    pub phase_per_tick: f32,
}

impl Default for StormTuning {
    fn default() -> Self {
        Self {
            start_radius_factor: 0.4,
            min_radius: 200.0,
            shrink_per_tick: 0.05,
            damage_per_pulse: 2.0,
            damage_interval_ms: 1000.0,
            phase_per_tick: 0.05,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Host viewport size; the world is `world_scale` times larger
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub world_scale: f32,

    /// Map population
    pub bot_count: usize,
    pub bush_count: usize,
    pub wall_count: usize,
    /// Attempts per placement before an element is skipped
    pub placement_attempts: u32,

    /// Entity defaults
    pub player_radius: f32,
    pub bot_radius: f32,
    pub base_health: f32,
    pub base_speed: f32,

    /// Projectiles
    pub projectile_radius: f32,
    pub player_projectile_speed: f32,
    pub bot_projectile_speed: f32,
    pub hit_damage: f32,
    pub player_shoot_cooldown_ms: f64,

    /// A concealed player is still seen by bots this close
    pub reveal_distance: f32,

    pub bot: BotTuning,
    pub storm: StormTuning,

    /// Coins credited for a victory
    pub victory_reward: u64,

    /// Bots escaping the storm at high urgency walk through walls.
    /// Set to false to make walls block every move.
    pub hazard_escape_ignores_obstacles: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            world_scale: 4.0,

            bot_count: 20,
            bush_count: 80,
            wall_count: 60,
            placement_attempts: 50,

            player_radius: 20.0,
            bot_radius: 18.0,
            base_health: 100.0,
            base_speed: 2.0,

            projectile_radius: 5.0,
            player_projectile_speed: 8.0,
            bot_projectile_speed: 5.0,
            hit_damage: 10.0,
            player_shoot_cooldown_ms: 200.0,

            reveal_distance: 120.0,

            bot: BotTuning::default(),
            storm: StormTuning::default(),

            victory_reward: 20,

            hazard_escape_ignores_obstacles: true,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) configuration; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// World width in world units
    pub fn world_width(&self) -> f32 {
        self.viewport_width * self.world_scale
    }

    /// World height in world units
    pub fn world_height(&self) -> f32 {
        self.viewport_height * self.world_scale
    }
}
