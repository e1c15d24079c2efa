//! Entities and the per-round world container
//!
//! A `World` is built fresh at round start and dropped at round end; nothing
//! in here outlives a round except what the host copies out of it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, circle_contains, circle_rect_overlap};
use super::storm::Storm;
use crate::consts::*;
use crate::progression::Loadout;
use crate::tuning::SimConfig;
use crate::{heading_of, unit};

/// Handle to a combatant. Bots are never removed mid-round, so an index
/// stays valid for the whole round; resolution still tolerates a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Player,
    Bot(usize),
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Bot,
}

/// Round state as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Ongoing,
    /// Every bot is dead
    Victory,
    /// The player died
    Defeat,
}

impl RoundOutcome {
    pub fn is_over(self) -> bool {
        self != RoundOutcome::Ongoing
    }
}

/// World rectangle `[0, width] x [0, height]`, passed explicitly to
/// everything that clamps or culls against it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Keep a circle of `radius` fully inside the world
    pub fn clamp_circle(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(radius, (self.width - radius).max(radius)),
            pos.y.clamp(radius, (self.height - radius).max(radius)),
        )
    }

    /// A point lies inside the world (edges included)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

/// Simulated millisecond clock, advanced by the tick duration the host
/// supplies. All cooldowns and intervals are measured against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    now_ms: f64,
}

impl SimClock {
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Non-finite or negative durations are ignored
    pub fn advance(&mut self, dt_ms: f64) {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.now_ms += dt_ms;
        }
    }
}

/// Shared movable-body state for the player and bots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mover {
    pub pos: Vec2,
    pub radius: f32,
    /// Facing (radians)
    pub heading: f32,
    /// Units moved per tick for a unit direction
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
}

impl Mover {
    pub fn new(pos: Vec2, radius: f32, speed: f32, max_health: f32) -> Self {
        Self {
            pos,
            radius,
            heading: 0.0,
            speed,
            health: max_health,
            max_health,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Health as a fraction of max, for health bars
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Apply damage; health clamps at zero and a dead body stays dead
    pub fn take_damage(&mut self, amount: f32) {
        if !self.is_alive() || !(amount > 0.0) {
            return;
        }
        self.health = (self.health - amount).max(0.0);
    }

    /// Move by `dir * speed`, testing each axis against the obstacles
    /// separately so a blocked axis still lets the body slide along a wall.
    /// `dir` need not be a unit vector.
    pub fn step(&mut self, dir: Vec2, obstacles: &[Obstacle]) {
        if !dir.is_finite() {
            return;
        }
        let target = self.pos + dir * self.speed;

        let x_blocked = obstacles
            .iter()
            .any(|o| o.blocks(Vec2::new(target.x, self.pos.y), self.radius));
        let y_blocked = obstacles
            .iter()
            .any(|o| o.blocks(Vec2::new(self.pos.x, target.y), self.radius));

        if !x_blocked {
            self.pos.x = target.x;
        }
        if !y_blocked {
            self.pos.y = target.y;
        }
    }

    /// Turn to face a point; a coincident point leaves the heading alone
    pub fn face(&mut self, point: Vec2) {
        if let Some(dir) = unit(point - self.pos) {
            self.heading = heading_of(dir);
        }
    }

    pub fn clamp_to(&mut self, bounds: &Bounds) {
        self.pos = bounds.clamp_circle(self.pos, self.radius);
    }

    /// Unit facing vector
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }
}

/// The human-controlled combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Mover,
    /// Last aim point in world coordinates
    pub aim: Vec2,
    /// Directional intent applied this tick (unit length or zero)
    pub intent: Vec2,
    pub last_shot_ms: Option<f64>,
}

impl Player {
    /// Max health and speed are scaled once, here, by the upgrade loadout
    pub fn new(pos: Vec2, config: &SimConfig, loadout: &Loadout) -> Self {
        Self {
            body: Mover::new(
                pos,
                config.player_radius,
                config.base_speed * loadout.speed_multiplier,
                config.base_health * loadout.health_multiplier,
            ),
            aim: pos,
            intent: Vec2::ZERO,
            last_shot_ms: None,
        }
    }
}

/// Patrol bookkeeping for a bot without a target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patrol {
    pub destination: Vec2,
    /// `None` forces a new destination on the next patrol tick
    pub changed_at_ms: Option<f64>,
    pub interval_ms: f64,
}

impl Patrol {
    pub fn is_due(&self, now_ms: f64) -> bool {
        match self.changed_at_ms {
            Some(changed) => now_ms - changed > self.interval_ms,
            None => true,
        }
    }
}

/// Random patrol refresh interval
pub fn roll_patrol_interval(rng: &mut Pcg32) -> f64 {
    rng.random_range(PATROL_INTERVAL_MIN_MS..PATROL_INTERVAL_MAX_MS)
}

/// An autonomous combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub body: Mover,
    /// Re-derived every tick from the perception scan, never persisted
    pub target: Option<EntityRef>,
    pub last_shot_ms: Option<f64>,
    pub patrol: Patrol,
}

impl Bot {
    pub fn new(pos: Vec2, config: &SimConfig, now_ms: f64, rng: &mut Pcg32) -> Self {
        Self {
            body: Mover::new(pos, config.bot_radius, config.base_speed, config.base_health),
            target: None,
            last_shot_ms: None,
            patrol: Patrol {
                destination: pos,
                changed_at_ms: Some(now_ms),
                interval_ms: roll_patrol_interval(rng),
            },
        }
    }
}

/// A bullet in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub owner: EntityRef,
    pub alive: bool,
}

impl Projectile {
    /// Spawn in front of the shooter, clear of its own body
    pub fn fire(shooter: &Mover, owner: EntityRef, speed: f32, radius: f32) -> Self {
        let facing = shooter.facing();
        Self {
            pos: shooter.pos + facing * (shooter.radius + MUZZLE_OFFSET),
            vel: facing * speed,
            radius,
            owner,
            alive: true,
        }
    }

    pub fn side(&self) -> Side {
        match self.owner {
            EntityRef::Player => Side::Player,
            EntityRef::Bot(_) => Side::Bot,
        }
    }

    /// Move one tick; leaving the world kills the projectile.
    /// Returns the position before the move.
    pub fn advance(&mut self, bounds: &Bounds) -> Vec2 {
        let prev = self.pos;
        self.pos += self.vel;
        if !bounds.contains(self.pos) {
            self.alive = false;
        }
        prev
    }

    /// Strict circle overlap against a living body
    pub fn hits(&self, body: &Mover) -> bool {
        body.is_alive() && self.pos.distance(body.pos) < body.radius + self.radius
    }
}

/// Solid wall: blocks movement and stops projectiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
        }
    }

    pub fn blocks(&self, center: Vec2, radius: f32) -> bool {
        circle_rect_overlap(center, radius, &self.rect)
    }
}

/// Bush: hides whoever stands inside it, never blocks anything
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bush {
    pub center: Vec2,
    pub radius: f32,
}

impl Bush {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        circle_contains(self.center, self.radius, p)
    }
}

/// Everything alive during one round
#[derive(Debug, Clone)]
pub struct World {
    pub config: SimConfig,
    pub bounds: Bounds,
    pub clock: SimClock,
    pub rng: Pcg32,
    pub seed: u64,
    pub player: Player,
    /// Dead bots stay in place until the round ends
    pub bots: Vec<Bot>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub bushes: Vec<Bush>,
    pub storm: Storm,
    pub outcome: RoundOutcome,
    pub tick_count: u64,
}

impl World {
    /// Build a complete round: map, bots and storm from the seed
    pub fn new(config: SimConfig, loadout: &Loadout, seed: u64) -> Self {
        let mut world = Self::empty(config, loadout, seed);
        super::mapgen::populate(&mut world);
        world
    }

    /// A round with only the player and the storm; callers add the rest
    pub fn empty(config: SimConfig, loadout: &Loadout, seed: u64) -> Self {
        let bounds = Bounds::new(config.world_width(), config.world_height());
        let center = bounds.center();
        let storm = Storm::new(
            center,
            bounds.width.min(bounds.height) * config.storm.start_radius_factor,
            &config.storm,
            0.0,
        );
        Self {
            player: Player::new(center, &config, loadout),
            config,
            bounds,
            clock: SimClock::default(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            bots: Vec::new(),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            bushes: Vec::new(),
            storm,
            outcome: RoundOutcome::Ongoing,
            tick_count: 0,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Add a bot at `pos`, returning its handle
    pub fn spawn_bot(&mut self, pos: Vec2) -> EntityRef {
        let now = self.now_ms();
        let bot = Bot::new(pos, &self.config, now, &mut self.rng);
        self.bots.push(bot);
        EntityRef::Bot(self.bots.len() - 1)
    }

    /// Body behind a handle, `None` if it no longer resolves
    pub fn body(&self, entity: EntityRef) -> Option<&Mover> {
        match entity {
            EntityRef::Player => Some(&self.player.body),
            EntityRef::Bot(i) => self.bots.get(i).map(|b| &b.body),
        }
    }

    pub fn alive_bots(&self) -> usize {
        self.bots.iter().filter(|b| b.body.is_alive()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body() -> Mover {
        Mover::new(Vec2::new(100.0, 100.0), 10.0, 2.0, 100.0)
    }

    #[test]
    fn test_damage_clamps_and_kills() {
        let mut m = body();
        m.take_damage(30.0);
        assert_eq!(m.health, 70.0);
        assert!(m.is_alive());
        m.take_damage(500.0);
        assert_eq!(m.health, 0.0);
        assert!(!m.is_alive());
        // No effect once dead
        m.take_damage(10.0);
        assert_eq!(m.health, 0.0);
    }

    #[test]
    fn test_step_slides_along_wall() {
        let mut m = body();
        // Wall directly to the right
        let wall = Obstacle::new(111.0, 0.0, 20.0, 300.0);
        m.step(Vec2::new(1.0, 1.0), &[wall]);
        assert_eq!(m.pos.x, 100.0);
        assert_eq!(m.pos.y, 102.0);
    }

    #[test]
    fn test_step_without_obstacles_scales_by_speed() {
        let mut m = body();
        m.step(Vec2::new(0.5, 0.0), &[]);
        assert_eq!(m.pos, Vec2::new(101.0, 100.0));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = Bounds::new(500.0, 400.0);
        let p = bounds.clamp_circle(Vec2::new(-20.0, 410.0), 10.0);
        assert_eq!(p, Vec2::new(10.0, 390.0));
    }

    #[test]
    fn test_projectile_spawns_clear_of_shooter() {
        let mut m = body();
        m.heading = 0.0;
        let p = Projectile::fire(&m, EntityRef::Player, 8.0, 5.0);
        assert_eq!(p.pos, Vec2::new(118.0, 100.0));
        assert_eq!(p.vel, Vec2::new(8.0, 0.0));
        assert!(!p.hits(&m));
        assert_eq!(p.side(), Side::Player);
    }

    #[test]
    fn test_projectile_leaves_world() {
        let bounds = Bounds::new(100.0, 100.0);
        let mut p = Projectile {
            pos: Vec2::new(98.0, 50.0),
            vel: Vec2::new(5.0, 0.0),
            radius: 5.0,
            owner: EntityRef::Bot(0),
            alive: true,
        };
        let prev = p.advance(&bounds);
        assert_eq!(prev, Vec2::new(98.0, 50.0));
        assert!(!p.alive);
    }

    #[test]
    fn test_player_upgrades_scale_stats() {
        let config = SimConfig::default();
        let loadout = Loadout::from_levels(10, 3);
        let player = Player::new(Vec2::ZERO, &config, &loadout);
        assert!((player.body.max_health - 200.0).abs() < 1e-4);
        assert!((player.body.speed - 2.6).abs() < 1e-4);
        assert_eq!(player.body.health, player.body.max_health);
    }

    #[test]
    fn test_clock_ignores_bad_durations() {
        let mut clock = SimClock::default();
        clock.advance(16.0);
        clock.advance(f64::NAN);
        clock.advance(-5.0);
        assert_eq!(clock.now_ms(), 16.0);
    }

    proptest! {
        #[test]
        fn prop_health_never_negative(hits in proptest::collection::vec(-50.0f32..80.0, 0..20)) {
            let mut m = body();
            for h in hits {
                m.take_damage(h);
                prop_assert!(m.health >= 0.0);
                prop_assert_eq!(m.is_alive(), m.health > 0.0);
            }
        }
    }
}
