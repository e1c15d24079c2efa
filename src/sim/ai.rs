//! Bot decision making and steering
//!
//! Every tick each living bot:
//! 1. perceives: storm pull, threatening projectiles, visible targets
//! 2. picks exactly one action from a fixed priority table
//! 3. steers by blending the action's direction with dodge/storm vectors
//!
//! Perception and action selection are pure; only `update_bot` mutates.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Bot, Bounds, Bush, EntityRef, Mover, Obstacle, Projectile, roll_patrol_interval};
use super::storm::{HazardPull, Storm};
use super::visibility::can_detect;
use crate::consts::*;
use crate::tuning::SimConfig;
use crate::{angle_between, heading_of, unit};

/// Above this urgency a bot drops everything and runs for the zone
const ESCAPE_URGENCY: f32 = 0.3;
/// Above this urgency a patrolling bot runs straight for the zone
const PATROL_ESCAPE_URGENCY: f32 = 0.2;
/// Above this urgency the storm starts bending other movement
const STEER_URGENCY: f32 = 0.1;

/// Dodge blend while a bot is forced to evade
const EVADE_FLEE_WEIGHT: f32 = 0.6;
const EVADE_STORM_WEIGHT: f32 = 0.4;
/// Dodge blend while engaging
const ENGAGE_TACTICAL_WEIGHT: f32 = 0.6;
const ENGAGE_FLEE_WEIGHT: f32 = 0.4;
/// Storm weight per unit of urgency
const ENGAGE_STORM_FACTOR: f32 = 0.3;
const PATROL_STORM_FACTOR: f32 = 0.4;
/// Sidestep blend while patrolling under fire
const PATROL_SIDESTEP_FLEE: f32 = 0.6;
const PATROL_SIDESTEP_PATROL: f32 = 0.3;
const PATROL_SIDESTEP_STORM_FACTOR: f32 = 0.1;

/// Patrol destinations stay inside this fraction of the storm radius
const PATROL_ZONE_FRACTION: f32 = 0.7;
/// Below this storm radius patrol destinations ignore the storm
const PATROL_ZONE_MIN_RADIUS: f32 = 100.0;

/// A projectile predicted to pass close to the bot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threat {
    /// Current distance from the bot
    pub distance: f32,
    /// Unit vector from the projectile toward the bot (the way to run)
    pub away: Vec2,
}

/// Chosen target for this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub entity: EntityRef,
    pub pos: Vec2,
    pub distance: f32,
}

/// Everything a bot knows when deciding
#[derive(Debug, Clone, Default)]
pub struct Perception {
    /// Present only while outside the safe zone
    pub hazard: Option<HazardPull>,
    /// Sorted nearest first
    pub threats: Vec<Threat>,
    /// Weighted escape direction from all threats
    pub flee: Option<Vec2>,
    pub target: Option<TargetInfo>,
}

impl Perception {
    pub fn nearest_threat(&self) -> Option<f32> {
        self.threats.first().map(|t| t.distance)
    }

    fn urgency(&self) -> f32 {
        self.hazard.map_or(0.0, |h| h.urgency)
    }
}

/// What a bot does this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run straight for the safe zone, no shooting
    EscapeHazard,
    /// Dodge incoming fire, no shooting
    EvadeProjectiles,
    /// Keep standoff distance from the target and shoot
    Engage,
    /// Wander between random destinations
    Patrol,
}

type Guard = fn(&Perception) -> bool;

fn deep_in_storm(p: &Perception) -> bool {
    p.urgency() > ESCAPE_URGENCY
}

fn under_close_fire(p: &Perception) -> bool {
    p.flee.is_some() && p.nearest_threat().is_some_and(|d| d < EVADE_DISTANCE)
}

fn has_target(p: &Perception) -> bool {
    p.target.is_some()
}

fn always(_: &Perception) -> bool {
    true
}

/// Top-down priority table, first matching guard wins
const PRIORITIES: [(Guard, Action); 4] = [
    (deep_in_storm, Action::EscapeHazard),
    (under_close_fire, Action::EvadeProjectiles),
    (has_target, Action::Engage),
    (always, Action::Patrol),
];

pub fn choose_action(perception: &Perception) -> Action {
    PRIORITIES
        .iter()
        .find(|(guard, _)| guard(perception))
        .map_or(Action::Patrol, |&(_, action)| action)
}

/// Read-only view of the world shared by every bot update in a tick
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub player: &'a Mover,
    pub projectiles: &'a [Projectile],
    pub storm: &'a Storm,
    pub obstacles: &'a [Obstacle],
    pub bushes: &'a [Bush],
    pub bounds: Bounds,
    pub config: &'a SimConfig,
    pub now_ms: f64,
}

/// The other bots, as seen from the bot at `index`
#[derive(Debug, Clone, Copy)]
pub struct Rivals<'a> {
    index: usize,
    before: &'a [Bot],
    after: &'a [Bot],
}

impl<'a> Rivals<'a> {
    /// `before` are the bots ahead of `index`, `after` the ones behind it
    pub fn new(index: usize, before: &'a [Bot], after: &'a [Bot]) -> Self {
        Self {
            index,
            before,
            after,
        }
    }

    /// Handle of the bot these rivals surround
    pub fn me(self) -> EntityRef {
        EntityRef::Bot(self.index)
    }

    pub fn iter(self) -> impl Iterator<Item = (EntityRef, &'a Mover)> {
        let offset = self.index + 1;
        self.before
            .iter()
            .enumerate()
            .map(|(i, b)| (EntityRef::Bot(i), &b.body))
            .chain(
                self.after
                    .iter()
                    .enumerate()
                    .map(move |(i, b)| (EntityRef::Bot(i + offset), &b.body)),
            )
    }
}

/// Projectiles that will pass close to `body` within the look-ahead window
pub fn find_threats(body: &Mover, projectiles: &[Projectile]) -> Vec<Threat> {
    let lookahead_ticks = THREAT_LOOKAHEAD_SECS * TICKS_PER_SECOND;

    let mut threats: Vec<Threat> = projectiles
        .iter()
        .filter(|p| p.alive)
        .filter_map(|p| {
            let to_bot = body.pos - p.pos;
            let distance = to_bot.length();
            let away = unit(to_bot)?;
            let heading = heading_of(unit(p.vel)?);

            let incoming = angle_between(heading, heading_of(away)) < THREAT_CONE;
            if !incoming || distance >= THREAT_RANGE {
                return None;
            }

            let future = p.pos + p.vel * lookahead_ticks;
            let clearance = body.radius + p.radius + THREAT_MARGIN;
            (future.distance(body.pos) < clearance).then_some(Threat { distance, away })
        })
        .collect();

    threats.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    threats
}

/// Weighted escape direction, nearer threats count more
pub fn flee_direction(threats: &[Threat]) -> Option<Vec2> {
    let sum: Vec2 = threats
        .iter()
        .map(|t| t.away / (t.distance + 1.0))
        .sum();
    unit(sum)
}

/// Nearest detectable living target, player considered first
pub fn select_target(body: &Mover, rivals: Rivals<'_>, ctx: &AiContext<'_>) -> Option<TargetInfo> {
    let range = ctx.config.bot.detection_range;
    let mut best: Option<TargetInfo> = None;

    let player = ctx.player;
    if player.is_alive()
        && can_detect(body.pos, player.pos, ctx.bushes, ctx.config.reveal_distance)
    {
        let distance = body.pos.distance(player.pos);
        if distance < range {
            best = Some(TargetInfo {
                entity: EntityRef::Player,
                pos: player.pos,
                distance,
            });
        }
    }

    for (entity, other) in rivals.iter() {
        if !other.is_alive() {
            continue;
        }
        let distance = body.pos.distance(other.pos);
        let nearer = best.is_none_or(|b| distance < b.distance);
        if nearer && distance < range {
            best = Some(TargetInfo {
                entity,
                pos: other.pos,
                distance,
            });
        }
    }

    best
}

pub fn perceive(bot: &Bot, rivals: Rivals<'_>, ctx: &AiContext<'_>) -> Perception {
    let threats = find_threats(&bot.body, ctx.projectiles);
    let flee = flee_direction(&threats);
    Perception {
        hazard: ctx.storm.pull(bot.body.pos),
        threats,
        flee,
        target: select_target(&bot.body, rivals, ctx),
    }
}

/// Approach, retreat or strafe depending on range to the target.
/// Zero when the target sits exactly on the bot.
pub fn tactical_direction(offset: Vec2, distance: f32, config: &SimConfig) -> Vec2 {
    let Some(toward) = unit(offset) else {
        return Vec2::ZERO;
    };
    if distance < config.bot.flee_distance {
        -toward
    } else if distance > config.bot.ideal_combat_distance {
        toward
    } else {
        toward.perp() * config.bot.strafe_speed
    }
}

pub(crate) fn cooldown_ready(last_shot_ms: Option<f64>, now_ms: f64, cooldown_ms: f64) -> bool {
    last_shot_ms.is_none_or(|t| now_ms - t >= cooldown_ms)
}

/// Run one tick of AI for a bot. Returns the projectile it fired, if any.
pub fn update_bot(
    bot: &mut Bot,
    rivals: Rivals<'_>,
    ctx: &AiContext<'_>,
    rng: &mut Pcg32,
) -> Option<Projectile> {
    if !bot.body.is_alive() {
        bot.target = None;
        return None;
    }

    let perception = perceive(bot, rivals, ctx);
    bot.target = perception.target.map(|t| t.entity);

    let shot = match choose_action(&perception) {
        Action::EscapeHazard => {
            escape_hazard(&mut bot.body, &perception, ctx);
            None
        }
        Action::EvadeProjectiles => {
            evade(&mut bot.body, &perception, ctx);
            None
        }
        Action::Engage => engage(bot, rivals.me(), &perception, ctx),
        Action::Patrol => {
            patrol(bot, &perception, ctx, rng);
            None
        }
    };

    bot.body.clamp_to(&ctx.bounds);
    shot
}

/// Obstacles that apply to a straight run for the zone
fn escape_obstacles<'a>(ctx: &AiContext<'a>) -> &'a [Obstacle] {
    if ctx.config.hazard_escape_ignores_obstacles {
        &[]
    } else {
        ctx.obstacles
    }
}

fn escape_hazard(body: &mut Mover, perception: &Perception, ctx: &AiContext<'_>) {
    if let Some(pull) = perception.hazard {
        body.step(pull.direction, escape_obstacles(ctx));
        body.face(ctx.storm.center);
    }
}

fn evade(body: &mut Mover, perception: &Perception, ctx: &AiContext<'_>) {
    let Some(flee) = perception.flee else {
        return;
    };
    let dir = match perception.hazard {
        Some(pull) => unit(flee * EVADE_FLEE_WEIGHT + pull.direction * EVADE_STORM_WEIGHT),
        None => Some(flee),
    };
    if let Some(dir) = dir {
        body.step(dir, ctx.obstacles);
    }
    if let Some(target) = perception.target {
        body.face(target.pos);
    }
}

fn engage(
    bot: &mut Bot,
    me: EntityRef,
    perception: &Perception,
    ctx: &AiContext<'_>,
) -> Option<Projectile> {
    let target = perception.target?;
    let body = &mut bot.body;
    body.face(target.pos);

    let mut steer = tactical_direction(target.pos - body.pos, target.distance, ctx.config);

    if let Some(flee) = perception.flee {
        steer = steer * ENGAGE_TACTICAL_WEIGHT + flee * ENGAGE_FLEE_WEIGHT;
    }

    if let Some(pull) = perception.hazard.filter(|h| h.urgency > STEER_URGENCY) {
        let w = pull.urgency * ENGAGE_STORM_FACTOR;
        steer = steer * (1.0 - w) + pull.direction * w;
        steer = unit(steer).unwrap_or(steer);
    }

    if steer != Vec2::ZERO {
        body.step(steer, ctx.obstacles);
    }

    let tuning = &ctx.config.bot;
    let ready = cooldown_ready(bot.last_shot_ms, ctx.now_ms, tuning.shoot_cooldown_ms);
    let in_band =
        target.distance <= tuning.detection_range && target.distance >= tuning.flee_distance;
    if !(ready && in_band) {
        return None;
    }

    bot.last_shot_ms = Some(ctx.now_ms);
    log::trace!("bot fires at {:?} from {:.0} units", target.entity, target.distance);
    Some(Projectile::fire(
        &bot.body,
        me,
        ctx.config.bot_projectile_speed,
        ctx.config.projectile_radius,
    ))
}

fn patrol(bot: &mut Bot, perception: &Perception, ctx: &AiContext<'_>, rng: &mut Pcg32) {
    if let Some(pull) = perception.hazard.filter(|h| h.urgency > PATROL_ESCAPE_URGENCY) {
        bot.body.step(pull.direction, escape_obstacles(ctx));
        bot.body.face(ctx.storm.center);
        return;
    }

    if bot.patrol.is_due(ctx.now_ms) {
        bot.patrol.changed_at_ms = Some(ctx.now_ms);
        bot.patrol.interval_ms = roll_patrol_interval(rng);
        bot.patrol.destination = pick_patrol_destination(ctx.storm, &ctx.bounds, rng);
    }

    let speed = ctx.config.bot.patrol_speed;
    let destination = bot.patrol.destination;
    let offset = destination - bot.body.pos;

    if offset.length() > PATROL_ARRIVAL {
        let mut steer = offset.normalize_or_zero() * speed;
        if let Some(pull) = perception.hazard.filter(|h| h.urgency > STEER_URGENCY) {
            let w = pull.urgency * PATROL_STORM_FACTOR;
            steer = steer * (1.0 - w) + pull.direction * w;
            steer = unit(steer).unwrap_or(steer) * speed;
        }
        bot.body.step(steer, ctx.obstacles);
        bot.body.face(destination);
    } else {
        // Arrived: pick somewhere new next tick
        bot.patrol.changed_at_ms = None;
    }

    // Under fire: an extra sidestep mixing dodge, patrol and storm
    if let Some(flee) = perception.flee {
        let storm_w = perception.urgency() * PATROL_SIDESTEP_STORM_FACTOR;
        let total = PATROL_SIDESTEP_FLEE + PATROL_SIDESTEP_PATROL + storm_w;
        let mut combined = offset.normalize_or_zero() * (PATROL_SIDESTEP_PATROL / total)
            + flee * (PATROL_SIDESTEP_FLEE / total);
        if let Some(pull) = perception.hazard {
            combined += pull.direction * (storm_w / total);
        }
        if let Some(dir) = unit(combined) {
            bot.body.step(dir * speed, ctx.obstacles);
        }
    }
}

/// New patrol destination, inside the safe zone while it is big enough
pub fn pick_patrol_destination(storm: &Storm, bounds: &Bounds, rng: &mut Pcg32) -> Vec2 {
    let lo = PATROL_EDGE_MARGIN;
    let hi_x = (bounds.width - PATROL_EDGE_MARGIN).max(lo);
    let hi_y = (bounds.height - PATROL_EDGE_MARGIN).max(lo);

    if storm.radius > PATROL_ZONE_MIN_RADIUS {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let r = rng.random_range(0.0..storm.radius * PATROL_ZONE_FRACTION);
        let p = storm.center + Vec2::from_angle(angle) * r;
        Vec2::new(p.x.clamp(lo, hi_x), p.y.clamp(lo, hi_y))
    } else {
        Vec2::new(rng.random_range(lo..=hi_x), rng.random_range(lo..=hi_y))
    }
}
