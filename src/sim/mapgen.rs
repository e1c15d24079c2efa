//! Seeded round layout: walls, bushes and bot spawns
//!
//! Every element is rejection-sampled with a bounded number of attempts.
//! Scenery that cannot be placed is skipped; bots always spawn so a round
//! starts with exactly `bot_count` of them.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Bush, Obstacle, World};

/// Keep-out band along the world edge for every placed element
const EDGE_MARGIN: f32 = 50.0;

const BOT_MIN_PLAYER_DISTANCE: f32 = 150.0;

const BUSH_SIZE_MIN: f32 = 80.0;
const BUSH_SIZE_MAX: f32 = 120.0;
const BUSH_MIN_PLAYER_DISTANCE: f32 = 100.0;
const BUSH_MIN_SPACING: f32 = 60.0;

/// Long side and short side ranges of a wall
const WALL_LONG_MIN: f32 = 80.0;
const WALL_LONG_MAX: f32 = 200.0;
const WALL_SHORT_MIN: f32 = 20.0;
const WALL_SHORT_MAX: f32 = 35.0;
const WALL_MIN_PLAYER_DISTANCE: f32 = 100.0;

/// Fill an empty world with bushes, walls and bots
pub fn populate(world: &mut World) {
    place_bushes(world);
    place_walls(world);
    spawn_bots(world);

    log::info!(
        "Map seed {}: {} bots, {} bushes, {} walls in {}x{}",
        world.seed,
        world.bots.len(),
        world.bushes.len(),
        world.obstacles.len(),
        world.bounds.width,
        world.bounds.height
    );
}

/// Roll up to `attempts` candidates. `Err` carries the last rejected one.
fn sample<T>(
    rng: &mut Pcg32,
    attempts: u32,
    mut roll: impl FnMut(&mut Pcg32) -> T,
    accept: impl Fn(&T) -> bool,
) -> Result<T, T> {
    let mut candidate = roll(rng);
    for _ in 1..attempts.max(1) {
        if accept(&candidate) {
            return Ok(candidate);
        }
        candidate = roll(rng);
    }
    if accept(&candidate) {
        Ok(candidate)
    } else {
        Err(candidate)
    }
}

/// Uniform in `[lo, hi]`, collapsing to `lo` when the range is empty
fn span(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

fn place_bushes(world: &mut World) {
    let player = world.player.body.pos;
    let (width, height) = (world.bounds.width, world.bounds.height);
    let attempts = world.config.placement_attempts;

    for i in 0..world.config.bush_count {
        let placed = sample(
            &mut world.rng,
            attempts,
            |rng| {
                let radius = rng.random_range(BUSH_SIZE_MIN..=BUSH_SIZE_MAX) / 2.0;
                let center = Vec2::new(
                    span(rng, EDGE_MARGIN, width - EDGE_MARGIN),
                    span(rng, EDGE_MARGIN, height - EDGE_MARGIN),
                );
                Bush::new(center, radius)
            },
            |bush| {
                bush.center.distance(player) >= BUSH_MIN_PLAYER_DISTANCE
                    && world
                        .bushes
                        .iter()
                        .all(|other| other.center.distance(bush.center) >= BUSH_MIN_SPACING)
            },
        );
        match placed {
            Ok(bush) => world.bushes.push(bush),
            Err(_) => log::debug!("bush {i} skipped after {attempts} attempts"),
        }
    }
}

fn place_walls(world: &mut World) {
    let player = world.player.body.pos;
    let player_radius = world.player.body.radius;
    let (width, height) = (world.bounds.width, world.bounds.height);
    let attempts = world.config.placement_attempts;

    for i in 0..world.config.wall_count {
        let placed = sample(
            &mut world.rng,
            attempts,
            |rng| {
                let long = rng.random_range(WALL_LONG_MIN..=WALL_LONG_MAX);
                let short = rng.random_range(WALL_SHORT_MIN..=WALL_SHORT_MAX);
                let (w, h) = if rng.random_bool(0.5) {
                    (long, short)
                } else {
                    (short, long)
                };
                let x = span(rng, EDGE_MARGIN, width - w - EDGE_MARGIN);
                let y = span(rng, EDGE_MARGIN, height - h - EDGE_MARGIN);
                Obstacle::new(x, y, w, h)
            },
            |wall| {
                let center = wall.rect.center();
                let reach = wall.rect.width.max(wall.rect.height) / 2.0;
                center.distance(player) >= WALL_MIN_PLAYER_DISTANCE
                    && !wall.blocks(player, player_radius)
                    && !world.obstacles.iter().any(|o| o.rect.touches(&wall.rect))
                    && world
                        .bushes
                        .iter()
                        .all(|b| center.distance(b.center) >= b.radius + reach)
            },
        );
        match placed {
            Ok(wall) => world.obstacles.push(wall),
            Err(_) => log::debug!("wall {i} skipped after {attempts} attempts"),
        }
    }
}

/// Bots go last so they never start inside a wall
fn spawn_bots(world: &mut World) {
    let player = world.player.body.pos;
    let bot_radius = world.config.bot_radius;
    let (width, height) = (world.bounds.width, world.bounds.height);
    let attempts = world.config.placement_attempts;

    for i in 0..world.config.bot_count {
        let spot = sample(
            &mut world.rng,
            attempts,
            |rng| {
                Vec2::new(
                    span(rng, EDGE_MARGIN, width - EDGE_MARGIN),
                    span(rng, EDGE_MARGIN, height - EDGE_MARGIN),
                )
            },
            |&pos| {
                pos.distance(player) >= BOT_MIN_PLAYER_DISTANCE
                    && !world.obstacles.iter().any(|o| o.blocks(pos, bot_radius))
            },
        );
        let pos = spot.unwrap_or_else(|last| {
            log::debug!("bot {i} placed without clearance after {attempts} attempts");
            last
        });
        world.spawn_bot(pos);
    }
}
