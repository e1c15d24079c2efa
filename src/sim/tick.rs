//! Fixed-order simulation tick
//!
//! Advances a `World` by one step. The host supplies the elapsed simulated
//! time, so replaying the same inputs with the same seed reproduces a round.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::{self, AiContext, Rivals, cooldown_ready};
use super::geometry::segment_rect_intersect;
use super::state::{
    Bot, Bounds, EntityRef, Mover, Obstacle, Projectile, RoundOutcome, Side, World,
};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Movement intent, any length; normalized before use
    pub intent: Vec2,
    /// Aim point in world coordinates
    pub aim: Option<Vec2>,
    /// Fire request, rate limited by the player cooldown
    pub fire: bool,
}

impl TickInput {
    /// Intent from four direction keys (screen space, y grows downward)
    pub fn from_keys(up: bool, down: bool, left: bool, right: bool) -> Self {
        let axis = |neg: bool, pos: bool| f32::from(pos as u8) - f32::from(neg as u8);
        Self {
            intent: Vec2::new(axis(left, right), axis(up, down)),
            ..Default::default()
        }
    }

    /// Unit movement direction; malformed intent counts as standing still
    pub fn movement(&self) -> Vec2 {
        if self.intent.is_finite() {
            self.intent.normalize_or_zero()
        } else {
            Vec2::ZERO
        }
    }

    fn aim_point(&self) -> Option<Vec2> {
        self.aim.filter(|a| a.is_finite())
    }
}

/// Advance the world by one tick of `dt_ms` simulated milliseconds.
/// Once the round is decided further calls change nothing.
pub fn tick(world: &mut World, input: &TickInput, dt_ms: f64) -> RoundOutcome {
    if world.outcome.is_over() {
        return world.outcome;
    }

    world.clock.advance(dt_ms);
    world.tick_count += 1;
    let now_ms = world.now_ms();

    update_player(world, input, now_ms);
    update_storm(world, now_ms);
    update_bots(world, now_ms);

    advance_projectiles(&mut world.projectiles, &world.obstacles, &world.bounds);
    world.projectiles.retain(|p| p.alive);
    resolve_projectile_hits(
        &mut world.projectiles,
        &mut world.player.body,
        &mut world.bots,
        world.config.hit_damage,
    );

    world.outcome = round_outcome(world);
    match world.outcome {
        RoundOutcome::Victory => log::info!(
            "Round won after {} ticks ({:.0} ms)",
            world.tick_count,
            now_ms
        ),
        RoundOutcome::Defeat => log::info!(
            "Round lost after {} ticks, {} bots left",
            world.tick_count,
            world.alive_bots()
        ),
        RoundOutcome::Ongoing => {}
    }
    world.outcome
}

fn update_player(world: &mut World, input: &TickInput, now_ms: f64) {
    let player = &mut world.player;

    if player.body.is_alive() {
        player.intent = input.movement();
        player.body.step(player.intent, &world.obstacles);
        if let Some(aim) = input.aim_point() {
            player.aim = aim;
        }
        player.body.face(player.aim);
    }
    player.body.clamp_to(&world.bounds);

    let config = &world.config;
    if input.fire
        && player.body.is_alive()
        && cooldown_ready(player.last_shot_ms, now_ms, config.player_shoot_cooldown_ms)
    {
        player.last_shot_ms = Some(now_ms);
        world.projectiles.push(Projectile::fire(
            &player.body,
            EntityRef::Player,
            config.player_projectile_speed,
            config.projectile_radius,
        ));
    }
}

fn update_storm(world: &mut World, now_ms: f64) {
    if !world.storm.advance(now_ms) {
        return;
    }
    let storm = &world.storm;
    let bodies = std::iter::once(&mut world.player.body)
        .chain(world.bots.iter_mut().map(|b| &mut b.body));
    for body in bodies {
        if body.is_alive() && storm.is_outside(body.pos) {
            body.take_damage(storm.damage_per_pulse);
        }
    }
}

/// Run every bot's AI in index order. A fired shot enters the world at
/// once, so later bots already see it as a threat this tick.
fn update_bots(world: &mut World, now_ms: f64) {
    let World {
        config,
        bounds,
        rng,
        player,
        bots,
        projectiles,
        obstacles,
        bushes,
        storm,
        ..
    } = world;

    for i in 0..bots.len() {
        let (before, rest) = bots.split_at_mut(i);
        let Some((bot, after)) = rest.split_first_mut() else {
            break;
        };
        let ctx = AiContext {
            player: &player.body,
            projectiles: projectiles.as_slice(),
            storm: &*storm,
            obstacles: obstacles.as_slice(),
            bushes: bushes.as_slice(),
            bounds: *bounds,
            config: &*config,
            now_ms,
        };
        if let Some(shot) = ai::update_bot(bot, Rivals::new(i, before, after), &ctx, rng) {
            projectiles.push(shot);
        }
    }
}

/// Move live projectiles one step. A projectile dies when it leaves the
/// world or when its path this step crosses a wall.
pub fn advance_projectiles(projectiles: &mut [Projectile], obstacles: &[Obstacle], bounds: &Bounds) {
    for p in projectiles.iter_mut().filter(|p| p.alive) {
        let prev = p.advance(bounds);
        if p.alive && obstacles.iter().any(|o| segment_rect_intersect(prev, p.pos, &o.rect)) {
            p.alive = false;
        }
    }
}

/// Apply projectile hits in three passes: player shots against bots, bot
/// shots against the player, then bot shots against every bot except the
/// shooter. Each projectile is consumed by the first body it overlaps, so a
/// shot spent in an earlier pass never reaches a later one.
pub fn resolve_projectile_hits(
    projectiles: &mut [Projectile],
    player: &mut Mover,
    bots: &mut [Bot],
    damage: f32,
) {
    for p in projectiles
        .iter_mut()
        .filter(|p| p.alive && p.side() == Side::Player)
    {
        hit_first_bot(p, bots, None, damage);
    }

    for p in projectiles
        .iter_mut()
        .filter(|p| p.alive && p.side() == Side::Bot)
    {
        if p.hits(player) {
            player.take_damage(damage);
            p.alive = false;
            if !player.is_alive() {
                log::debug!("player eliminated by {:?}", p.owner);
            }
        }
    }

    for p in projectiles.iter_mut().filter(|p| p.alive) {
        if let EntityRef::Bot(shooter) = p.owner {
            hit_first_bot(p, bots, Some(shooter), damage);
        }
    }
}

fn hit_first_bot(p: &mut Projectile, bots: &mut [Bot], shooter: Option<usize>, damage: f32) {
    let victim = bots
        .iter_mut()
        .enumerate()
        .find(|(i, b)| Some(*i) != shooter && p.hits(&b.body));
    if let Some((i, bot)) = victim {
        bot.body.take_damage(damage);
        p.alive = false;
        if !bot.body.is_alive() {
            log::debug!("bot {i} eliminated by {:?}", p.owner);
        }
    }
}

fn round_outcome(world: &World) -> RoundOutcome {
    if !world.player.body.is_alive() {
        RoundOutcome::Defeat
    } else if world.alive_bots() == 0 {
        RoundOutcome::Victory
    } else {
        RoundOutcome::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_MS;
    use crate::progression::Loadout;
    use crate::tuning::SimConfig;

    fn empty_world() -> World {
        World::empty(SimConfig::default(), &Loadout::default(), 42)
    }

    fn shot(pos: Vec2, vel: Vec2, owner: EntityRef) -> Projectile {
        Projectile {
            pos,
            vel,
            radius: 5.0,
            owner,
            alive: true,
        }
    }

    #[test]
    fn test_bot_closes_to_ideal_distance_then_strafes() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(300.0, 0.0));
        let input = TickInput::default();

        let mut last = 300.0;
        let mut approach_ticks = 0;
        while last > 200.0 {
            tick(&mut world, &input, TICK_MS);
            let d = world.bots[0].body.pos.distance(world.player.body.pos);
            assert!(d < last, "bot should approach every tick");
            last = d;
            approach_ticks += 1;
            assert!(approach_ticks < 100);
        }

        let before = world.bots[0].body.pos;
        for _ in 0..10 {
            tick(&mut world, &input, TICK_MS);
            let d = world.bots[0].body.pos.distance(world.player.body.pos);
            assert!((d - 200.0).abs() < 5.0, "distance drifted to {d}");
        }
        let lateral = (world.bots[0].body.pos.y - before.y).abs();
        assert!(lateral > 5.0);
    }

    #[test]
    fn test_player_shot_hits_only_overlapping_bot() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        world.spawn_bot(center + Vec2::new(-900.0, 0.0));
        let target = world.bots[0].body.pos;
        let mut projectiles = vec![shot(target + Vec2::new(10.0, 0.0), Vec2::ZERO, EntityRef::Player)];

        resolve_projectile_hits(
            &mut projectiles,
            &mut world.player.body,
            &mut world.bots,
            world.config.hit_damage,
        );

        assert_eq!(world.bots[0].body.health, 90.0);
        assert!(!projectiles[0].alive);
        assert_eq!(world.bots[1].body.health, 100.0);
        assert_eq!(world.player.body.health, 100.0);
    }

    #[test]
    fn test_projectile_consumed_once_entity_hit_many_times() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        // Second bot stacked on the first; only the first in order is hit
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        let at = world.bots[0].body.pos;
        let mut projectiles = vec![
            shot(at, Vec2::ZERO, EntityRef::Player),
            shot(at, Vec2::ZERO, EntityRef::Player),
        ];

        resolve_projectile_hits(&mut projectiles, &mut world.player.body, &mut world.bots, 10.0);

        assert_eq!(world.bots[0].body.health, 80.0);
        assert_eq!(world.bots[1].body.health, 100.0);
        assert!(projectiles.iter().all(|p| !p.alive));
    }

    #[test]
    fn test_bot_shot_skips_its_shooter() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        world.spawn_bot(center + Vec2::new(420.0, 0.0));
        let at = world.bots[0].body.pos;
        let mut projectiles = vec![shot(at, Vec2::ZERO, EntityRef::Bot(0))];

        resolve_projectile_hits(&mut projectiles, &mut world.player.body, &mut world.bots, 10.0);

        assert_eq!(world.bots[0].body.health, 100.0);
        assert_eq!(world.bots[1].body.health, 90.0);
        assert!(!projectiles[0].alive);
    }

    #[test]
    fn test_bot_shot_prefers_player() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(10.0, 0.0));
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        let mut projectiles = vec![shot(center, Vec2::ZERO, EntityRef::Bot(1))];

        resolve_projectile_hits(&mut projectiles, &mut world.player.body, &mut world.bots, 10.0);

        assert_eq!(world.player.body.health, 90.0);
        assert_eq!(world.bots[0].body.health, 100.0);
    }

    #[test]
    fn test_player_shots_resolve_before_bot_shots() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(400.0, 0.0));
        world.spawn_bot(center + Vec2::new(-900.0, 0.0));
        world.bots[0].body.health = 10.0;
        let at = world.bots[0].body.pos;
        // The bot shot comes first in storage but the player pass runs first
        let mut projectiles = vec![
            shot(at, Vec2::ZERO, EntityRef::Bot(1)),
            shot(at, Vec2::ZERO, EntityRef::Player),
        ];

        resolve_projectile_hits(&mut projectiles, &mut world.player.body, &mut world.bots, 10.0);

        assert!(!world.bots[0].body.is_alive());
        assert!(!projectiles[1].alive);
        assert!(projectiles[0].alive, "dead bots no longer absorb shots");
        assert_eq!(world.bots[1].body.health, 100.0);
        assert_eq!(world.player.body.health, 100.0);
    }

    #[test]
    fn test_later_bot_sees_shot_fired_this_tick() {
        let mut world = empty_world();
        let center = world.bounds.center();
        // Out of the player's detection range, so the two bots target each other
        let start = center + Vec2::new(150.0, 700.0);
        world.spawn_bot(center + Vec2::new(0.0, 700.0));
        world.spawn_bot(start);

        update_bots(&mut world, 0.0);

        assert_eq!(world.projectiles.len(), 2);
        assert_eq!(world.projectiles[0].owner, EntityRef::Bot(0));
        // Bot 1 strafes sideways and also backs off from bot 0's fresh shot
        let moved = world.bots[1].body.pos - start;
        assert!(moved.x > 0.5, "bot 1 ignored the incoming shot: {moved:?}");
    }

    #[test]
    fn test_wall_stops_projectile() {
        let bounds = Bounds::new(1000.0, 1000.0);
        let wall = Obstacle::new(104.0, 0.0, 2.0, 500.0);
        // Tunnels through the wall in one step
        let mut projectiles = vec![
            shot(Vec2::new(100.0, 100.0), Vec2::new(8.0, 0.0), EntityRef::Player),
            shot(Vec2::new(100.0, 600.0), Vec2::new(8.0, 0.0), EntityRef::Player),
        ];
        advance_projectiles(&mut projectiles, &[wall], &bounds);
        assert!(!projectiles[0].alive);
        assert!(projectiles[1].alive);
        assert_eq!(projectiles[1].pos, Vec2::new(108.0, 600.0));
    }

    #[test]
    fn test_player_moves_and_fires_with_cooldown() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(-2000.0, 0.0));

        let input = TickInput {
            aim: Some(center + Vec2::new(0.0, 500.0)),
            fire: true,
            ..TickInput::from_keys(false, false, false, true)
        };
        tick(&mut world, &input, 100.0);
        assert_eq!(world.player.body.pos, center + Vec2::new(2.0, 0.0));
        let fired: Vec<_> = world
            .projectiles
            .iter()
            .filter(|p| p.owner == EntityRef::Player)
            .collect();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].vel.y > 7.9);

        // 100 ms later the 200 ms cooldown still holds
        tick(&mut world, &input, 100.0);
        let count = |w: &World| w.projectiles.iter().filter(|p| p.owner == EntityRef::Player).count();
        assert_eq!(count(&world), 1);
        tick(&mut world, &input, 100.0);
        assert_eq!(count(&world), 2);
    }

    #[test]
    fn test_malformed_input_is_ignored() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(-2000.0, 0.0));
        let input = TickInput {
            intent: Vec2::new(f32::NAN, 1.0),
            aim: Some(Vec2::new(f32::INFINITY, 0.0)),
            fire: false,
        };
        tick(&mut world, &input, TICK_MS);
        assert_eq!(world.player.body.pos, center);
        assert!(world.player.body.heading.is_finite());
    }

    #[test]
    fn test_storm_pulses_outside_entities() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.storm.radius = 300.0;
        world.player.body.pos = center + Vec2::new(500.0, 0.0);
        world.spawn_bot(center + Vec2::new(0.0, 100.0));

        // 2.5 simulated seconds in 250 ms steps
        for _ in 0..10 {
            tick(&mut world, &TickInput::default(), 250.0);
        }
        assert_eq!(world.player.body.health, 96.0);
        assert_eq!(world.bots[0].body.health, 100.0);
    }

    #[test]
    fn test_victory_and_defeat() {
        let mut world = empty_world();
        let center = world.bounds.center();
        world.spawn_bot(center + Vec2::new(-2000.0, 0.0));
        world.bots[0].body.take_damage(1000.0);
        assert_eq!(tick(&mut world, &TickInput::default(), TICK_MS), RoundOutcome::Victory);

        let mut world = empty_world();
        world.spawn_bot(center + Vec2::new(-2000.0, 0.0));
        world.player.body.take_damage(1000.0);
        assert_eq!(tick(&mut world, &TickInput::default(), TICK_MS), RoundOutcome::Defeat);
    }

    #[test]
    fn test_finished_round_is_frozen() {
        let mut world = empty_world();
        world.player.body.take_damage(1000.0);
        tick(&mut world, &TickInput::default(), TICK_MS);
        let ticks = world.tick_count;
        let now = world.now_ms();
        assert_eq!(tick(&mut world, &TickInput::default(), TICK_MS), RoundOutcome::Defeat);
        assert_eq!(world.tick_count, ticks);
        assert_eq!(world.now_ms(), now);
    }

    #[test]
    fn test_determinism() {
        let config = SimConfig::default();
        let mut a = World::new(config.clone(), &Loadout::default(), 99_999);
        let mut b = World::new(config, &Loadout::default(), 99_999);

        let inputs = [
            TickInput::from_keys(true, false, false, false),
            TickInput {
                fire: true,
                aim: Some(Vec2::new(100.0, 100.0)),
                ..Default::default()
            },
            TickInput::from_keys(false, true, true, false),
            TickInput::default(),
        ];

        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            tick(&mut a, input, TICK_MS);
            tick(&mut b, input, TICK_MS);
        }

        assert_eq!(a.tick_count, b.tick_count);
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.projectiles.len(), b.projectiles.len());
        for (x, y) in a.bots.iter().zip(&b.bots) {
            assert_eq!(x.body.pos, y.body.pos);
            assert_eq!(x.body.health, y.body.health);
            assert_eq!(x.target, y.target);
        }
        assert_eq!(a.player.body.health, b.player.body.health);
    }
}
