//! Read-only snapshot handed to a renderer each tick

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::state::{Bounds, Bush, EntityRef, Mover, RoundOutcome, Side, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub entity: EntityRef,
    pub pos: Vec2,
    pub heading: f32,
    pub radius: f32,
    pub health_fraction: f32,
    pub alive: bool,
    /// Standing in a bush; drawn translucent
    pub concealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub radius: f32,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StormView {
    pub center: Vec2,
    pub radius: f32,
    pub phase: f32,
}

/// Viewport rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Camera {
    /// Centre the viewport on `focus`, never showing outside the world
    pub fn follow(focus: Vec2, size: Vec2, bounds: &Bounds) -> Self {
        let max = (Vec2::new(bounds.width, bounds.height) - size).max(Vec2::ZERO);
        Self {
            origin: (focus - size / 2.0).clamp(Vec2::ZERO, max),
            size,
        }
    }

    pub fn to_screen(&self, world_pos: Vec2) -> Vec2 {
        world_pos - self.origin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    pub tick: u64,
    pub now_ms: f64,
    pub outcome: RoundOutcome,
    pub camera: Camera,
    pub player: EntityView,
    pub bots: Vec<EntityView>,
    pub projectiles: Vec<ProjectileView>,
    pub obstacles: Vec<Rect>,
    pub bushes: Vec<Bush>,
    pub storm: StormView,
}

impl World {
    pub fn view(&self) -> WorldView {
        let entity_view = |entity: EntityRef, body: &Mover| EntityView {
            entity,
            pos: body.pos,
            heading: body.heading,
            radius: body.radius,
            health_fraction: body.health_fraction(),
            alive: body.is_alive(),
            concealed: body.is_alive() && self.concealment(entity).is_concealed(),
        };

        let viewport = Vec2::new(self.config.viewport_width, self.config.viewport_height);

        WorldView {
            tick: self.tick_count,
            now_ms: self.now_ms(),
            outcome: self.outcome,
            camera: Camera::follow(self.player.body.pos, viewport, &self.bounds),
            player: entity_view(EntityRef::Player, &self.player.body),
            bots: self
                .bots
                .iter()
                .enumerate()
                .map(|(i, b)| entity_view(EntityRef::Bot(i), &b.body))
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.alive)
                .map(|p| ProjectileView {
                    pos: p.pos,
                    radius: p.radius,
                    side: p.side(),
                })
                .collect(),
            obstacles: self.obstacles.iter().map(|o| o.rect).collect(),
            bushes: self.bushes.clone(),
            storm: StormView {
                center: self.storm.center,
                radius: self.storm.radius,
                phase: self.storm.phase,
            },
        }
    }
}
