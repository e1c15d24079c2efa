//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Time comes only from the host-supplied tick duration
//! - Seeded RNG only
//! - Stable iteration order (player first, then bots by index)
//! - No rendering or platform dependencies

pub mod ai;
pub mod geometry;
pub mod mapgen;
pub mod state;
pub mod storm;
pub mod tick;
pub mod view;
pub mod visibility;

pub use ai::{Action, Perception, choose_action, update_bot};
pub use geometry::{Rect, circle_overlap, circle_rect_overlap, distance, segment_rect_intersect};
pub use state::{
    Bot, Bounds, Bush, EntityRef, Mover, Obstacle, Player, Projectile, RoundOutcome, Side,
    SimClock, World,
};
pub use storm::{HazardPull, Storm};
pub use tick::{TickInput, tick};
pub use view::{Camera, WorldView};
pub use visibility::{Concealment, can_detect};
