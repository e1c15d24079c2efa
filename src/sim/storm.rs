//! Shrinking safe zone
//!
//! The storm is a circle around the world centre. It loses a fixed amount of
//! radius every tick down to a floor, and once per damage interval hurts
//! everything standing outside it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::URGENCY_SPAN;
use crate::tuning::StormTuning;
use crate::unit;

/// Pull toward the safe zone felt by an entity outside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardPull {
    /// Unit vector toward the storm centre
    pub direction: Vec2,
    /// 0 at the edge, 1 at `URGENCY_SPAN` or more outside
    pub urgency: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storm {
    pub center: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub min_radius: f32,
    pub shrink_per_tick: f32,
    pub damage_per_pulse: f32,
    pub damage_interval_ms: f64,
    pub last_damage_ms: f64,
    /// Cosmetic animation angle, grows without bound
    pub phase: f32,
    phase_per_tick: f32,
}

impl Storm {
    pub fn new(center: Vec2, max_radius: f32, tuning: &StormTuning, now_ms: f64) -> Self {
        Self {
            center,
            radius: max_radius,
            max_radius,
            min_radius: tuning.min_radius,
            shrink_per_tick: tuning.shrink_per_tick,
            damage_per_pulse: tuning.damage_per_pulse,
            damage_interval_ms: tuning.damage_interval_ms,
            last_damage_ms: now_ms,
            phase: 0.0,
            phase_per_tick: tuning.phase_per_tick,
        }
    }

    /// Advance one tick. Returns true when a damage pulse is due now; the
    /// caller then damages every living entity for which `is_outside` holds.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if self.radius > self.min_radius {
            self.radius = (self.radius - self.shrink_per_tick).max(self.min_radius);
        }
        self.phase += self.phase_per_tick;

        if now_ms - self.last_damage_ms >= self.damage_interval_ms {
            self.last_damage_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn is_outside(&self, pos: Vec2) -> bool {
        pos.distance(self.center) > self.radius
    }

    /// Direction and urgency back into the zone, `None` while inside
    pub fn pull(&self, pos: Vec2) -> Option<HazardPull> {
        let offset = self.center - pos;
        let dist = offset.length();
        if dist <= self.radius {
            return None;
        }
        let direction = unit(offset)?;
        Some(HazardPull {
            direction,
            urgency: ((dist - self.radius) / URGENCY_SPAN).min(1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Mover;

    fn storm(radius: f32, shrink: f32) -> Storm {
        let tuning = StormTuning {
            shrink_per_tick: shrink,
            ..StormTuning::default()
        };
        Storm::new(Vec2::ZERO, radius, &tuning, 0.0)
    }

    #[test]
    fn test_shrinks_to_exact_floor() {
        let mut s = storm(1000.0, 0.5);
        let ticks = ((1000.0 - 200.0) / 0.5) as usize;
        for _ in 0..ticks {
            s.advance(0.0);
        }
        assert_eq!(s.radius, 200.0);
        for _ in 0..100 {
            s.advance(0.0);
        }
        assert_eq!(s.radius, 200.0);
    }

    #[test]
    fn test_default_shrink_never_undershoots() {
        let mut s = storm(1000.0, 0.05);
        for _ in 0..20_000 {
            s.advance(0.0);
            assert!(s.radius >= 200.0);
        }
        assert_eq!(s.radius, 200.0);
    }

    #[test]
    fn test_phase_grows() {
        let mut s = storm(500.0, 0.05);
        s.advance(0.0);
        s.advance(0.0);
        assert!((s.phase - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_outside_entity_takes_one_pulse_per_interval() {
        let mut s = storm(300.0, 0.0);
        let mut body = Mover::new(Vec2::new(400.0, 0.0), 18.0, 2.0, 100.0);
        let dt = 250.0;
        let mut now = 0.0;
        // 10.5 seconds of ticks
        for _ in 0..42 {
            now += dt;
            if s.advance(now) && s.is_outside(body.pos) {
                body.take_damage(s.damage_per_pulse);
            }
        }
        let pulses = (now / 1000.0).floor() as f32;
        assert_eq!(pulses, 10.0);
        assert_eq!(body.health, 100.0 - pulses * 2.0);
    }

    #[test]
    fn test_inside_entity_is_spared() {
        let mut s = storm(300.0, 0.0);
        let mut body = Mover::new(Vec2::new(100.0, 0.0), 18.0, 2.0, 100.0);
        for i in 1..=10 {
            if s.advance(i as f64 * 1000.0) && s.is_outside(body.pos) {
                body.take_damage(s.damage_per_pulse);
            }
        }
        assert_eq!(body.health, 100.0);
    }

    #[test]
    fn test_pull_urgency() {
        let s = storm(300.0, 0.0);
        assert!(s.pull(Vec2::new(299.0, 0.0)).is_none());

        let pull = s.pull(Vec2::new(400.0, 0.0)).unwrap();
        assert!((pull.urgency - 0.5).abs() < 1e-6);
        assert!((pull.direction - Vec2::new(-1.0, 0.0)).length() < 1e-6);

        let far = s.pull(Vec2::new(0.0, -900.0)).unwrap();
        assert_eq!(far.urgency, 1.0);
    }
}
