//! Bush concealment
//!
//! One query answers "which bushes is this point inside". Bot detection and
//! the render view's transparency flag are both built on it.

use glam::Vec2;

use super::state::{Bush, EntityRef, World};

/// Bushes (by index) that contain a point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Concealment {
    pub areas: Vec<usize>,
}

impl Concealment {
    pub fn at(pos: Vec2, bushes: &[Bush]) -> Self {
        Self {
            areas: bushes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.contains(pos))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub fn is_concealed(&self) -> bool {
        !self.areas.is_empty()
    }

    pub fn shares_area_with(&self, other: &Concealment) -> bool {
        self.areas.iter().any(|a| other.areas.contains(a))
    }
}

/// Can an observer at `observer` detect a target at `target`?
///
/// A target hidden in a bush is invisible to observers that are not in one
/// of the same bushes, unless they are within `reveal_distance`.
pub fn can_detect(observer: Vec2, target: Vec2, bushes: &[Bush], reveal_distance: f32) -> bool {
    let hidden = Concealment::at(target, bushes);
    if !hidden.is_concealed() {
        return true;
    }
    if hidden.shares_area_with(&Concealment::at(observer, bushes)) {
        return true;
    }
    observer.distance(target) <= reveal_distance
}

impl World {
    /// Concealment of a combatant; unresolvable handles are never concealed
    pub fn concealment(&self, entity: EntityRef) -> Concealment {
        self.body(entity)
            .map(|b| Concealment::at(b.pos, &self.bushes))
            .unwrap_or_default()
    }

    /// Living combatants currently inside some bush
    pub fn concealed_entities(&self) -> Vec<EntityRef> {
        std::iter::once(EntityRef::Player)
            .chain((0..self.bots.len()).map(EntityRef::Bot))
            .filter(|&e| self.body(e).is_some_and(|b| b.is_alive()))
            .filter(|&e| self.concealment(e).is_concealed())
            .collect()
    }
}
