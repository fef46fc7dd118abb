use glam::Vec3;

use crate::physics::{BodyHandle, PhysicsWorld};

/// Local force that can be applied to one body exactly once.
#[derive(Debug, Clone)]
pub struct OneShotImpulse {
    target: Option<BodyHandle>,
    force: Vec3,
    point: Vec3,
    fired: bool,
}

impl OneShotImpulse {
    pub fn new(force: Vec3, point: Vec3) -> Self {
        Self {
            target: None,
            force,
            point,
            fired: false,
        }
    }

    /// Bind the target if none is bound yet. Later calls are ignored.
    pub fn designate(&mut self, body: BodyHandle) {
        if self.target.is_none() {
            self.target = Some(body);
        }
    }

    pub fn target(&self) -> Option<BodyHandle> {
        self.target
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Apply the force for the next internal step. Returns false if it already
    /// fired or no target is bound.
    pub fn trigger(&mut self, physics: &mut PhysicsWorld) -> bool {
        if self.fired {
            log::debug!("Impulse already fired");
            return false;
        }
        let Some(target) = self.target else {
            log::warn!("Impulse triggered with no target body");
            return false;
        };
        if !physics.apply_local_force(target, self.force, self.point) {
            return false;
        }
        self.fired = true;
        log::info!("Impulse {} applied", self.force);
        true
    }
}
