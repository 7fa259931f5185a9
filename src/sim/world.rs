//! Physics world
//!
//! Owns the bodies, the broad-phase index and the level edifice, and resolves
//! movement one delta at a time. Everything runs on the caller's thread; each
//! call completes before returning.
//!
//! Pusher cascades run as a worklist: the moved body goes first, then the
//! bodies it carries or shoves, each at most once per top-level `move_body`.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use slotmap::{SecondaryMap, SlotMap};

use super::body::{Body, BodyKey, CollisionHandler, Contact};
use super::motion::Movement;
use super::rect::{Rect, Size, overlaps};
use super::shape::{Shape, Transform};
use super::spatial_hash::SpatialHash;
use crate::consts::{ALL_GROUPS, CONTACT_TOLERANCE};
use crate::error::{LedgeError, Result};
use crate::settings::{ResolutionPolicy, Settings};

/// Static level geometry
#[derive(Debug, Clone)]
struct Edifice {
    shape: Shape,
    transform: Transform,
}

/// A pending move in a pusher cascade
#[derive(Debug, Clone, Copy)]
struct Push {
    key: BodyKey,
    delta: Vec2,
    /// Moved by a pusher rather than by gameplay
    carried: bool,
}

/// The simulation context: body arena, spatial index and edifice
pub struct PhysicsWorld {
    settings: Settings,
    bodies: SlotMap<BodyKey, Body>,
    /// Registration order, used for every deterministic sweep
    order: Vec<BodyKey>,
    serials: SecondaryMap<BodyKey, u64>,
    next_serial: u64,
    handlers: SecondaryMap<BodyKey, CollisionHandler>,
    index: SpatialHash<BodyKey>,
    /// Footprint each body is currently indexed under
    indexed: SecondaryMap<BodyKey, Rect>,
    edifice: Option<Edifice>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl PhysicsWorld {
    pub fn new(settings: Settings) -> Self {
        let index = SpatialHash::with_layout(settings.hash_cell_size, settings.bucket_count);
        Self {
            settings,
            bodies: SlotMap::with_key(),
            order: Vec::new(),
            serials: SecondaryMap::new(),
            next_serial: 0,
            handlers: SecondaryMap::new(),
            index,
            indexed: SecondaryMap::new(),
            edifice: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ====== Registration ======

    /// Register a body and return its handle
    pub fn add_body(&mut self, body: Body) -> BodyKey {
        let rect = body.rect();
        let key = self.bodies.insert(body);
        self.order.push(key);
        self.serials.insert(key, self.next_serial);
        self.next_serial += 1;
        self.index.put_object(rect, key);
        self.indexed.insert(key, rect);
        self.refresh_ground(key);
        log::debug!("Added body {key:?} at {rect:?}");
        key
    }

    /// Unregister a body, dropping every ground reference to it
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        let mut body = self.bodies.remove(key)?;
        self.order.retain(|&k| k != key);
        self.serials.remove(key);
        self.handlers.remove(key);
        if let Some(rect) = self.indexed.remove(key) {
            self.index.remove_object(rect, key);
        }
        for other in self.bodies.values_mut() {
            if other.ground == Some(key) {
                other.ground = None;
            }
        }
        body.ground = None;
        log::debug!("Removed body {key:?}");
        Some(body)
    }

    /// Unregister every body (room change)
    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
        self.order.clear();
        self.serials.clear();
        self.handlers.clear();
        self.index.clear();
        self.indexed.clear();
        log::debug!("Cleared all bodies");
    }

    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    pub fn contains(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in registration order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> + '_ {
        self.order
            .iter()
            .filter_map(|&key| self.bodies.get(key).map(|body| (key, body)))
    }

    /// Install the callback run when `key` collides with a body it reacts to
    pub fn set_collision_handler(
        &mut self,
        key: BodyKey,
        handler: impl FnMut(&Contact) + 'static,
    ) -> Result<()> {
        if !self.bodies.contains_key(key) {
            return Err(LedgeError::UnknownBody(key));
        }
        self.handlers.insert(key, Box::new(handler));
        Ok(())
    }

    /// Place a body without sweeping (spawns, respawns, room transitions)
    pub fn teleport(&mut self, key: BodyKey, pos: Vec2) -> Result<()> {
        let body = self
            .bodies
            .get_mut(key)
            .ok_or(LedgeError::UnknownBody(key))?;
        body.set_pos(pos);
        self.reindex(key);
        self.refresh_ground(key);
        Ok(())
    }

    pub fn resize(&mut self, key: BodyKey, size: Size) -> Result<()> {
        debug_assert!(size.x >= 0.0 && size.y >= 0.0, "negative body size {size:?}");
        let body = self
            .bodies
            .get_mut(key)
            .ok_or(LedgeError::UnknownBody(key))?;
        body.set_size(size);
        self.reindex(key);
        self.refresh_ground(key);
        Ok(())
    }

    // ====== Edifice ======

    /// Install the static solidity predicate (world-space rectangles)
    pub fn set_edifice(&mut self, is_solid: impl Fn(Rect) -> bool + 'static) {
        self.set_edifice_shape(Shape::predicate(is_solid), Transform::IDENTITY);
    }

    /// Install any shape as the static level geometry
    pub fn set_edifice_shape(&mut self, shape: Shape, transform: Transform) {
        log::debug!("Edifice set to {shape:?} at {transform:?}");
        self.edifice = Some(Edifice { shape, transform });
    }

    /// Back to "nothing is solid"
    pub fn clear_edifice(&mut self) {
        log::debug!("Edifice cleared");
        self.edifice = None;
    }

    fn edifice_probe(&self, rect: Rect) -> bool {
        self.edifice
            .as_ref()
            .is_some_and(|e| e.shape.probe(e.transform, rect))
    }

    fn edifice_raycast(&self, rect: Rect, delta: Vec2) -> f32 {
        self.edifice
            .as_ref()
            .map_or(1.0, |e| e.shape.raycast(e.transform, rect, delta))
    }

    // ====== Queries ======

    /// Bodies overlapping `area`, in registration order
    fn candidates(&self, area: Rect) -> Vec<BodyKey> {
        let mut keys = self.index.get_objects_in_rect(area);
        keys.sort_by_key(|&key| self.serials.get(key).copied().unwrap_or(u64::MAX));
        keys
    }

    /// Bodies whose footprint overlaps `rect`, filtered by group and solidity
    pub fn get_bodies_in_rect(
        &self,
        rect: Rect,
        group_mask: u32,
        only_solid: bool,
        except: Option<BodyKey>,
    ) -> Vec<BodyKey> {
        self.candidates(rect)
            .into_iter()
            .filter(|&key| Some(key) != except)
            .filter(|&key| {
                self.bodies.get(key).is_some_and(|body| {
                    (!only_solid || body.solid) && body.collision_group & group_mask != 0
                })
            })
            .collect()
    }

    /// First match of [`Self::get_bodies_in_rect`]
    pub fn first_body_in_rect(
        &self,
        rect: Rect,
        group_mask: u32,
        only_solid: bool,
        except: Option<BodyKey>,
    ) -> Option<BodyKey> {
        self.get_bodies_in_rect(rect, group_mask, only_solid, except)
            .into_iter()
            .next()
    }

    /// True if `rect` touches the edifice or a solid body `except` reacts to
    pub fn is_solid(&self, rect: Rect, except: Option<BodyKey>) -> bool {
        let mask = except
            .and_then(|key| self.bodies.get(key))
            .map_or(ALL_GROUPS, |body| body.collides_with);
        self.edifice_probe(rect)
            || self
                .solid_body_at(rect, mask, |key| Some(key) == except)
                .is_some()
    }

    /// True if the body stands on the edifice or on a solid body
    pub fn is_grounded(&self, key: BodyKey) -> bool {
        let Some(body) = self.bodies.get(key) else {
            return false;
        };
        let feet = self.feet_of(body);
        self.edifice_probe(feet) || self.solid_body_at(feet, ALL_GROUPS, |k| k == key).is_some()
    }

    fn solid_body_at(
        &self,
        rect: Rect,
        mask: u32,
        skip: impl Fn(BodyKey) -> bool,
    ) -> Option<BodyKey> {
        self.candidates(rect).into_iter().find(|&key| {
            !skip(key)
                && self.bodies.get(key).is_some_and(|body| {
                    body.solid && body.collision_group & mask != 0 && body.probe(rect)
                })
        })
    }

    /// Thin strip just below the body
    fn feet_of(&self, body: &Body) -> Rect {
        let depth = self.settings.ground_probe_depth;
        let rect = body.rect();
        Rect::new(
            Vec2::new(rect.pos.x, rect.pos.y - depth),
            Vec2::new(rect.size.x, depth),
        )
    }

    fn refresh_ground(&mut self, key: BodyKey) {
        let Some(body) = self.bodies.get(key) else {
            return;
        };
        // A pusher is not standing on what it carries
        if body.pusher {
            return;
        }
        let feet = self.feet_of(body);
        let ground = self.solid_body_at(feet, ALL_GROUPS, |k| k == key);
        if let Some(body) = self.bodies.get_mut(key) {
            body.ground = ground;
        }
    }

    fn reindex(&mut self, key: BodyKey) {
        let Some(body) = self.bodies.get(key) else {
            return;
        };
        let rect = body.rect();
        match self.indexed.insert(key, rect) {
            Some(old) if old == rect => return,
            Some(old) => self.index.remove_object(old, key),
            None => {}
        }
        self.index.put_object(rect, key);
    }

    // ====== Movement ======

    /// Move a body by up to `delta`, carrying and shoving bodies if it is a pusher.
    ///
    /// Returns how much of `delta` the body itself travelled.
    pub fn move_body(&mut self, key: BodyKey, delta: Vec2) -> Movement {
        if !self.bodies.contains_key(key) {
            log::warn!("move_body on unregistered body {key:?}");
            debug_assert!(false, "move_body on unregistered body {key:?}");
            return Movement::Blocked;
        }

        let mut settled = HashSet::from([key]);
        let mut queue = VecDeque::new();

        let first = Push {
            key,
            delta,
            carried: false,
        };
        let movement = self.step(first, &mut settled, &mut queue);

        while let Some(push) = queue.pop_front() {
            self.step(push, &mut settled, &mut queue);
        }

        movement
    }

    fn step(
        &mut self,
        push: Push,
        settled: &mut HashSet<BodyKey>,
        queue: &mut VecDeque<Push>,
    ) -> Movement {
        let Some(body) = self.bodies.get(push.key) else {
            return Movement::Blocked;
        };
        let is_pusher = body.pusher;
        let start = body.rect();

        // Riders get carried, so they must not block their carrier
        let riders: Vec<BodyKey> = if is_pusher {
            self.order
                .iter()
                .copied()
                .filter(|k| !settled.contains(k))
                .filter(|&k| self.bodies.get(k).is_some_and(|b| b.ground == Some(push.key)))
                .collect()
        } else {
            Vec::new()
        };
        settled.extend(riders.iter().copied());

        let (fraction, blocker) = self.resolve(push.key, start, push.delta, settled);
        let applied = push.delta * fraction;

        if let Some(body) = self.bodies.get_mut(push.key) {
            body.crushed = false;
            if fraction > 0.0 {
                body.set_pos(body.pos() + applied);
            }
        }
        if fraction > 0.0 {
            self.reindex(push.key);
        }

        if let Some(blocker) = blocker {
            self.collide_bodies(push.key, blocker);
        }

        if is_pusher && applied != Vec2::ZERO {
            for rider in riders {
                queue.push_back(Push {
                    key: rider,
                    delta: applied,
                    carried: true,
                });
            }
            for other in self.candidates(start.swept(applied)) {
                if settled.insert(other) {
                    queue.push_back(Push {
                        key: other,
                        delta: applied,
                        carried: true,
                    });
                }
            }
        }

        if !is_pusher {
            self.refresh_ground(push.key);
        }

        let movement = Movement::from_fraction(fraction);
        if push.carried && movement.was_obstructed() {
            if let Some(body) = self.bodies.get_mut(push.key) {
                body.crushed = true;
            }
            log::trace!("Body {:?} crushed ({:?})", push.key, movement);
        }
        log::trace!(
            "Moved {:?} by {:?} of {:?}: {:?}",
            push.key,
            applied,
            push.delta,
            movement
        );
        movement
    }

    /// Fraction of `delta` the body can travel, and the solid body that stopped it
    fn resolve(
        &self,
        key: BodyKey,
        start: Rect,
        delta: Vec2,
        settled: &HashSet<BodyKey>,
    ) -> (f32, Option<BodyKey>) {
        let mask = self.bodies.get(key).map_or(ALL_GROUPS, |b| b.collides_with);
        let is_obstacle = |k: BodyKey| {
            !settled.contains(&k)
                && self
                    .bodies
                    .get(k)
                    .is_some_and(|b| b.solid && b.collision_group & mask != 0)
        };

        match self.settings.resolution {
            ResolutionPolicy::Discrete => {
                let target = start + delta;
                let blocker = self
                    .candidates(target)
                    .into_iter()
                    .find(|&k| is_obstacle(k) && self.bodies[k].probe(target));
                if blocker.is_some() || self.edifice_probe(target) {
                    (0.0, blocker)
                } else {
                    (1.0, None)
                }
            }
            ResolutionPolicy::Swept => {
                let mut fraction = self.edifice_raycast(start, delta);
                let mut blocker = None;
                for k in self.candidates(start.swept(delta)) {
                    if !is_obstacle(k) {
                        continue;
                    }
                    let t = self.bodies[k].raycast(start, delta);
                    if t >= 1.0 {
                        continue;
                    }
                    // A body flush with the edifice still gets the contact
                    let tied = blocker.is_none() && (t - fraction).abs() <= CONTACT_TOLERANCE;
                    if t < fraction || tied {
                        fraction = fraction.min(t);
                        blocker = Some(k);
                    }
                }
                if fraction < 1.0 && delta != Vec2::ZERO {
                    // Stop a skin short of the contact face
                    let skin = self.settings.contact_skin / delta.length();
                    fraction = (fraction - skin).max(0.0);
                }
                (fraction, blocker)
            }
        }
    }

    // ====== Overlaps ======

    /// Notify every overlapping pair once, in registration order
    pub fn check_for_overlaps(&mut self) {
        let mut pairs = Vec::new();
        for (i, &a) in self.order.iter().enumerate() {
            let rect_a = self.bodies[a].rect();
            for &b in &self.order[i + 1..] {
                if overlaps(&rect_a, &self.bodies[b].rect()) {
                    pairs.push((a, b));
                }
            }
        }

        for (a, b) in pairs {
            self.collide_bodies(a, b);
        }
    }

    /// Run each side's handler if it reacts to the other's group
    fn collide_bodies(&mut self, me: BodyKey, other: BodyKey) {
        let (Some(a), Some(b)) = (self.bodies.get(me), self.bodies.get(other)) else {
            return;
        };
        let (a_group, a_reacts) = (a.collision_group, a.reacts_to(b));
        let (b_group, b_reacts) = (b.collision_group, b.reacts_to(a));

        if b_reacts {
            self.notify(other, me, a_group);
        }
        if a_reacts {
            self.notify(me, other, b_group);
        }
    }

    fn notify(&mut self, receiver: BodyKey, other: BodyKey, other_group: u32) {
        if let Some(handler) = self.handlers.get_mut(receiver) {
            handler(&Contact {
                receiver,
                other,
                other_group,
            });
        }
    }
}
