//! Raycast boundary — the capability the focus aggregator queries each frame,
//! plus a sphere-collider scene used for trace replay and tests.

use tracing::debug;

use super::math::Vec3;

/// Opaque handle to the collider that was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColliderHandle(pub u64);

/// A raycast hit against the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastHit {
    /// Scene object name.
    pub target: String,
    /// World-space hit point.
    pub point: Vec3,
    pub collider: ColliderHandle,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Anything that can answer "what does this ray hit first".
pub trait Raycast {
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RaycastHit>;
}

/// A scene with nothing in it. Every ray misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScene;

impl Raycast for EmptyScene {
    fn raycast(&self, _origin: Vec3, _direction: Vec3) -> Option<RaycastHit> {
        None
    }
}

// ── Sphere scene ────────────────────────────────────────────

/// A named sphere collider.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereCollider {
    pub name: String,
    pub center: Vec3,
    pub radius: f32,
    pub handle: ColliderHandle,
    /// Disabled colliders are skipped by raycasts.
    pub enabled: bool,
}

impl SphereCollider {
    pub fn new(name: impl Into<String>, center: Vec3, radius: f32, handle: u64) -> Self {
        Self {
            name: name.into(),
            center,
            radius,
            handle: ColliderHandle(handle),
            enabled: true,
        }
    }

    /// Distance along a unit-length ray to the first intersection, if any.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        // |o + t*d - c|^2 = r^2 with |d| = 1
        let oc = origin - self.center;
        let b = oc.dot(direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        if near >= 0.0 {
            return Some(near);
        }
        // Origin inside the sphere: take the exit point.
        let far = -b + sqrt_disc;
        (far >= 0.0).then_some(far)
    }
}

/// A flat list of sphere colliders; nearest hit wins.
#[derive(Debug, Clone, Default)]
pub struct SphereScene {
    pub colliders: Vec<SphereCollider>,
}

impl SphereScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: SphereCollider) {
        debug!("Scene collider added: {} r={:.2}", collider.name, collider.radius);
        self.colliders.push(collider);
    }

    /// Enable or disable a collider by handle. Returns false if not found.
    pub fn set_enabled(&mut self, handle: ColliderHandle, enabled: bool) -> bool {
        match self.colliders.iter_mut().find(|c| c.handle == handle) {
            Some(c) => {
                c.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl Raycast for SphereScene {
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RaycastHit> {
        let dir = direction.normalize();
        if dir.is_zero() || !origin.is_finite() {
            return None;
        }

        self.colliders
            .iter()
            .filter(|c| c.enabled)
            .filter_map(|c| c.intersect(origin, dir).map(|t| (c, t)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, t)| RaycastHit {
                target: c.name.clone(),
                point: origin + dir * t,
                collider: c.handle,
                distance: t,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SphereScene {
        let mut s = SphereScene::new();
        s.add(SphereCollider::new("Near", Vec3::new(0.0, 0.0, 5.0), 1.0, 1));
        s.add(SphereCollider::new("Far", Vec3::new(0.0, 0.0, 10.0), 1.0, 2));
        s.add(SphereCollider::new("Side", Vec3::new(5.0, 0.0, 5.0), 1.0, 3));
        s
    }

    #[test]
    fn test_nearest_hit_wins() {
        let hit = scene().raycast(Vec3::ZERO, Vec3::FORWARD);
        let hit = hit.map(|h| (h.target, h.collider, h.distance));
        assert_eq!(hit.as_ref().map(|h| h.0.as_str()), Some("Near"));
        assert_eq!(hit.as_ref().map(|h| h.1), Some(ColliderHandle(1)));
        assert!(hit.map(|h| (h.2 - 4.0).abs() < 1e-4).unwrap_or(false));
    }

    #[test]
    fn test_miss_returns_none() {
        assert!(scene().raycast(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)).is_none());
        assert!(scene().raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_disabled_collider_is_skipped() {
        let mut s = scene();
        assert!(s.set_enabled(ColliderHandle(1), false));
        let hit = s.raycast(Vec3::ZERO, Vec3::FORWARD);
        assert_eq!(hit.map(|h| h.target), Some("Far".to_string()));
        assert!(!s.set_enabled(ColliderHandle(99), false));
    }

    #[test]
    fn test_zero_direction_misses() {
        assert!(scene().raycast(Vec3::ZERO, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_origin_inside_sphere_hits_exit() {
        let hit = scene().raycast(Vec3::new(0.0, 0.0, 5.0), Vec3::FORWARD);
        let hit = hit.map(|h| (h.target, h.distance));
        assert_eq!(hit.as_ref().map(|h| h.0.as_str()), Some("Near"));
        assert!(hit.map(|h| (h.1 - 1.0).abs() < 1e-4).unwrap_or(false));
    }

    #[test]
    fn test_empty_scene_always_misses() {
        assert!(EmptyScene.raycast(Vec3::ZERO, Vec3::FORWARD).is_none());
    }
}
