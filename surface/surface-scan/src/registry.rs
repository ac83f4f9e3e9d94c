//! Current set of classified surfaces.
//!
//! Each pass publishes a new [`SurfaceGeneration`] by swapping an `Arc`,
//! so a reader holding a generation never sees planes from two passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};
use surface_planes::{Classification, ClassifiedPlane, PlaneLabel};
use tracing::debug;

use crate::sync::{read, write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether generated surfaces are shown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurfaceVisibility {
    /// Planes in the draw mask are shown.
    #[default]
    Shown,
    /// Every plane is hidden.
    Hidden,
}

/// Classified planes from one pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceGeneration {
    /// Generation number; 0 is the empty initial generation.
    pub number: u64,
    /// The pass' classification.
    pub classification: Classification,
}

impl SurfaceGeneration {
    /// Planes in extraction order.
    #[must_use]
    pub fn planes(&self) -> &[ClassifiedPlane] {
        &self.classification.planes
    }

    /// The dominant floor, if any.
    #[must_use]
    pub fn floor(&self) -> Option<&ClassifiedPlane> {
        self.classification.floor()
    }

    /// The dominant ceiling, if any.
    #[must_use]
    pub fn ceiling(&self) -> Option<&ClassifiedPlane> {
        self.classification.ceiling()
    }

    /// World height of the dominant floor.
    #[must_use]
    pub fn floor_height(&self) -> Option<f64> {
        self.classification.floor_height
    }

    /// World height of the dominant ceiling.
    #[must_use]
    pub fn ceiling_height(&self) -> Option<f64> {
        self.classification.ceiling_height
    }

    /// Check whether the generation holds no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classification.is_empty()
    }
}

/// Render-facing view of one classified plane.
///
/// The slab is centred half its thickness above the plane, so its bottom
/// face lies on the scanned surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceInstance {
    /// World-space slab center.
    pub center: Point3<f64>,
    /// Rotation taking local X/Y/Z to the long axis, short axis and normal.
    pub rotation: UnitQuaternion<f64>,
    /// Unit plane normal.
    pub normal: Vector3<f64>,
    /// In-plane axis along the long side.
    pub axis_u: Vector3<f64>,
    /// In-plane axis along the short side.
    pub axis_v: Vector3<f64>,
    /// Full side lengths.
    pub size: Vector2<f64>,
    /// Slab thickness along the normal.
    pub thickness: f64,
    /// Plane label.
    pub label: PlaneLabel,
    /// Whether the slab should be drawn.
    pub visible: bool,
    /// Render layer tag.
    pub render_layer: u32,
}

/// Holder of the current surface generation.
///
/// # Example
///
/// ```
/// use surface_planes::Classification;
/// use surface_scan::{SurfaceRegistry, SurfaceVisibility};
///
/// let registry = SurfaceRegistry::new();
/// let before = registry.current();
///
/// let number = registry.replace_all(Classification::default());
/// assert_eq!(number, 1);
/// assert_eq!(before.number, 0);
///
/// registry.set_visibility(SurfaceVisibility::Hidden);
/// assert_eq!(registry.visibility(), SurfaceVisibility::Hidden);
/// ```
#[derive(Debug)]
pub struct SurfaceRegistry {
    current: RwLock<Arc<SurfaceGeneration>>,
    shown: AtomicBool,
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRegistry {
    /// Create a registry holding the empty generation 0, shown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(SurfaceGeneration::default())),
            shown: AtomicBool::new(true),
        }
    }

    /// Install a new generation and return its number.
    pub fn replace_all(&self, classification: Classification) -> u64 {
        let mut current = write(&self.current, "surface registry");
        let number = current.number + 1;
        let planes = classification.len();
        *current = Arc::new(SurfaceGeneration {
            number,
            classification,
        });
        debug!(generation = number, planes, "Replaced surfaces");
        number
    }

    /// Install an empty generation and return its number.
    pub fn clear(&self) -> u64 {
        self.replace_all(Classification::default())
    }

    /// Snapshot of the current generation.
    #[must_use]
    pub fn current(&self) -> Arc<SurfaceGeneration> {
        Arc::clone(&read(&self.current, "surface registry"))
    }

    /// Number of the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        read(&self.current, "surface registry").number
    }

    /// Show or hide every surface, independent of regeneration.
    pub fn set_visibility(&self, visibility: SurfaceVisibility) {
        self.shown
            .store(visibility == SurfaceVisibility::Shown, Ordering::SeqCst);
        debug!(?visibility, "Surface visibility changed");
    }

    /// Current global visibility.
    #[must_use]
    pub fn visibility(&self) -> SurfaceVisibility {
        if self.shown.load(Ordering::SeqCst) {
            SurfaceVisibility::Shown
        } else {
            SurfaceVisibility::Hidden
        }
    }

    /// Render-facing slabs of the current generation.
    ///
    /// A slab is visible when its label is in the draw mask and the
    /// registry is shown.
    #[must_use]
    pub fn instances(&self, thickness: f64) -> Vec<SurfaceInstance> {
        let generation = self.current();
        let shown = self.visibility() == SurfaceVisibility::Shown;
        generation
            .planes()
            .iter()
            .map(|classified| {
                let plane = &classified.plane;
                let normal = plane.normal();
                SurfaceInstance {
                    center: plane.center() + normal * (thickness / 2.0),
                    rotation: plane.rotation(),
                    normal,
                    axis_u: plane.bounds.axis_u,
                    axis_v: plane.bounds.axis_v,
                    size: plane.extents(),
                    thickness,
                    label: classified.label,
                    visible: classified.visible && shown,
                    render_layer: classified.render_layer,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use surface_planes::{
        BoundedPlane, ClassificationParams, LabelMask, Plane, PlaneBounds, classify,
    };

    fn floor_and_table() -> Classification {
        let square = |y: f64, half: f64| {
            let corners = [
                Point3::new(-half, y, -half),
                Point3::new(half, y, -half),
                Point3::new(half, y, half),
                Point3::new(-half, y, half),
            ];
            let plane = Plane::from_point_normal(corners[0], Vector3::y()).unwrap();
            let bounds = PlaneBounds::from_points(&corners, &Vector3::y()).unwrap();
            BoundedPlane::new(plane, bounds, 2)
        };
        let params = ClassificationParams::default().with_draw_mask(LabelMask::FLOOR);
        classify(vec![square(-1.5, 2.0), square(-0.8, 0.5)], 0.0, &params)
    }

    #[test]
    fn generations_are_numbered() {
        let registry = SurfaceRegistry::new();
        assert_eq!(registry.generation(), 0);
        assert_eq!(registry.replace_all(floor_and_table()), 1);
        assert_eq!(registry.clear(), 2);
        assert!(registry.current().is_empty());
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let registry = SurfaceRegistry::new();
        registry.replace_all(floor_and_table());
        let held = registry.current();

        registry.clear();
        assert_eq!(held.number, 1);
        assert_eq!(held.planes().len(), 2);
        assert!(held.floor().is_some());
        assert_relative_eq!(held.floor_height().unwrap(), -1.5, epsilon = 1e-9);
    }

    #[test]
    fn instances_lift_slabs_and_combine_visibility() {
        let registry = SurfaceRegistry::new();
        registry.replace_all(floor_and_table());

        let instances = registry.instances(0.02);
        assert_eq!(instances.len(), 2);
        assert_relative_eq!(instances[0].center.y, -1.49, epsilon = 1e-9);
        assert_relative_eq!(instances[0].size.x, 4.0, epsilon = 1e-9);
        assert_eq!(instances[0].label, PlaneLabel::Floor);
        assert!(instances[0].visible);
        // Table is outside the draw mask
        assert_eq!(instances[1].label, PlaneLabel::Table);
        assert!(!instances[1].visible);

        registry.set_visibility(SurfaceVisibility::Hidden);
        assert!(registry.instances(0.02).iter().all(|i| !i.visible));

        registry.set_visibility(SurfaceVisibility::Shown);
        assert!(registry.instances(0.02)[0].visible);
    }
}
