//! Semantic labelling of bounded planes.
//!
//! Planes are labelled floor, ceiling, wall or table relative to a
//! reference height (typically the viewer's head). The largest floor
//! candidate below the reference and the largest ceiling candidate above
//! it anchor the other labels.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use tracing::debug;

use crate::bounded::BoundedPlane;
use crate::error::{PlaneError, PlaneResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic label of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlaneLabel {
    /// Walkable surface at floor level.
    Floor,
    /// Downward-facing surface at ceiling level.
    Ceiling,
    /// Near-vertical surface.
    Wall,
    /// Upward-facing surface above the floor, such as a table or desk.
    Table,
    /// Anything else.
    Unclassified,
}

impl PlaneLabel {
    /// All labels, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Floor,
        Self::Ceiling,
        Self::Wall,
        Self::Table,
        Self::Unclassified,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::Floor => 1,
            Self::Ceiling => 1 << 1,
            Self::Wall => 1 << 2,
            Self::Table => 1 << 3,
            Self::Unclassified => 1 << 4,
        }
    }
}

impl fmt::Display for PlaneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Wall => "wall",
            Self::Table => "table",
            Self::Unclassified => "unclassified",
        };
        f.write_str(name)
    }
}

/// Set of labels whose planes should be shown.
///
/// # Example
///
/// ```
/// use surface_planes::{LabelMask, PlaneLabel};
///
/// let mask = LabelMask::FLOOR | LabelMask::WALL;
/// assert!(mask.contains(PlaneLabel::Wall));
/// assert!(!mask.contains(PlaneLabel::Table));
/// assert!(LabelMask::default().contains(PlaneLabel::Table));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelMask(u8);

impl LabelMask {
    /// No labels.
    pub const NONE: Self = Self(0);
    /// Floors only.
    pub const FLOOR: Self = Self(PlaneLabel::Floor.bit());
    /// Ceilings only.
    pub const CEILING: Self = Self(PlaneLabel::Ceiling.bit());
    /// Walls only.
    pub const WALL: Self = Self(PlaneLabel::Wall.bit());
    /// Tables only.
    pub const TABLE: Self = Self(PlaneLabel::Table.bit());
    /// Unclassified planes only.
    pub const UNCLASSIFIED: Self = Self(PlaneLabel::Unclassified.bit());
    /// Every label, including unclassified.
    pub const ALL: Self = Self(0b1_1111);

    /// Check whether `label` is in the set.
    #[must_use]
    pub const fn contains(self, label: PlaneLabel) -> bool {
        self.0 & label.bit() != 0
    }

    /// The set with `label` added.
    #[must_use]
    pub const fn with(self, label: PlaneLabel) -> Self {
        Self(self.0 | label.bit())
    }

    /// The set with `label` removed.
    #[must_use]
    pub const fn without(self, label: PlaneLabel) -> Self {
        Self(self.0 & !label.bit())
    }

    /// Check whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for LabelMask {
    fn default() -> Self {
        Self::FLOOR | Self::CEILING | Self::WALL | Self::TABLE
    }
}

impl From<PlaneLabel> for LabelMask {
    fn from(label: PlaneLabel) -> Self {
        Self(label.bit())
    }
}

impl BitOr for LabelMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LabelMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Closed height interval relative to the reference height.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeightBand {
    /// Lowest height, inclusive.
    pub min: f64,
    /// Highest height, inclusive.
    pub max: f64,
}

impl HeightBand {
    /// Create a band from `min` to `max`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether `height` lies in the band.
    #[must_use]
    pub fn contains(&self, height: f64) -> bool {
        (self.min..=self.max).contains(&height)
    }
}

impl Default for HeightBand {
    fn default() -> Self {
        Self::new(-3.0, 3.0)
    }
}

/// Parameters for plane classification.
///
/// Heights and buffers are in metres.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClassificationParams {
    /// Minimum `normal.y` for a plane to count as facing up (and maximum
    /// `-normal.y` for facing down). Default: 0.9.
    pub up_normal_threshold: f64,

    /// Up-facing planes within this distance of the dominant floor, above
    /// or below, are still floor. Default: 0.1.
    pub floor_buffer: f64,

    /// Down-facing planes up to this far below the dominant ceiling are
    /// still ceiling, and tables must stay at least this far below it.
    /// Default: 0.1.
    pub ceiling_buffer: f64,

    /// Maximum `|normal.y|` for a wall. Default: 0.1.
    pub wall_normal_tolerance: f64,

    /// Heights, relative to the reference, where walls are accepted.
    /// Default: -3 to 3.
    pub wall_band: HeightBand,

    /// Labels whose planes are visible. Default: everything but
    /// unclassified.
    pub draw_mask: LabelMask,

    /// Render layer tag for generated planes. Default: 31.
    pub render_layer: u32,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            up_normal_threshold: 0.9,
            floor_buffer: 0.1,
            ceiling_buffer: 0.1,
            wall_normal_tolerance: 0.1,
            wall_band: HeightBand::default(),
            draw_mask: LabelMask::default(),
            render_layer: 31,
        }
    }
}

impl ClassificationParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the up-facing normal threshold.
    #[must_use]
    pub const fn with_up_normal_threshold(mut self, threshold: f64) -> Self {
        self.up_normal_threshold = threshold;
        self
    }

    /// Sets the floor buffer.
    #[must_use]
    pub const fn with_floor_buffer(mut self, buffer: f64) -> Self {
        self.floor_buffer = buffer;
        self
    }

    /// Sets the ceiling buffer.
    #[must_use]
    pub const fn with_ceiling_buffer(mut self, buffer: f64) -> Self {
        self.ceiling_buffer = buffer;
        self
    }

    /// Sets the wall normal tolerance.
    #[must_use]
    pub const fn with_wall_normal_tolerance(mut self, tolerance: f64) -> Self {
        self.wall_normal_tolerance = tolerance;
        self
    }

    /// Sets the wall height band.
    #[must_use]
    pub const fn with_wall_band(mut self, band: HeightBand) -> Self {
        self.wall_band = band;
        self
    }

    /// Sets the labels to draw.
    #[must_use]
    pub const fn with_draw_mask(mut self, mask: LabelMask) -> Self {
        self.draw_mask = mask;
        self
    }

    /// Sets the render layer tag.
    #[must_use]
    pub const fn with_render_layer(mut self, layer: u32) -> Self {
        self.render_layer = layer;
        self
    }

    /// Check that every parameter is within range.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> PlaneResult<()> {
        if !(self.up_normal_threshold > 0.0 && self.up_normal_threshold <= 1.0) {
            return Err(PlaneError::invalid(format!(
                "up_normal_threshold must be in (0, 1], got {}",
                self.up_normal_threshold
            )));
        }
        if !(self.floor_buffer >= 0.0 && self.floor_buffer.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "floor_buffer must be non-negative, got {}",
                self.floor_buffer
            )));
        }
        if !(self.ceiling_buffer >= 0.0 && self.ceiling_buffer.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "ceiling_buffer must be non-negative, got {}",
                self.ceiling_buffer
            )));
        }
        if !(self.wall_normal_tolerance >= 0.0
            && self.wall_normal_tolerance < self.up_normal_threshold)
        {
            return Err(PlaneError::invalid(format!(
                "wall_normal_tolerance must be in [0, up_normal_threshold), got {}",
                self.wall_normal_tolerance
            )));
        }
        let band = self.wall_band;
        if !(band.min.is_finite() && band.max.is_finite() && band.min <= band.max) {
            return Err(PlaneError::invalid(format!(
                "wall_band must be a finite, non-inverted interval, got [{}, {}]",
                band.min, band.max
            )));
        }
        Ok(())
    }
}

/// A bounded plane with its label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifiedPlane {
    /// Geometry, unchanged by classification.
    pub plane: BoundedPlane,
    /// Assigned label.
    pub label: PlaneLabel,
    /// Whether the label is in the draw mask.
    pub visible: bool,
    /// Render layer tag.
    pub render_layer: u32,
}

/// Labelled planes of one pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classification {
    /// Planes in extraction order.
    pub planes: Vec<ClassifiedPlane>,
    /// Index of the dominant floor in `planes`.
    pub floor_index: Option<usize>,
    /// Index of the dominant ceiling in `planes`.
    pub ceiling_index: Option<usize>,
    /// World height of the dominant floor.
    pub floor_height: Option<f64>,
    /// World height of the dominant ceiling.
    pub ceiling_height: Option<f64>,
    /// Reference height the labels were computed against.
    pub reference_height: f64,
}

impl Classification {
    /// The dominant floor, if any.
    #[must_use]
    pub fn floor(&self) -> Option<&ClassifiedPlane> {
        self.floor_index.and_then(|i| self.planes.get(i))
    }

    /// The dominant ceiling, if any.
    #[must_use]
    pub fn ceiling(&self) -> Option<&ClassifiedPlane> {
        self.ceiling_index.and_then(|i| self.planes.get(i))
    }

    /// Planes with the given label.
    pub fn with_label(&self, label: PlaneLabel) -> impl Iterator<Item = &ClassifiedPlane> + '_ {
        self.planes.iter().filter(move |p| p.label == label)
    }

    /// Number of planes with the given label.
    #[must_use]
    pub fn count(&self, label: PlaneLabel) -> usize {
        self.with_label(label).count()
    }

    /// Number of planes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Check whether there are no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} planes: {} floor, {} ceiling, {} wall, {} table, {} unclassified",
            self.planes.len(),
            self.count(PlaneLabel::Floor),
            self.count(PlaneLabel::Ceiling),
            self.count(PlaneLabel::Wall),
            self.count(PlaneLabel::Table),
            self.count(PlaneLabel::Unclassified)
        )
    }
}

/// Label planes relative to `reference_height`.
///
/// Output order matches input order. Geometry is carried through
/// unchanged.
///
/// # Example
///
/// ```
/// use nalgebra::{Point3, Vector3};
/// use surface_planes::{classify, BoundedPlane, ClassificationParams, Plane, PlaneBounds, PlaneLabel};
///
/// let floor_points = [
///     Point3::new(0.0, -1.5, 0.0),
///     Point3::new(4.0, -1.5, 0.0),
///     Point3::new(4.0, -1.5, 3.0),
///     Point3::new(0.0, -1.5, 3.0),
/// ];
/// let plane = Plane::from_point_normal(floor_points[0], Vector3::y()).unwrap();
/// let bounds = PlaneBounds::from_points(&floor_points, &Vector3::y()).unwrap();
/// let floor = BoundedPlane::new(plane, bounds, 2);
///
/// let result = classify(vec![floor], 0.0, &ClassificationParams::default());
/// assert_eq!(result.planes[0].label, PlaneLabel::Floor);
/// assert_eq!(result.floor_index, Some(0));
/// ```
#[must_use]
pub fn classify(
    planes: Vec<BoundedPlane>,
    reference_height: f64,
    params: &ClassificationParams,
) -> Classification {
    let thr = params.up_normal_threshold;
    let relative = |p: &BoundedPlane| p.center().y - reference_height;

    let floor_index = dominant(&planes, |p| relative(p) < 0.0 && p.normal().y >= thr);
    let ceiling_index = dominant(&planes, |p| relative(p) > 0.0 && p.normal().y <= -thr);
    let floor_h = floor_index.map(|i| relative(&planes[i]));
    let ceiling_h = ceiling_index.map(|i| relative(&planes[i]));

    let classified: Vec<ClassifiedPlane> = planes
        .into_iter()
        .map(|plane| {
            let label = label_for(&plane, relative(&plane), floor_h, ceiling_h, params);
            ClassifiedPlane {
                plane,
                label,
                visible: params.draw_mask.contains(label),
                render_layer: params.render_layer,
            }
        })
        .collect();

    let result = Classification {
        planes: classified,
        floor_index,
        ceiling_index,
        floor_height: floor_h.map(|h| h + reference_height),
        ceiling_height: ceiling_h.map(|h| h + reference_height),
        reference_height,
    };

    debug!(
        planes = result.len(),
        floors = result.count(PlaneLabel::Floor),
        ceilings = result.count(PlaneLabel::Ceiling),
        walls = result.count(PlaneLabel::Wall),
        tables = result.count(PlaneLabel::Table),
        floor_height = ?result.floor_height,
        ceiling_height = ?result.ceiling_height,
        "Classified planes"
    );

    result
}

/// Index of the candidate with strictly greatest area; first wins ties.
fn dominant(planes: &[BoundedPlane], is_candidate: impl Fn(&BoundedPlane) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, plane) in planes.iter().enumerate() {
        if !is_candidate(plane) {
            continue;
        }
        if best.is_none_or(|(_, area)| plane.area > area) {
            best = Some((i, plane.area));
        }
    }
    best.map(|(i, _)| i)
}

fn label_for(
    plane: &BoundedPlane,
    height: f64,
    floor_h: Option<f64>,
    ceiling_h: Option<f64>,
    params: &ClassificationParams,
) -> PlaneLabel {
    let ny = plane.normal().y;
    let thr = params.up_normal_threshold;

    if ny >= thr {
        if let Some(f) = floor_h {
            if (height - f).abs() <= params.floor_buffer {
                return PlaneLabel::Floor;
            }
            if height < f {
                return PlaneLabel::Unclassified;
            }
        }
        let below_ceiling = ceiling_h.is_none_or(|c| height < c - params.ceiling_buffer);
        if below_ceiling {
            return PlaneLabel::Table;
        }
        return PlaneLabel::Unclassified;
    }

    if ny <= -thr {
        if ceiling_h.is_some_and(|c| height >= c - params.ceiling_buffer) {
            return PlaneLabel::Ceiling;
        }
        return PlaneLabel::Unclassified;
    }

    if ny.abs() <= params.wall_normal_tolerance && params.wall_band.contains(height) {
        return PlaneLabel::Wall;
    }

    PlaneLabel::Unclassified
}
