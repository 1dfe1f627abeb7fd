//! Hand skeleton data model.
//!
//! A [`LandmarkSet`] is exactly 21 points in the fixed MediaPipe hand order.
//! Every geometric rule downstream addresses points by index, so the order is
//! part of the type's contract: index 0 is the wrist, 4 the thumb tip, and
//! each finger runs knuckle → mid joint → distal joint → tip.
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19
//!      4     6   10  14  18        mid joints (PIP)
//!     3      5 ─ 9 ─ 13 ─ 17       knuckles (MCP)
//!      2      \           /
//!       1 ──── 0 ─────────         wrist
//! ```

pub mod normalize;

use serde::{Deserialize, Serialize};

use crate::error::{FingerspellError, Result};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Bones drawn by the synthetic renderer: the thumb chain from the wrist,
/// three segments per remaining finger, the knuckle line, and the two
/// wrist-to-palm edges.
pub const BONE_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
    (WRIST, INDEX_MCP), (WRIST, PINKY_MCP),
];

/// One tracked skeletal point.
///
/// `x`/`y` are pixel coordinates in the source frame (y grows downward).
/// `z` is the detector's relative depth and is carried through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, y) Euclidean distance. Depth is ignored.
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The four non-thumb fingers, in anatomical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub const fn knuckle(self) -> usize {
        match self {
            Finger::Index => INDEX_MCP,
            Finger::Middle => MIDDLE_MCP,
            Finger::Ring => RING_MCP,
            Finger::Pinky => PINKY_MCP,
        }
    }

    pub const fn mid_joint(self) -> usize {
        match self {
            Finger::Index => INDEX_PIP,
            Finger::Middle => MIDDLE_PIP,
            Finger::Ring => RING_PIP,
            Finger::Pinky => PINKY_PIP,
        }
    }

    pub const fn tip(self) -> usize {
        match self {
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }
}

/// Exactly 21 landmarks for a single hand, fixed for one classification pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet([Landmark; LANDMARK_COUNT]);

impl LandmarkSet {
    pub const fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    /// Build a set from a detector slice.
    ///
    /// # Errors
    /// `InvalidLandmarkCount` unless the slice holds exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Result<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FingerspellError::InvalidLandmarkCount {
                found: points.len(),
            })?;
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.0
    }

    /// Apply `f` to every point, preserving index identity.
    pub fn map(&self, mut f: impl FnMut(Landmark) -> Landmark) -> Self {
        let mut out = self.0;
        for point in out.iter_mut() {
            *point = f(*point);
        }
        Self(out)
    }

    pub fn distance(&self, a: usize, b: usize) -> f32 {
        self.0[a].distance_to(&self.0[b])
    }

    /// Tip strictly above its mid joint.
    pub fn is_raised(&self, finger: Finger) -> bool {
        self.0[finger.tip()].y < self.0[finger.mid_joint()].y
    }

    /// Tip strictly below its mid joint.
    pub fn is_curled(&self, finger: Finger) -> bool {
        self.0[finger.tip()].y > self.0[finger.mid_joint()].y
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.0.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.0[index]
    }
}

impl TryFrom<&[Landmark]> for LandmarkSet {
    type Error = FingerspellError;

    fn try_from(points: &[Landmark]) -> Result<Self> {
        Self::from_slice(points)
    }
}

/// One recorded detector frame: a timestamp plus zero or 21 landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandFrame {
    /// Milliseconds since the start of the recording.
    pub t_ms: u64,
    /// Empty when the detector saw no hand.
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn from_slice_requires_exactly_twenty_one_points() {
        let short = vec![Landmark::default(); 20];
        let err = LandmarkSet::from_slice(&short).unwrap_err();
        assert!(matches!(err, FingerspellError::InvalidLandmarkCount { found: 20 }));

        let long = vec![Landmark::default(); 22];
        assert!(LandmarkSet::try_from(long.as_slice()).is_err());

        let exact = vec![Landmark::new(1.0, 2.0, 3.0); 21];
        let set = LandmarkSet::from_slice(&exact).expect("21 points");
        assert_eq!(set[THUMB_TIP], Landmark::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn bone_table_covers_every_landmark() {
        let mut seen = [false; LANDMARK_COUNT];
        for (a, b) in BONE_CONNECTIONS {
            seen[a] = true;
            seen[b] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn finger_state_uses_strict_vertical_order() {
        let palm = open_palm();
        assert!(Finger::ALL.iter().all(|f| palm.is_raised(*f)));
        assert!(Finger::ALL.iter().all(|f| !palm.is_curled(*f)));

        let flat = collapsed(10.0, 10.0);
        assert!(Finger::ALL.iter().all(|f| !flat.is_raised(*f) && !flat.is_curled(*f)));
    }

    #[test]
    fn planar_distance_ignores_depth() {
        let a = Landmark::new(0.0, 0.0, 5.0);
        let b = Landmark::new(3.0, 4.0, -5.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn hand_frame_deserializes_with_missing_landmarks_as_no_hand() {
        let frame: HandFrame = serde_json::from_str(r#"{"tMs": 40}"#).expect("parse frame");
        assert_eq!(frame.t_ms, 40);
        assert!(frame.landmarks.is_empty());

        let frame: HandFrame =
            serde_json::from_str(r#"{"tMs": 0, "landmarks": [{"x": 1.5, "y": 2.5}]}"#)
                .expect("parse frame");
        assert_eq!(frame.landmarks[0], Landmark::new(1.5, 2.5, 0.0));
    }
}
