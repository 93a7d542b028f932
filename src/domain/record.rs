// ============================================================
// Layer 3 — DrivingRecord Domain Type
// ============================================================
// One captured frame from the simulator's driving log.
//
// The simulator writes a CSV row per frame:
//   center_path, left_path, right_path, steering, throttle, brake, speed
//
// Only the three image paths and the steering angle are kept.
// Records are immutable once read from disk.

/// Which of the three car-mounted cameras a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Camera {
    Center,
    Left,
    Right,
}

impl Camera {
    /// All cameras in the order they appear in the driving log
    pub const ALL: [Camera; 3] = [Camera::Center, Camera::Left, Camera::Right];

    /// Column index of this camera's image path in the CSV row
    pub fn column(self) -> usize {
        match self {
            Camera::Center => 0,
            Camera::Left   => 1,
            Camera::Right  => 2,
        }
    }
}

/// A single driving-log row.
#[derive(Debug, Clone, PartialEq)]
pub struct DrivingRecord {
    /// Image path as recorded by the simulator (center camera)
    pub center: String,

    /// Image path as recorded by the simulator (left camera)
    pub left: String,

    /// Image path as recorded by the simulator (right camera)
    pub right: String,

    /// Steering angle the human driver applied, roughly in [-1, 1]
    pub steering: f32,
}

impl DrivingRecord {
    pub fn new(
        center:   impl Into<String>,
        left:     impl Into<String>,
        right:    impl Into<String>,
        steering: f32,
    ) -> Self {
        Self {
            center: center.into(),
            left:   left.into(),
            right:  right.into(),
            steering,
        }
    }

    /// The recorded image path for the given camera
    pub fn path(&self, camera: Camera) -> &str {
        match camera {
            Camera::Center => &self.center,
            Camera::Left   => &self.left,
            Camera::Right  => &self.right,
        }
    }
}
