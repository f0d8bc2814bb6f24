//! Ground probing for the first-person walker.

/// Answers "what can I stand on here" for a walking camera.
///
/// Implemented by [`FlatGround`] (empty yard) and by the collision index of a
/// built layer, where container roofs become surfaces and container sides
/// become obstacles.
pub trait GroundProbe {
    /// Highest walkable surface under `(x, z)` whose top is at or below
    /// `max_y`. Open ground is `0.0`.
    fn surface_below(&self, x: f32, z: f32, max_y: f32) -> f32;

    /// True when something solid occupies the vertical span `min_y..max_y`
    /// at `(x, z)`.
    fn obstructed(&self, x: f32, z: f32, min_y: f32, max_y: f32) -> bool;
}

/// Infinite flat ground at Y = 0 with no obstacles.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGround;

impl GroundProbe for FlatGround {
    fn surface_below(&self, _x: f32, _z: f32, _max_y: f32) -> f32 {
        0.0
    }

    fn obstructed(&self, _x: f32, _z: f32, _min_y: f32, _max_y: f32) -> bool {
        false
    }
}
