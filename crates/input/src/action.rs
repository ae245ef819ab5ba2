/// A camera action produced by a pointer backend.
///
/// Deltas are expressed as fractions of the viewport height so the same
/// gesture orbits by the same angle regardless of window size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Rotate around the target.
    Orbit { dx: f32, dy: f32 },
    /// Move towards (positive) or away from (negative) the target, in wheel steps.
    Dolly(f32),
    /// Translate camera and target in the view plane.
    Pan { dx: f32, dy: f32 },
}

impl Action {
    pub fn orbit_pixels(dx: f64, dy: f64, viewport_height: u32) -> Self {
        let h = viewport_height.max(1) as f64;
        Self::Orbit {
            dx: (dx / h) as f32,
            dy: (dy / h) as f32,
        }
    }

    pub fn pan_pixels(dx: f64, dy: f64, viewport_height: u32) -> Self {
        let h = viewport_height.max(1) as f64;
        Self::Pan {
            dx: (dx / h) as f32,
            dy: (dy / h) as f32,
        }
    }
}
