use std::rc::Rc;
use std::sync::Arc;

/// Something that owns an output surface with a current client size in pixels.
pub trait RenderSurface {
    /// Current `(width, height)` in physical pixels. May be zero.
    fn client_size(&self) -> (u32, u32);
}

impl<T: RenderSurface + ?Sized> RenderSurface for Rc<T> {
    fn client_size(&self) -> (u32, u32) {
        (**self).client_size()
    }
}

impl<T: RenderSurface + ?Sized> RenderSurface for Arc<T> {
    fn client_size(&self) -> (u32, u32) {
        (**self).client_size()
    }
}

/// A surface with a fixed size, for headless runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSurface {
    pub width: u32,
    pub height: u32,
}

impl FixedSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl RenderSurface for FixedSurface {
    fn client_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_surface_reports_inner_size() {
        let surface = Rc::new(FixedSurface::new(800, 600));
        assert_eq!(surface.client_size(), (800, 600));
        let surface = Arc::new(FixedSurface::new(1, 2));
        assert_eq!(surface.client_size(), (1, 2));
    }
}
