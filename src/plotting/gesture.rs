use crate::app::ViewState;

/// One frame of a two-finger transform gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    /// Horizontal pan since the previous frame, in pixels
    pub pan_x: f64,
    /// Zoom factor since the previous frame (1.0 = unchanged)
    pub zoom: f64,
}

impl TransformDelta {
    pub fn new(pan_x: f64, zoom: f64) -> Self {
        Self { pan_x, zoom }
    }

    pub fn pan(pan_x: f64) -> Self {
        Self::new(pan_x, 1.0)
    }

    pub fn zoom(zoom: f64) -> Self {
        Self::new(0.0, zoom)
    }
}

/// Apply a gesture frame immediately, with no debouncing.
pub fn apply_transform(state: &mut ViewState, delta: TransformDelta) {
    state.multiply_zoom(delta.zoom);
    state.pan_by(delta.pan_x);
}
