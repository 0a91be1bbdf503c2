//! GeometryEditor: pointer drag/resize results -> normalized rects in the store.
//!
//! Gestures arrive in canvas pixels; the store keeps percent-of-canvas units.
//! Every write is clamped so the rect stays fully inside the canvas whatever
//! the input (negative, larger than the canvas), and the same input always
//! yields the same rect.

use log::trace;

use crate::entities::{InteractionId, Rect};

use super::editor_events::InteractionMovedEvent;
use super::store::{StoreError, TimelineStore};
use crate::core::event_bus::EditorEventEmitter;

/// Average glyph advance in em, used to estimate label width.
const LABEL_CHAR_EM: f64 = 0.55;
/// Labels never claim more than this share of the canvas width.
const LABEL_MAX_CANVAS_SHARE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    NonFinite { what: &'static str, value: f64 },
    InvalidCanvas { width: f64, height: f64 },
    Store(StoreError),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NonFinite { what, value } => write!(f, "Non-finite {}: {}", what, value),
            GeometryError::InvalidCanvas { width, height } => {
                write!(f, "Invalid canvas size {}x{}", width, height)
            }
            GeometryError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GeometryError {}

impl From<StoreError> for GeometryError {
    fn from(e: StoreError) -> Self {
        GeometryError::Store(e)
    }
}

fn finite(what: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::NonFinite { what, value })
    }
}

/// Video canvas in pixels, plus the font size that drives minimum element size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64, font_size: f64) -> Self {
        Self {
            width,
            height,
            font_size,
        }
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0 {
            Ok(())
        } else {
            Err(GeometryError::InvalidCanvas {
                width: self.width,
                height: self.height,
            })
        }
    }

    fn x_px(&self, pct: f64) -> f64 {
        pct * self.width / 100.0
    }

    fn y_px(&self, pct: f64) -> f64 {
        pct * self.height / 100.0
    }

    fn x_pct(&self, px: f64) -> f64 {
        px * 100.0 / self.width
    }

    fn y_pct(&self, px: f64) -> f64 {
        px * 100.0 / self.height
    }
}

/// Which side of a button element its text label is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Right,
    Left,
}

/// Result of a drag: the stored rect and where the label goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub rect: Rect,
    pub label_side: Option<LabelSide>,
}

#[derive(Debug, Clone)]
pub struct GeometryEditor {
    canvas: Canvas,
    emitter: EditorEventEmitter,
}

impl GeometryEditor {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            emitter: EditorEventEmitter::dummy(),
        }
    }

    pub fn set_emitter(&mut self, emitter: EditorEventEmitter) {
        self.emitter = emitter;
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Canvas resized (player layout change).
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// Smallest allowed element side, in pixels.
    pub fn min_size_px(&self) -> f64 {
        self.canvas.font_size.max(1.0)
    }

    /// Drop position -> clamped rect written to the store.
    pub fn on_drag_end(
        &self,
        store: &mut TimelineStore,
        id: InteractionId,
        new_x: f64,
        new_y: f64,
    ) -> Result<Placement, GeometryError> {
        self.canvas.validate()?;
        let new_x = finite("x", new_x)?;
        let new_y = finite("y", new_y)?;
        let current = store
            .interaction(id)
            .ok_or(StoreError::UnknownInteraction(id))?;

        let c = &self.canvas;
        let w_px = c.x_px(current.rect.width).min(c.width);
        let h_px = c.y_px(current.rect.height).min(c.height);
        let x_px = new_x.clamp(0.0, c.width - w_px);
        let y_px = new_y.clamp(0.0, c.height - h_px);

        let rect = Rect::new(c.x_pct(x_px), c.y_pct(y_px), c.x_pct(w_px), c.y_pct(h_px));
        let label_side = current
            .label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(|l| self.label_side(&rect, l));

        store.set_rect(id, rect)?;
        trace!("Drag end {} -> {:?}", id, rect);
        self.emitter.emit(InteractionMovedEvent { interaction: id });
        Ok(Placement { rect, label_side })
    }

    /// Resize result -> size floored to the font size, kept inside the canvas.
    pub fn on_resize_end(
        &self,
        store: &mut TimelineStore,
        id: InteractionId,
        new_width: f64,
        new_height: f64,
    ) -> Result<Rect, GeometryError> {
        self.canvas.validate()?;
        let new_width = finite("width", new_width)?;
        let new_height = finite("height", new_height)?;
        let current = store
            .interaction(id)
            .ok_or(StoreError::UnknownInteraction(id))?;

        let c = &self.canvas;
        let floor = self.min_size_px();
        let w_px = new_width.max(floor).min(c.width);
        let h_px = new_height.max(floor).min(c.height);
        // Growing past the right/bottom edge pushes the element back in
        let x_px = c.x_px(current.rect.x).clamp(0.0, c.width - w_px);
        let y_px = c.y_px(current.rect.y).clamp(0.0, c.height - h_px);

        let rect = Rect::new(c.x_pct(x_px), c.y_pct(y_px), c.x_pct(w_px), c.y_pct(h_px));
        store.set_rect(id, rect)?;
        trace!("Resize end {} -> {:?}", id, rect);
        self.emitter.emit(InteractionMovedEvent { interaction: id });
        Ok(rect)
    }

    /// Put the label left of the element when it would overflow on the right.
    pub fn label_side(&self, rect: &Rect, label: &str) -> LabelSide {
        let c = &self.canvas;
        let estimate = label.chars().count() as f64 * c.font_size * LABEL_CHAR_EM;
        let label_px = estimate.min(c.width * LABEL_MAX_CANVAS_SHARE);
        let right_edge = c.x_px(rect.x + rect.width);
        if right_edge + label_px > c.width {
            LabelSide::Left
        } else {
            LabelSide::Right
        }
    }

    /// Size an image element from its picked file's pixel dimensions.
    ///
    /// Each side is floored to the font size; tiny images shrink the element
    /// height instead of being stretched; width follows the aspect ratio.
    pub fn fit_image(&self, rect: Rect, image_width: f64, image_height: f64) -> Result<Rect, GeometryError> {
        self.canvas.validate()?;
        let floor = self.min_size_px();
        let img_w = finite("image width", image_width)?.max(floor);
        let img_h = finite("image height", image_height)?.max(floor);

        let c = &self.canvas;
        let mut h_px = c.y_px(rect.height);
        if img_h < h_px || h_px < floor {
            h_px = img_h;
        }
        let h_px = h_px.min(c.height);
        let w_px = (h_px * img_w / img_h).min(c.width);

        let x_px = c.x_px(rect.x).clamp(0.0, c.width - w_px);
        let y_px = c.y_px(rect.y).clamp(0.0, c.height - h_px);
        Ok(Rect::new(c.x_pct(x_px), c.y_pct(y_px), c.x_pct(w_px), c.y_pct(h_px)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Interaction, TimeWindow};

    fn setup(rect: Rect) -> (GeometryEditor, TimelineStore, InteractionId) {
        let mut store = TimelineStore::new();
        let mut ia = Interaction::new("H5P.Text 1.1", TimeWindow::new(0.0, 10.0));
        ia.rect = rect;
        let id = store.add_interaction(ia);
        (GeometryEditor::new(Canvas::new(100.0, 100.0, 4.0)), store, id)
    }

    #[test]
    fn test_drag_clamps_to_canvas() {
        let (geo, mut store, id) = setup(Rect::new(20.0, 20.0, 10.0, 10.0));

        let p = geo.on_drag_end(&mut store, id, -50.0, 30.0).unwrap();
        assert_eq!(p.rect.x, 0.0);
        assert_eq!(p.rect.y, 30.0);

        let p = geo.on_drag_end(&mut store, id, 150.0, 500.0).unwrap();
        assert_eq!(p.rect.x, 90.0);
        assert_eq!(p.rect.y, 90.0);
        assert_eq!(store.interaction(id).unwrap().rect, p.rect);
    }

    #[test]
    fn test_drag_is_idempotent() {
        let (geo, mut store, id) = setup(Rect::new(0.0, 0.0, 25.0, 10.0));
        let first = geo.on_drag_end(&mut store, id, 80.0, 5.0).unwrap();
        let second = geo.on_drag_end(&mut store, id, 80.0, 5.0).unwrap();
        assert_eq!(first, second);
        assert!(second.rect.is_inside_canvas());
    }

    #[test]
    fn test_drag_scales_to_percent() {
        let mut store = TimelineStore::new();
        let mut ia = Interaction::new("H5P.Text 1.1", TimeWindow::new(0.0, 10.0));
        ia.rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let id = store.add_interaction(ia);
        let geo = GeometryEditor::new(Canvas::new(640.0, 360.0, 16.0));

        let p = geo.on_drag_end(&mut store, id, 320.0, 1000.0).unwrap();
        assert_eq!(p.rect.x, 50.0);
        assert_eq!(p.rect.y, 90.0);
    }

    #[test]
    fn test_resize_floors_to_font_size() {
        let (geo, mut store, id) = setup(Rect::new(10.0, 10.0, 10.0, 10.0));
        let rect = geo.on_resize_end(&mut store, id, -20.0, 0.0).unwrap();
        assert_eq!(rect.width, 4.0);
        assert_eq!(rect.height, 4.0);
    }

    #[test]
    fn test_resize_never_leaves_canvas() {
        let (geo, mut store, id) = setup(Rect::new(80.0, 95.0, 10.0, 5.0));
        let rect = geo.on_resize_end(&mut store, id, 50.0, 500.0).unwrap();
        assert_eq!(rect.width, 50.0);
        assert_eq!(rect.height, 100.0);
        assert_eq!(rect.x, 50.0);
        assert_eq!(rect.y, 0.0);
        assert!(rect.is_inside_canvas());
    }

    #[test]
    fn test_non_finite_rejected_without_mutation() {
        let (geo, mut store, id) = setup(Rect::new(10.0, 10.0, 10.0, 10.0));
        let err = geo.on_drag_end(&mut store, id, f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { what: "x", .. }));
        assert_eq!(store.interaction(id).unwrap().rect, Rect::new(10.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn test_unknown_interaction() {
        let (geo, mut store, _) = setup(Rect::default());
        let ghost = InteractionId::new();
        assert_eq!(
            geo.on_resize_end(&mut store, ghost, 10.0, 10.0),
            Err(GeometryError::Store(StoreError::UnknownInteraction(ghost)))
        );
    }

    #[test]
    fn test_label_flips_near_right_edge() {
        let (geo, mut store, id) = setup(Rect::new(0.0, 0.0, 10.0, 10.0));
        store
            .modify_interaction(id, |ia| ia.label = Some("Click me".into()))
            .unwrap();
        let p = geo.on_drag_end(&mut store, id, 5.0, 0.0).unwrap();
        assert_eq!(p.label_side, Some(LabelSide::Right));
        let p = geo.on_drag_end(&mut store, id, 90.0, 0.0).unwrap();
        assert_eq!(p.label_side, Some(LabelSide::Left));
    }

    #[test]
    fn test_fit_image_keeps_aspect() {
        let geo = GeometryEditor::new(Canvas::new(100.0, 100.0, 4.0));
        // Small 20x10 image into a 40% tall element: height shrinks to the image
        let rect = geo.fit_image(Rect::new(0.0, 0.0, 40.0, 40.0), 20.0, 10.0).unwrap();
        assert_eq!(rect.height, 10.0);
        assert_eq!(rect.width, 20.0);

        // Tiny image is floored to the font size on each side
        let rect = geo.fit_image(Rect::new(0.0, 0.0, 40.0, 40.0), 1.0, 2.0).unwrap();
        assert_eq!(rect.height, 4.0);
        assert_eq!(rect.width, 4.0);
    }
}
