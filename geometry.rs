//! Hold geometry engine.
//!
//! Holds are persisted in resolution-independent form: positions as
//! fractions of the displayed image content area, sizes as fractions of
//! container width. This module converts between that form and absolute
//! positions in "container space" (the unzoomed coordinate system of the
//! view hosting the wall photo), assuming the photo is laid out aspect-fit:
//! scaled to show the whole image, centered behind letterbox or pillarbox
//! bars.
//!
//! Pointer input arrives in raw screen coordinates that include the current
//! pinch-zoom scale and pan offset; [`Viewport::to_container`] strips both
//! before hit-testing or encoding. Zoom and pan never change what is
//! persisted.
//!
//! Transforms require positive image and container dimensions; callers own
//! that contract, and degenerate sizes are rejected only by debug
//! assertions.

use crate::config::GeometrySettings;
use crate::models::{Hold, HoldColor};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Where the aspect-fit image content lands inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub origin: Point,
    pub size: Size,
}

/// Aspect-fit layout: the relatively wider side fills its container
/// dimension, the other is centered. Exactly one fitted dimension equals
/// the container's.
pub fn fit_rect(image: Size, container: Size) -> FitRect {
    debug_assert!(
        image.width > 0.0 && image.height > 0.0,
        "image size must be positive"
    );
    debug_assert!(
        container.width > 0.0 && container.height > 0.0,
        "container size must be positive"
    );
    if image.aspect() > container.aspect() {
        let size = Size::new(container.width, container.width / image.aspect());
        FitRect {
            origin: Point::new(0.0, (container.height - size.height) / 2.0),
            size,
        }
    } else {
        let size = Size::new(container.height * image.aspect(), container.height);
        FitRect {
            origin: Point::new((container.width - size.width) / 2.0, 0.0),
            size,
        }
    }
}

/// A hold decoded back to absolute container coordinates for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedHold {
    pub center: Point,
    pub diameter: f32,
    pub color: HoldColor,
}

/// Absolute center and diameter in container space -> persisted form.
///
/// The diameter is normalized against container width rather than image
/// width, so a hold keeps its on-screen share of the container even when
/// the letterboxing changes.
pub fn encode_hold(
    center: Point,
    diameter: f32,
    color: HoldColor,
    image: Size,
    container: Size,
) -> Hold {
    let fit = fit_rect(image, container);
    Hold {
        relative_x: (center.x - fit.origin.x) / fit.size.width,
        relative_y: (center.y - fit.origin.y) / fit.size.height,
        relative_size: diameter / container.width,
        color,
    }
}

/// Persisted form -> absolute container coordinates, for an arbitrary
/// target container (rotation, other device); the fit is recomputed for
/// whatever container is current.
pub fn decode_hold(hold: &Hold, image: Size, container: Size) -> RenderedHold {
    let fit = fit_rect(image, container);
    RenderedHold {
        center: Point::new(
            fit.origin.x + hold.relative_x * fit.size.width,
            fit.origin.y + hold.relative_y * fit.size.height,
        ),
        diameter: hold.relative_size * container.width,
        color: hold.color,
    }
}

/// Decodes a whole climb for a layout pass.
pub fn render_holds(holds: &[Hold], image: Size, container: Size) -> Vec<RenderedHold> {
    holds
        .iter()
        .map(|hold| decode_hold(hold, image, container))
        .collect()
}

/// First hold (in list order) whose padded circular target contains the
/// point; overlapping holds resolve to the earliest entry.
pub fn hit_test(
    point: Point,
    holds: &[Hold],
    image: Size,
    container: Size,
    padding: f32,
) -> Option<usize> {
    holds.iter().position(|hold| {
        let rendered = decode_hold(hold, image, container);
        point.distance_to(rendered.center) < rendered.diameter / 2.0 + padding
    })
}

/// Transient zoom/pan state of the wall view. Orthogonal to the hold
/// coordinate system and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    scale: f32,
    offset: Point,
    zoom_max: f32,
}

impl Viewport {
    pub fn new(zoom_max: f32) -> Self {
        Self {
            scale: 1.0,
            offset: Point::ORIGIN,
            zoom_max,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Clamps to `[1.0, zoom_max]`; dropping back to 1.0 also recenters.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(1.0, self.zoom_max);
        if self.scale <= 1.0 {
            self.offset = Point::ORIGIN;
        }
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset = Point::new(self.offset.x + dx, self.offset.y + dy);
    }

    /// Strips pan and zoom from a raw on-screen pointer location, yielding
    /// unzoomed container coordinates.
    pub fn to_container(&self, raw: Point) -> Point {
        Point::new(
            (raw.x - self.offset.x) / self.scale,
            (raw.y - self.offset.y) / self.scale,
        )
    }
}

/// What a gesture did to the hold list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditEvent {
    HoldPlaced(usize),
    HoldMoved(usize),
    ColorCycled(usize, HoldColor),
    HoldRemoved(usize),
    HoldResized(usize),
}

struct DragTarget {
    index: usize,
    start_center: Point,
}

struct Gesture {
    start_raw: Point,
    target: Option<DragTarget>,
}

/// Pointer gesture state machine for editing a draft climb's holds.
///
/// One editor instance lives for the duration of an edit screen, bound to
/// the wall photo's natural size and the container size captured when the
/// screen laid out. The hold list itself stays in the climb; each pointer
/// event borrows it.
///
/// A gesture that travels less than the tap threshold is a tap: on a hold
/// it advances the color cycle (red -> green -> blue -> purple -> removed),
/// on empty space it places a hold with the current default color and size.
/// A longer gesture on a hold drags it, divided by the zoom scale so the
/// hold tracks the finger in image space. The most recently placed or
/// touched hold is the "active" one; the size control writes through to it.
pub struct HoldEditor {
    image: Size,
    container: Size,
    settings: GeometrySettings,
    default_color: HoldColor,
    default_diameter: f32,
    active: Option<usize>,
    gesture: Option<Gesture>,
}

impl HoldEditor {
    pub fn new(image: Size, container: Size, settings: GeometrySettings) -> Self {
        Self {
            image,
            container,
            settings,
            default_color: HoldColor::Red,
            default_diameter: settings.hold_diameter_fraction * container.width,
            active: None,
            gesture: None,
        }
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn active_hold(&self) -> Option<usize> {
        self.active
    }

    pub fn default_color(&self) -> HoldColor {
        self.default_color
    }

    pub fn set_default_color(&mut self, color: HoldColor) {
        self.default_color = color;
    }

    pub fn default_diameter(&self) -> f32 {
        self.default_diameter
    }

    pub fn pointer_down(&mut self, raw: Point, viewport: &Viewport, holds: &[Hold]) {
        let local = viewport.to_container(raw);
        let target = hit_test(
            local,
            holds,
            self.image,
            self.container,
            self.settings.hit_padding,
        )
        .map(|index| DragTarget {
            index,
            start_center: decode_hold(&holds[index], self.image, self.container).center,
        });
        self.gesture = Some(Gesture {
            start_raw: raw,
            target,
        });
    }

    /// Drags the grabbed hold, if any. The raw finger travel is divided by
    /// the zoom scale, then applied to the hold's pre-drag center and
    /// re-encoded immediately so the drawn hold tracks the finger. The new
    /// position is intentionally not clamped to the image bounds.
    pub fn pointer_move(
        &mut self,
        raw: Point,
        viewport: &Viewport,
        holds: &mut [Hold],
    ) -> Option<EditEvent> {
        let gesture = self.gesture.as_ref()?;
        let target = gesture.target.as_ref()?;
        let hold = holds.get_mut(target.index)?;

        let scale = viewport.scale();
        let center = Point::new(
            target.start_center.x + (raw.x - gesture.start_raw.x) / scale,
            target.start_center.y + (raw.y - gesture.start_raw.y) / scale,
        );
        let fit = fit_rect(self.image, self.container);
        hold.relative_x = (center.x - fit.origin.x) / fit.size.width;
        hold.relative_y = (center.y - fit.origin.y) / fit.size.height;
        Some(EditEvent::HoldMoved(target.index))
    }

    pub fn pointer_up(
        &mut self,
        raw: Point,
        viewport: &Viewport,
        holds: &mut Vec<Hold>,
    ) -> Option<EditEvent> {
        let gesture = self.gesture.take()?;
        let travel = raw.distance_to(gesture.start_raw);
        if travel >= self.settings.tap_threshold {
            // Drag end; pointer_move already wrote the final position.
            if let Some(target) = gesture.target {
                if target.index < holds.len() {
                    self.active = Some(target.index);
                }
            }
            return None;
        }

        match gesture.target {
            Some(target) => {
                let hold = holds.get_mut(target.index)?;
                match hold.color.next() {
                    Some(color) => {
                        hold.color = color;
                        self.active = Some(target.index);
                        Some(EditEvent::ColorCycled(target.index, color))
                    }
                    None => {
                        holds.remove(target.index);
                        self.forget_index(target.index);
                        Some(EditEvent::HoldRemoved(target.index))
                    }
                }
            }
            None => {
                let local = viewport.to_container(raw);
                let hold = encode_hold(
                    local,
                    self.default_diameter,
                    self.default_color,
                    self.image,
                    self.container,
                );
                holds.push(hold);
                self.active = Some(holds.len() - 1);
                Some(EditEvent::HoldPlaced(holds.len() - 1))
            }
        }
    }

    /// The size control: updates the default for future holds and writes
    /// through to the active hold in place, re-encoded against the
    /// container captured at construction.
    pub fn set_hold_diameter(&mut self, diameter: f32, holds: &mut [Hold]) -> Option<EditEvent> {
        self.default_diameter = diameter;
        let index = self.active?;
        let hold = holds.get_mut(index)?;
        hold.relative_size = diameter / self.container.width;
        Some(EditEvent::HoldResized(index))
    }

    fn forget_index(&mut self, removed: usize) {
        self.active = match self.active {
            Some(active) if active == removed => None,
            Some(active) if active > removed => Some(active - 1),
            other => other,
        };
    }
}
