//! # Drawing Model
//!
//! A renderer-independent 2D drawing: world-coordinate entities grouped on
//! named layers. Design generators build a [`Drawing`]; the GUI canvas, the
//! SVG writer and the DXF writer all consume the same value.
//!
//! World coordinates are y-up, in the drawing's [`DrawingUnits`].
//! [`Viewport`] maps them onto a y-down pixel surface.
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::drawing::{Drawing, DrawingUnits, Layer, Point, Viewport};
//!
//! let mut drawing = Drawing::new("Column C1", DrawingUnits::Millimetres);
//! drawing.rect(Layer::Outline, Point::new(0.0, 0.0), Point::new(300.0, 450.0));
//!
//! let viewport = Viewport::fit(drawing.extents(), 800.0, 600.0, 20.0);
//! let top_left = viewport.to_screen(Point::new(0.0, 450.0));
//! assert!(top_left.y < 300.0);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Length unit of world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawingUnits {
    Millimetres,
    Metres,
}

impl DrawingUnits {
    /// DXF `$INSUNITS` code
    pub fn dxf_code(self) -> i32 {
        match self {
            DrawingUnits::Millimetres => 4,
            DrawingUnits::Metres => 6,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DrawingUnits::Millimetres => "mm",
            DrawingUnits::Metres => "m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Drawing layers. Each maps to a DXF layer name and a display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Outline,
    Reinforcement,
    Centerline,
    Grid,
    Profile,
    Ground,
    Fill,
    Dimensions,
    Text,
}

impl Layer {
    pub const ALL: [Layer; 9] = [
        Layer::Outline,
        Layer::Reinforcement,
        Layer::Centerline,
        Layer::Grid,
        Layer::Profile,
        Layer::Ground,
        Layer::Fill,
        Layer::Dimensions,
        Layer::Text,
    ];

    /// DXF layer name
    pub fn name(self) -> &'static str {
        match self {
            Layer::Outline => "OUTLINE",
            Layer::Reinforcement => "REINFORCEMENT",
            Layer::Centerline => "CENTERLINE",
            Layer::Grid => "GRID",
            Layer::Profile => "PROFILE",
            Layer::Ground => "GROUND",
            Layer::Fill => "CUT_FILL",
            Layer::Dimensions => "DIMENSIONS",
            Layer::Text => "TEXT",
        }
    }

    /// AutoCAD colour index
    pub fn aci_color(self) -> i32 {
        match self {
            Layer::Outline => 7,
            Layer::Reinforcement => 1,
            Layer::Centerline => 4,
            Layer::Grid => 8,
            Layer::Profile => 5,
            Layer::Ground => 3,
            Layer::Fill => 2,
            Layer::Dimensions => 6,
            Layer::Text => 7,
        }
    }

    /// Display colour as RGB in `0.0..=1.0`, for light backgrounds
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Layer::Outline => [0.1, 0.1, 0.1],
            Layer::Reinforcement => [0.8, 0.1, 0.1],
            Layer::Centerline => [0.0, 0.55, 0.6],
            Layer::Grid => [0.75, 0.75, 0.75],
            Layer::Profile => [0.1, 0.3, 0.85],
            Layer::Ground => [0.2, 0.55, 0.2],
            Layer::Fill => [0.75, 0.6, 0.1],
            Layer::Dimensions => [0.6, 0.2, 0.6],
            Layer::Text => [0.2, 0.2, 0.2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A drawing primitive in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Line {
        layer: Layer,
        from: Point,
        to: Point,
    },
    Polyline {
        layer: Layer,
        points: Vec<Point>,
        closed: bool,
    },
    Circle {
        layer: Layer,
        center: Point,
        radius: f64,
    },
    /// Counter-clockwise arc from `start_deg` to `end_deg`
    Arc {
        layer: Layer,
        center: Point,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
    },
    /// Single line of text; `position` is the baseline anchor
    Text {
        layer: Layer,
        position: Point,
        height: f64,
        content: String,
        align: TextAlign,
    },
}

impl Entity {
    pub fn layer(&self) -> Layer {
        match self {
            Entity::Line { layer, .. }
            | Entity::Polyline { layer, .. }
            | Entity::Circle { layer, .. }
            | Entity::Arc { layer, .. }
            | Entity::Text { layer, .. } => *layer,
        }
    }

    fn extend(&self, extents: &mut Extents) {
        match self {
            Entity::Line { from, to, .. } => {
                extents.include(*from);
                extents.include(*to);
            }
            Entity::Polyline { points, .. } => points.iter().for_each(|p| extents.include(*p)),
            Entity::Circle { center, radius, .. } => {
                extents.include(center.offset(-radius, -radius));
                extents.include(center.offset(*radius, *radius));
            }
            Entity::Arc {
                center,
                radius,
                start_deg,
                end_deg,
                ..
            } => arc_points(*center, *radius, *start_deg, *end_deg, 32)
                .into_iter()
                .for_each(|p| extents.include(p)),
            Entity::Text {
                position,
                height,
                content,
                align,
                ..
            } => {
                let width = text_width(content, *height);
                let left = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - width / 2.0,
                    TextAlign::Right => position.x - width,
                };
                extents.include(Point::new(left, position.y));
                extents.include(Point::new(left + width, position.y + height));
            }
        }
    }
}

/// Approximate rendered width of a single line of text
pub fn text_width(content: &str, height: f64) -> f64 {
    content.chars().count() as f64 * height * 0.6
}

/// Counter-clockwise sweep from `start_deg` to `end_deg`, in `(0, 360]`.
///
/// Equal angles modulo 360 are a full turn.
pub fn arc_sweep(start_deg: f64, end_deg: f64) -> f64 {
    let sweep = (end_deg - start_deg).rem_euclid(360.0);
    if sweep == 0.0 {
        360.0
    } else {
        sweep
    }
}

/// Sample an arc into a polyline, counter-clockwise from start to end.
pub fn arc_points(center: Point, radius: f64, start_deg: f64, end_deg: f64, segments: usize) -> Vec<Point> {
    let sweep = arc_sweep(start_deg, end_deg);
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let angle = (start_deg + sweep * i as f64 / segments as f64) * PI / 180.0;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Axis-aligned bounding box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Point,
    pub max: Point,
}

impl Extents {
    /// An empty box that any point will replace
    pub fn empty() -> Self {
        Extents {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }
}

/// A complete drawing produced by one design generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub title: String,
    pub units: DrawingUnits,
    pub entities: Vec<Entity>,
}

impl Drawing {
    pub fn new(title: impl Into<String>, units: DrawingUnits) -> Self {
        Drawing {
            title: title.into(),
            units,
            entities: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn push(&mut self, entity: Entity) -> &mut Self {
        self.entities.push(entity);
        self
    }

    pub fn line(&mut self, layer: Layer, from: Point, to: Point) -> &mut Self {
        self.push(Entity::Line { layer, from, to })
    }

    pub fn polyline(&mut self, layer: Layer, points: Vec<Point>, closed: bool) -> &mut Self {
        self.push(Entity::Polyline { layer, points, closed })
    }

    /// Closed rectangle given two opposite corners
    pub fn rect(&mut self, layer: Layer, a: Point, b: Point) -> &mut Self {
        let points = vec![
            Point::new(a.x, a.y),
            Point::new(b.x, a.y),
            Point::new(b.x, b.y),
            Point::new(a.x, b.y),
        ];
        self.polyline(layer, points, true)
    }

    pub fn circle(&mut self, layer: Layer, center: Point, radius: f64) -> &mut Self {
        self.push(Entity::Circle { layer, center, radius })
    }

    pub fn arc(&mut self, layer: Layer, center: Point, radius: f64, start_deg: f64, end_deg: f64) -> &mut Self {
        self.push(Entity::Arc {
            layer,
            center,
            radius,
            start_deg,
            end_deg,
        })
    }

    pub fn text(&mut self, position: Point, height: f64, content: impl Into<String>) -> &mut Self {
        self.text_aligned(position, height, content, TextAlign::Left)
    }

    pub fn text_aligned(
        &mut self,
        position: Point,
        height: f64,
        content: impl Into<String>,
        align: TextAlign,
    ) -> &mut Self {
        self.push(Entity::Text {
            layer: Layer::Text,
            position,
            height,
            content: content.into(),
            align,
        })
    }

    /// Horizontal dimension line with end ticks and a centred label
    pub fn dimension_h(&mut self, from: Point, to: Point, label: impl Into<String>, text_height: f64) -> &mut Self {
        let tick = text_height * 0.5;
        self.line(Layer::Dimensions, from, Point::new(to.x, from.y));
        self.line(Layer::Dimensions, from.offset(0.0, -tick), from.offset(0.0, tick));
        self.line(Layer::Dimensions, Point::new(to.x, from.y - tick), Point::new(to.x, from.y + tick));
        self.push(Entity::Text {
            layer: Layer::Dimensions,
            position: Point::new((from.x + to.x) / 2.0, from.y + tick),
            height: text_height,
            content: label.into(),
            align: TextAlign::Center,
        })
    }

    /// Vertical dimension line with end ticks and a label to its right
    pub fn dimension_v(&mut self, from: Point, to: Point, label: impl Into<String>, text_height: f64) -> &mut Self {
        let tick = text_height * 0.5;
        self.line(Layer::Dimensions, from, Point::new(from.x, to.y));
        self.line(Layer::Dimensions, from.offset(-tick, 0.0), from.offset(tick, 0.0));
        self.line(Layer::Dimensions, Point::new(from.x - tick, to.y), Point::new(from.x + tick, to.y));
        self.push(Entity::Text {
            layer: Layer::Dimensions,
            position: Point::new(from.x + tick * 2.0, (from.y + to.y) / 2.0),
            height: text_height,
            content: label.into(),
            align: TextAlign::Left,
        })
    }

    /// Bounding box of all entities
    pub fn extents(&self) -> Extents {
        let mut extents = Extents::empty();
        for entity in &self.entities {
            entity.extend(&mut extents);
        }
        extents
    }

    /// Layers actually used, in [`Layer::ALL`] order
    pub fn layers(&self) -> Vec<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|l| self.entities.iter().any(|e| e.layer() == *l))
            .collect()
    }

    pub fn count_on(&self, layer: Layer) -> usize {
        self.entities.iter().filter(|e| e.layer() == layer).count()
    }
}

/// Uniform world-to-screen transform that fits a drawing into a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Pixels per world unit
    pub scale: f64,
    origin: Point,
    offset_x: f64,
    offset_y: f64,
    surface_height: f64,
}

impl Viewport {
    /// Fit `extents` into a `width` x `height` surface with `margin` pixels
    /// on every side, preserving aspect ratio and centring the drawing.
    pub fn fit(extents: Extents, width: f64, height: f64, margin: f64) -> Self {
        let usable_w = (width - 2.0 * margin).max(1.0);
        let usable_h = (height - 2.0 * margin).max(1.0);

        if extents.is_empty() {
            return Viewport {
                scale: 1.0,
                origin: Point::new(0.0, 0.0),
                offset_x: margin,
                offset_y: margin,
                surface_height: height,
            };
        }

        let world_w = extents.width().max(f64::EPSILON);
        let world_h = extents.height().max(f64::EPSILON);
        let scale = (usable_w / world_w).min(usable_h / world_h);

        Viewport {
            scale,
            origin: extents.min,
            offset_x: margin + (usable_w - world_w * scale) / 2.0,
            offset_y: margin + (usable_h - world_h * scale) / 2.0,
            surface_height: height,
        }
    }

    /// World point to y-down surface coordinates
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(
            self.offset_x + (p.x - self.origin.x) * self.scale,
            self.surface_height - (self.offset_y + (p.y - self.origin.y) * self.scale),
        )
    }

    /// World length to pixels
    pub fn length(&self, d: f64) -> f64 {
        d * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Drawing {
        let mut d = Drawing::new("Sample", DrawingUnits::Millimetres);
        d.rect(Layer::Outline, Point::new(0.0, 0.0), Point::new(300.0, 450.0))
            .circle(Layer::Reinforcement, Point::new(50.0, 50.0), 8.0);
        d
    }

    #[test]
    fn test_extents() {
        let extents = sample().extents();
        assert_eq!(extents.min, Point::new(0.0, 0.0));
        assert_eq!(extents.max, Point::new(300.0, 450.0));
        assert!(Drawing::new("empty", DrawingUnits::Metres).extents().is_empty());
    }

    #[test]
    fn test_layers_in_canonical_order() {
        let mut d = sample();
        d.text(Point::new(0.0, -20.0), 10.0, "C1");
        assert_eq!(d.layers(), vec![Layer::Outline, Layer::Reinforcement, Layer::Text]);
    }

    #[test]
    fn test_viewport_fits_and_flips() {
        let vp = Viewport::fit(sample().extents(), 800.0, 600.0, 20.0);
        // 560 px of height for 450 mm governs
        assert!((vp.scale - 560.0 / 450.0).abs() < 1e-9);

        let bottom_left = vp.to_screen(Point::new(0.0, 0.0));
        let top_right = vp.to_screen(Point::new(300.0, 450.0));
        assert!((bottom_left.y - 580.0).abs() < 1e-9);
        assert!((top_right.y - 20.0).abs() < 1e-9);
        // centred horizontally
        let left_gap = bottom_left.x;
        let right_gap = 800.0 - top_right.x;
        assert!((left_gap - right_gap).abs() < 1e-9);
    }

    #[test]
    fn test_arc_points_wraps_sweep() {
        let pts = arc_points(Point::new(0.0, 0.0), 1.0, 270.0, 90.0, 2);
        assert_eq!(pts.len(), 3);
        // 270 -> 0 -> 90 passes through +x
        assert!((pts[1].x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_uses_dimension_layer() {
        let mut d = Drawing::new("dims", DrawingUnits::Millimetres);
        d.dimension_h(Point::new(0.0, 0.0), Point::new(100.0, 0.0), "100", 10.0);
        assert_eq!(d.count_on(Layer::Dimensions), 4);
    }
}
