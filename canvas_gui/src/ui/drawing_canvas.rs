//! Canvas program for module drawings
//!
//! Renders a [`Drawing`] on a white sheet using the same fit-to-surface
//! transform as the SVG exporter, so what is shown is what gets exported.
//! Without a drawing the sheet shows a short hint for the current phase.

use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::{Color, Point, Rectangle, Renderer, Theme};

use canvas_core::drawing::{arc_points, Drawing, Entity, Layer, Point as WorldPoint, TextAlign, Viewport};

use crate::Message;

pub struct DrawingCanvas<'a> {
    drawing: Option<&'a Drawing>,
    margin: f32,
    placeholder: &'static str,
}

impl<'a> DrawingCanvas<'a> {
    pub fn new(drawing: Option<&'a Drawing>, margin: f32, placeholder: &'static str) -> Self {
        Self {
            drawing,
            margin,
            placeholder,
        }
    }
}

fn layer_color(layer: Layer) -> Color {
    let [r, g, b] = layer.rgb();
    Color::from_rgb(r, g, b)
}

fn screen(viewport: &Viewport, p: WorldPoint) -> Point {
    let s = viewport.to_screen(p);
    Point::new(s.x as f32, s.y as f32)
}

fn polyline_path(viewport: &Viewport, points: &[WorldPoint], closed: bool) -> Path {
    Path::new(|builder| {
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            builder.move_to(screen(viewport, *first));
            for p in iter {
                builder.line_to(screen(viewport, *p));
            }
            if closed {
                builder.close();
            }
        }
    })
}

fn draw_entity(frame: &mut Frame, viewport: &Viewport, entity: &Entity) {
    let color = layer_color(entity.layer());
    let stroke = Stroke::default().with_color(color).with_width(1.0);

    match entity {
        Entity::Line { from, to, .. } => {
            let path = Path::line(screen(viewport, *from), screen(viewport, *to));
            frame.stroke(&path, stroke);
        }
        Entity::Polyline { points, closed, .. } => {
            frame.stroke(&polyline_path(viewport, points, *closed), stroke);
        }
        Entity::Circle { center, radius, .. } => {
            let r = viewport.length(*radius).max(0.5) as f32;
            frame.stroke(&Path::circle(screen(viewport, *center), r), stroke);
        }
        Entity::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            ..
        } => {
            let points = arc_points(*center, *radius, *start_deg, *end_deg, 32);
            frame.stroke(&polyline_path(viewport, &points, false), stroke);
        }
        Entity::Text {
            position,
            height,
            content,
            align,
            ..
        } => {
            let align_x = match align {
                TextAlign::Left => iced::alignment::Horizontal::Left,
                TextAlign::Center => iced::alignment::Horizontal::Center,
                TextAlign::Right => iced::alignment::Horizontal::Right,
            };
            frame.fill_text(Text {
                content: content.clone(),
                position: screen(viewport, *position),
                color,
                size: iced::Pixels(viewport.length(*height).max(6.0) as f32),
                align_x: align_x.into(),
                align_y: iced::alignment::Vertical::Bottom.into(),
                ..Text::default()
            });
        }
    }
}

impl canvas::Program<Message> for DrawingCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::WHITE);

        match self.drawing {
            Some(drawing) => {
                let viewport = Viewport::fit(
                    drawing.extents(),
                    f64::from(bounds.width),
                    f64::from(bounds.height),
                    f64::from(self.margin),
                );
                for entity in &drawing.entities {
                    draw_entity(&mut frame, &viewport, entity);
                }
            }
            None => {
                frame.fill_text(Text {
                    content: self.placeholder.to_string(),
                    position: Point::new(bounds.width / 2.0, bounds.height / 2.0),
                    color: Color::from_rgb(0.6, 0.6, 0.6),
                    size: iced::Pixels(13.0),
                    align_x: iced::alignment::Horizontal::Center.into(),
                    align_y: iced::alignment::Vertical::Center.into(),
                    ..Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }
}
