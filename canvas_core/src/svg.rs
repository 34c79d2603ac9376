//! # SVG Export
//!
//! Standalone SVG rendering of a [`Drawing`], fitted into a fixed surface
//! the same way the GUI canvas fits it. Used for the drawing page of PDF
//! reports and by `lispcanvas render --format svg`.
//!
//! Entities are grouped per layer (`<g id="OUTLINE">` ...) so the layer
//! structure survives a round trip through vector editors.

use std::fmt::Write;

use crate::drawing::{arc_points, Drawing, Entity, Layer, Point, TextAlign, Viewport};

const STROKE_WIDTH: f64 = 1.0;

fn color(layer: Layer) -> String {
    let [r, g, b] = layer.rgb();
    format!(
        "#{:02x}{:02x}{:02x}",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn points_attr(viewport: &Viewport, points: &[Point]) -> String {
    points
        .iter()
        .map(|p| {
            let s = viewport.to_screen(*p);
            format!("{:.2},{:.2}", s.x, s.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render `drawing` into a `width` x `height` SVG with `margin` pixels of
/// border, white background.
pub fn render_svg(drawing: &Drawing, width: f64, height: f64, margin: f64) -> String {
    let viewport = Viewport::fit(drawing.extents(), width, height, margin);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    let _ = writeln!(out, "<title>{}</title>", escape_xml(&drawing.title));
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);

    for layer in drawing.layers() {
        let stroke = color(layer);
        let _ = writeln!(
            out,
            r#"<g id="{}" stroke="{}" stroke-width="{}" fill="none">"#,
            layer.name(),
            stroke,
            STROKE_WIDTH
        );
        for entity in drawing.entities.iter().filter(|e| e.layer() == layer) {
            write_entity(&mut out, &viewport, entity, &stroke);
        }
        let _ = writeln!(out, "</g>");
    }

    out.push_str("</svg>\n");
    out
}

fn write_entity(out: &mut String, viewport: &Viewport, entity: &Entity, stroke: &str) {
    match entity {
        Entity::Line { from, to, .. } => {
            let (a, b) = (viewport.to_screen(*from), viewport.to_screen(*to));
            let _ = writeln!(
                out,
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}"/>"#,
                a.x, a.y, b.x, b.y
            );
        }
        Entity::Polyline { points, closed, .. } => {
            let tag = if *closed { "polygon" } else { "polyline" };
            let _ = writeln!(out, r#"<{} points="{}"/>"#, tag, points_attr(viewport, points));
        }
        Entity::Circle { center, radius, .. } => {
            let c = viewport.to_screen(*center);
            let _ = writeln!(
                out,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}"/>"#,
                c.x,
                c.y,
                viewport.length(*radius).max(0.5)
            );
        }
        Entity::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            ..
        } => {
            let points = arc_points(*center, *radius, *start_deg, *end_deg, 32);
            let _ = writeln!(out, r#"<polyline points="{}"/>"#, points_attr(viewport, &points));
        }
        Entity::Text {
            position,
            height,
            content,
            align,
            ..
        } => {
            let p = viewport.to_screen(*position);
            let anchor = match align {
                TextAlign::Left => "start",
                TextAlign::Center => "middle",
                TextAlign::Right => "end",
            };
            let _ = writeln!(
                out,
                r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{:.2}" text-anchor="{}" fill="{}" stroke="none">{}</text>"#,
                p.x,
                p.y,
                viewport.length(*height).max(1.0),
                anchor,
                stroke,
                escape_xml(content)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DrawingUnits;

    #[test]
    fn test_layers_become_groups() {
        let mut d = Drawing::new("Column <C1>", DrawingUnits::Millimetres);
        d.rect(Layer::Outline, Point::new(0.0, 0.0), Point::new(300.0, 450.0))
            .circle(Layer::Reinforcement, Point::new(50.0, 50.0), 8.0)
            .text(Point::new(0.0, -40.0), 20.0, "300 x 450 & ties");

        let svg = render_svg(&d, 800.0, 600.0, 20.0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"<g id="OUTLINE""#));
        assert!(svg.contains(r#"<g id="REINFORCEMENT""#));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("&lt;C1&gt;"));
        assert!(svg.contains("300 x 450 &amp; ties"));
    }

    #[test]
    fn test_arc_sampled_as_polyline() {
        let mut d = Drawing::new("Curve", DrawingUnits::Metres);
        d.arc(Layer::Centerline, Point::new(0.0, 150.0), 150.0, -90.0, -45.0);
        let svg = render_svg(&d, 800.0, 600.0, 20.0);
        let line = svg.lines().find(|l| l.starts_with("<polyline")).unwrap();
        assert_eq!(line.matches(',').count(), 33);
    }

    #[test]
    fn test_colors() {
        assert_eq!(color(Layer::Grid), "#bfbfbf");
    }

    #[test]
    fn test_empty_drawing_is_valid_svg() {
        let svg = render_svg(&Drawing::new("Empty", DrawingUnits::Metres), 400.0, 300.0, 10.0);
        assert!(svg.contains(r#"width="400""#));
        assert!(!svg.contains("<g "));
    }
}
