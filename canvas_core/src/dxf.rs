//! # DXF Export
//!
//! Writes a [`Drawing`] as ASCII DXF in the AutoCAD R12 (`AC1009`) dialect,
//! which every CAD package still reads. The file has four parts:
//!
//! - `HEADER` with `$ACADVER`, `$INSUNITS`, `$EXTMIN` and `$EXTMAX`
//! - `TABLES` with a `CONTINUOUS` line type and one `LAYER` per layer used
//! - `ENTITIES` with `LINE`, `CIRCLE`, `ARC`, `TEXT` and
//!   `POLYLINE`/`VERTEX`/`SEQEND`
//! - `EOF`
//!
//! `$INSUNITS` only became part of the header in R2000. R12 readers skip it,
//! and later readers use it to scale the drawing on insert.
//!
//! Arcs run counter-clockwise from group 50 to group 51. An arc whose sweep
//! is a full turn is written as a `CIRCLE`.
//!
//! Group codes are right-aligned to three columns as AutoCAD writes them.
//! Characters outside ASCII are written as `\U+XXXX` escapes.
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::drawing::{Drawing, DrawingUnits, Layer, Point};
//! use canvas_core::dxf::write_dxf;
//! use canvas_core::settings::DxfSettings;
//!
//! let mut drawing = Drawing::new("Lintel L1", DrawingUnits::Millimetres);
//! drawing.line(Layer::Outline, Point::new(0.0, 0.0), Point::new(1200.0, 0.0));
//!
//! let dxf = write_dxf(&drawing, &DxfSettings::default()).unwrap();
//! assert!(dxf.contains("AC1009"));
//! assert!(dxf.ends_with("EOF\n"));
//! ```

use crate::drawing::{arc_sweep, Drawing, Entity, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::settings::DxfSettings;

/// Accumulates group code / value pairs.
struct DxfWriter {
    out: String,
}

impl DxfWriter {
    fn new() -> Self {
        DxfWriter { out: String::new() }
    }

    fn pair(&mut self, code: i32, value: impl std::fmt::Display) -> &mut Self {
        self.out.push_str(&format!("{:>3}\n{}\n", code, value));
        self
    }

    fn number(&mut self, code: i32, value: f64) -> &mut Self {
        self.pair(code, format_number(value))
    }

    fn point(&mut self, base: i32, p: Point) -> &mut Self {
        self.number(base, p.x).number(base + 10, p.y).number(base + 20, 0.0)
    }

    fn section(&mut self, name: &str) -> &mut Self {
        self.pair(0, "SECTION").pair(2, name)
    }

    fn end_section(&mut self) -> &mut Self {
        self.pair(0, "ENDSEC")
    }
}

/// Fixed-point with trailing zeros removed; DXF readers reject exponents.
fn format_number(value: f64) -> String {
    let s = format!("{:.6}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_text(content: &str) -> String {
    content
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .map(|c| {
            if c.is_ascii() {
                c.to_string()
            } else {
                format!("\\U+{:04X}", c as u32)
            }
        })
        .collect()
}

fn check_finite(drawing: &Drawing) -> CanvasResult<()> {
    let extents = drawing.extents();
    let finite = [extents.min.x, extents.min.y, extents.max.x, extents.max.y]
        .iter()
        .all(|v| v.is_finite());
    if finite {
        Ok(())
    } else {
        Err(CanvasError::export_failed("DXF", "drawing has non-finite coordinates"))
    }
}

/// Serialize a drawing to R12 ASCII DXF.
///
/// # Errors
///
/// `ExportFailed` when the drawing is empty or contains non-finite
/// coordinates.
pub fn write_dxf(drawing: &Drawing, settings: &DxfSettings) -> CanvasResult<String> {
    if drawing.is_empty() {
        return Err(CanvasError::export_failed("DXF", "drawing has no entities"));
    }
    check_finite(drawing)?;

    let extents = drawing.extents();
    let layers = drawing.layers();
    let mut w = DxfWriter::new();

    w.section("HEADER")
        .pair(9, "$ACADVER")
        .pair(1, "AC1009")
        .pair(9, "$INSUNITS")
        .pair(70, drawing.units.dxf_code())
        .pair(9, "$EXTMIN")
        .point(10, extents.min)
        .pair(9, "$EXTMAX")
        .point(10, extents.max)
        .end_section();

    w.section("TABLES")
        .pair(0, "TABLE")
        .pair(2, "LTYPE")
        .pair(70, 1)
        .pair(0, "LTYPE")
        .pair(2, "CONTINUOUS")
        .pair(70, 0)
        .pair(3, "Solid line")
        .pair(72, 65)
        .pair(73, 0)
        .number(40, 0.0)
        .pair(0, "ENDTAB")
        .pair(0, "TABLE")
        .pair(2, "LAYER")
        .pair(70, layers.len());
    for layer in &layers {
        w.pair(0, "LAYER")
            .pair(2, layer.name())
            .pair(70, 0)
            .pair(62, layer.aci_color())
            .pair(6, "CONTINUOUS");
    }
    w.pair(0, "ENDTAB").end_section();

    w.section("ENTITIES");
    for entity in &drawing.entities {
        write_entity(&mut w, entity, settings);
    }
    w.end_section().pair(0, "EOF");

    Ok(w.out)
}

fn write_entity(w: &mut DxfWriter, entity: &Entity, settings: &DxfSettings) {
    let layer = entity.layer().name();
    match entity {
        Entity::Line { from, to, .. } => {
            w.pair(0, "LINE").pair(8, layer).point(10, *from).point(11, *to);
        }
        Entity::Circle { center, radius, .. } => {
            w.pair(0, "CIRCLE").pair(8, layer).point(10, *center).number(40, *radius);
        }
        Entity::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            ..
        } => {
            let sweep = arc_sweep(*start_deg, *end_deg);
            if sweep >= 360.0 {
                w.pair(0, "CIRCLE").pair(8, layer).point(10, *center).number(40, *radius);
            } else {
                let start = start_deg.rem_euclid(360.0);
                w.pair(0, "ARC")
                    .pair(8, layer)
                    .point(10, *center)
                    .number(40, *radius)
                    .number(50, start)
                    .number(51, (start + sweep).rem_euclid(360.0));
            }
        }
        Entity::Polyline { points, closed, .. } => {
            w.pair(0, "POLYLINE")
                .pair(8, layer)
                .pair(66, 1)
                .point(10, Point::new(0.0, 0.0))
                .pair(70, if *closed { 1 } else { 0 });
            for p in points {
                w.pair(0, "VERTEX").pair(8, layer).point(10, *p);
            }
            w.pair(0, "SEQEND").pair(8, layer);
        }
        Entity::Text {
            position,
            height,
            content,
            align,
            ..
        } => {
            w.pair(0, "TEXT")
                .pair(8, layer)
                .point(10, *position)
                .number(40, height * settings.text_height_scale)
                .pair(1, escape_text(content));
            let justify = match align {
                TextAlign::Left => 0,
                TextAlign::Center => 1,
                TextAlign::Right => 2,
            };
            if justify != 0 {
                // Justified text is placed by its alignment point
                w.pair(72, justify).point(11, *position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{DrawingUnits, Layer};

    fn sample() -> Drawing {
        let mut d = Drawing::new("Test", DrawingUnits::Millimetres);
        d.rect(Layer::Outline, Point::new(0.0, 0.0), Point::new(230.0, 150.0))
            .circle(Layer::Reinforcement, Point::new(40.0, 40.0), 6.0)
            .text_aligned(Point::new(115.0, 200.0), 25.0, "LINTEL L1", TextAlign::Center);
        d
    }

    #[test]
    fn test_structure() {
        let dxf = write_dxf(&sample(), &DxfSettings::default()).unwrap();
        assert!(dxf.starts_with("  0\nSECTION\n  2\nHEADER\n"));
        assert!(dxf.ends_with("  0\nEOF\n"));
        assert!(dxf.contains("$ACADVER\n  1\nAC1009\n"));
        assert!(dxf.contains("$INSUNITS\n 70\n4\n"));
        assert_eq!(dxf.matches("\nSECTION\n").count(), 3);
    }

    #[test]
    fn test_only_used_layers_declared() {
        let dxf = write_dxf(&sample(), &DxfSettings::default()).unwrap();
        assert!(dxf.contains("LAYER\n  2\nOUTLINE\n"));
        assert!(dxf.contains("LAYER\n  2\nREINFORCEMENT\n"));
        assert!(!dxf.contains("LAYER\n  2\nGROUND\n"));
    }

    #[test]
    fn test_closed_polyline() {
        let dxf = write_dxf(&sample(), &DxfSettings::default()).unwrap();
        assert_eq!(dxf.matches("\nVERTEX\n").count(), 4);
        assert!(dxf.contains("POLYLINE\n  8\nOUTLINE\n 66\n1\n 10\n0\n 20\n0\n 30\n0\n 70\n1\n"));
        assert_eq!(dxf.matches("\nSEQEND\n").count(), 1);
    }

    #[test]
    fn test_text_height_scaled_and_centred() {
        let settings = DxfSettings { text_height_scale: 2.0 };
        let dxf = write_dxf(&sample(), &settings).unwrap();
        assert!(dxf.contains(" 40\n50\n  1\nLINTEL L1\n 72\n1\n"));
    }

    fn arc_drawing(start_deg: f64, end_deg: f64) -> Drawing {
        let mut d = Drawing::new("Arc", DrawingUnits::Metres);
        d.arc(Layer::Centerline, Point::new(10.0, 20.0), 150.0, start_deg, end_deg);
        d
    }

    #[test]
    fn test_arc_angles() {
        let dxf = write_dxf(&arc_drawing(30.0, 120.0), &DxfSettings::default()).unwrap();
        assert!(dxf.contains("ARC\n  8\nCENTERLINE\n 10\n10\n 20\n20\n 30\n0\n 40\n150\n 50\n30\n 51\n120\n"));
        assert!(dxf.contains("$INSUNITS\n 70\n6\n"));
    }

    #[test]
    fn test_arc_crossing_zero_keeps_sweep() {
        let dxf = write_dxf(&arc_drawing(-45.0, 45.0), &DxfSettings::default()).unwrap();
        assert!(dxf.contains(" 50\n315\n 51\n45\n"));

        let dxf = write_dxf(&arc_drawing(300.0, 420.0), &DxfSettings::default()).unwrap();
        assert!(dxf.contains(" 50\n300\n 51\n60\n"));
    }

    #[test]
    fn test_full_turn_arc_written_as_circle() {
        let dxf = write_dxf(&arc_drawing(0.0, 360.0), &DxfSettings::default()).unwrap();
        assert!(!dxf.contains("\nARC\n"));
        assert!(dxf.contains("CIRCLE\n  8\nCENTERLINE\n 10\n10\n 20\n20\n 30\n0\n 40\n150\n"));
    }

    #[test]
    fn test_number_format() {
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(-0.0000001), "0");
        assert_eq!(format_number(1e12), "1000000000000");
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(escape_text("m²"), "m\\U+00B2");
    }

    #[test]
    fn test_empty_drawing_rejected() {
        let empty = Drawing::new("Empty", DrawingUnits::Metres);
        let err = write_dxf(&empty, &DxfSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "EXPORT_FAILED");
    }
}
