//! # RC Lintel
//!
//! Simply supported lintel over a door or window opening, bearing on the
//! masonry at both ends. Draws the wall elevation with the opening, the
//! lintel with main and hanger bars and stirrups, and a cross section.
//!
//! Design (IS 456, limit state):
//!
//! - effective span = min(clear span + d, clear span + bearing)
//! - factored UDL = 1.5 x (wall + floor + live + self weight)
//! - `M = w L² / 8`, `V = w L / 2`
//! - minimum steel `0.85 b d / fy`; span/depth not more than 20
//! - bearing stress on masonry `V / (b x bearing)` not more than 5 N/mm²

use serde::{Deserialize, Serialize};

use super::{bar_area, grade_strength, required_steel, spread, Design, CONCRETE_GRADES, STEEL_GRADES};
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "lintel";

const WALL_MARGIN: f64 = 600.0;
const CONCRETE_DENSITY: f64 = 25.0;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::choice("opening_type", "Opening", &["Door", "Window"], "Door"),
    ParameterSpec::number("span", "Clear span", "mm", 1200.0, 300.0, 6000.0),
    ParameterSpec::number("opening_height", "Opening top above floor", "mm", 2100.0, 600.0, 4000.0),
    ParameterSpec::number("sill_height", "Window sill height", "mm", 900.0, 0.0, 2000.0),
    ParameterSpec::number("width", "Lintel width (wall thickness)", "mm", 230.0, 100.0, 600.0),
    ParameterSpec::number("depth", "Lintel depth", "mm", 150.0, 100.0, 900.0),
    ParameterSpec::number("bearing", "Bearing each side", "mm", 150.0, 100.0, 500.0),
    ParameterSpec::number("wall_load", "Masonry load", "kN/m", 15.0, 0.0, 200.0),
    ParameterSpec::number("floor_load", "Floor load", "kN/m", 10.0, 0.0, 200.0),
    ParameterSpec::number("live_load", "Live load", "kN/m", 3.0, 0.0, 100.0),
    ParameterSpec::choice("concrete_grade", "Concrete grade", CONCRETE_GRADES, "M20"),
    ParameterSpec::choice("steel_grade", "Steel grade", STEEL_GRADES, "Fe415"),
    ParameterSpec::number("cover", "Clear cover", "mm", 25.0, 15.0, 50.0),
    ParameterSpec::integer("main_bars", "Main bars", "", 3, 2, 8),
    ParameterSpec::number("main_bar_dia", "Main bar diameter", "mm", 12.0, 8.0, 32.0),
    ParameterSpec::number("hanger_bar_dia", "Hanger bar diameter", "mm", 8.0, 6.0, 16.0),
    ParameterSpec::number("stirrup_dia", "Stirrup diameter", "mm", 6.0, 6.0, 12.0),
    ParameterSpec::number("stirrup_spacing", "Stirrup spacing", "mm", 150.0, 75.0, 300.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintelInput {
    pub is_window: bool,
    pub span: f64,
    pub opening_height: f64,
    pub sill_height: f64,
    pub width: f64,
    pub depth: f64,
    pub bearing: f64,
    pub wall_load: f64,
    pub floor_load: f64,
    pub live_load: f64,
    pub fck: f64,
    pub fy: f64,
    pub cover: f64,
    pub main_bars: usize,
    pub main_bar_dia: f64,
    pub hanger_bar_dia: f64,
    pub stirrup_dia: f64,
    pub stirrup_spacing: f64,
}

impl LintelInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(LintelInput {
            is_window: p.choice("opening_type")? == "Window",
            span: p.number("span")?,
            opening_height: p.number("opening_height")?,
            sill_height: p.number("sill_height")?,
            width: p.number("width")?,
            depth: p.number("depth")?,
            bearing: p.number("bearing")?,
            wall_load: p.number("wall_load")?,
            floor_load: p.number("floor_load")?,
            live_load: p.number("live_load")?,
            fck: grade_strength(MODULE, "concrete_grade", &p.choice("concrete_grade")?)?,
            fy: grade_strength(MODULE, "steel_grade", &p.choice("steel_grade")?)?,
            cover: p.number("cover")?,
            main_bars: p.count("main_bars")?,
            main_bar_dia: p.number("main_bar_dia")?,
            hanger_bar_dia: p.number("hanger_bar_dia")?,
            stirrup_dia: p.number("stirrup_dia")?,
            stirrup_spacing: p.number("stirrup_spacing")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.is_window && self.sill_height >= self.opening_height - 300.0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "sill_height",
                self.sill_height.to_string(),
                "Window sill must be at least 300 mm below the opening top",
            ));
        }
        if self.effective_depth() <= 0.0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "depth",
                self.depth.to_string(),
                "Depth leaves no room for cover and bars",
            ));
        }
        let clear = self.width - 2.0 * (self.cover + self.stirrup_dia);
        if (2 * self.main_bars - 1) as f64 * self.main_bar_dia > clear {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "main_bars",
                self.main_bars.to_string(),
                format!("{} bars of {} mm do not fit in a {} mm wide lintel", self.main_bars, self.main_bar_dia, self.width),
            ));
        }
        Ok(())
    }

    pub fn effective_depth(&self) -> f64 {
        self.depth - self.cover - self.stirrup_dia - self.main_bar_dia / 2.0
    }

    /// Effective span in m
    pub fn effective_span(&self) -> f64 {
        (self.span + self.effective_depth()).min(self.span + self.bearing) / 1000.0
    }

    pub fn self_weight(&self) -> f64 {
        CONCRETE_DENSITY * self.width * self.depth / 1e6
    }

    /// Factored uniformly distributed load, kN/m
    pub fn factored_load(&self) -> f64 {
        1.5 * (self.wall_load + self.floor_load + self.live_load + self.self_weight())
    }

    pub fn moment(&self) -> f64 {
        self.factored_load() * self.effective_span().powi(2) / 8.0
    }

    pub fn shear(&self) -> f64 {
        self.factored_load() * self.effective_span() / 2.0
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let d = self.effective_depth();
        let ast_required = required_steel(self.moment() * 1e6, self.fck, self.fy, self.width, d).ok_or_else(|| {
            CanvasError::render_failed(
                MODULE,
                format!("{:.0} mm deep lintel cannot carry {:.1} kN·m; increase the depth", self.depth, self.moment()),
            )
        })?;
        let ast_min = 0.85 * self.width * d / self.fy;
        let ast_provided = self.main_bars as f64 * bar_area(self.main_bar_dia);
        let bearing_stress = self.shear() * 1000.0 / (self.width * self.bearing);

        let drawing = self.draw();

        Ok(Design::new(drawing)
            .summary("Effective span", self.effective_span(), 3, "m")
            .summary("Factored load", self.factored_load(), 2, "kN/m")
            .summary("Design moment", self.moment(), 2, "kN·m")
            .summary("Design shear", self.shear(), 2, "kN")
            .summary("Effective depth", d, 1, "mm")
            .summary("Steel required", ast_required.max(ast_min), 1, "mm²")
            .summary("Steel provided", ast_provided, 1, "mm²")
            .summary("Steel percentage", 100.0 * ast_provided / (self.width * d), 3, "%")
            .summary("Bearing stress", bearing_stress, 3, "N/mm²")
            .check_min("Tension steel", ast_provided, ast_required.max(ast_min), 1)
            .check_max("Span / effective depth", self.effective_span() * 1000.0 / d, 20.0, 1)
            .check_max("Bearing stress", bearing_stress, 5.0, 3))
    }

    fn draw(&self) -> Drawing {
        let mut drawing = Drawing::new("Lintel Elevation and Section", DrawingUnits::Millimetres);
        let text_h = 40.0;
        let bottom = self.opening_height;
        let top = bottom + self.depth;
        let lintel_left = -self.bearing;
        let lintel_right = self.span + self.bearing;
        let wall_left = lintel_left - WALL_MARGIN;
        let wall_right = lintel_right + WALL_MARGIN;
        let wall_top = top + 300.0;

        // Wall and opening
        let opening_bottom = if self.is_window { self.sill_height } else { 0.0 };
        drawing
            .rect(Layer::Outline, Point::new(wall_left, 0.0), Point::new(wall_right, wall_top))
            .rect(Layer::Outline, Point::new(0.0, opening_bottom), Point::new(self.span, bottom))
            .rect(Layer::Outline, Point::new(lintel_left, bottom), Point::new(lintel_right, top))
            .line(Layer::Outline, Point::new(0.0, opening_bottom), Point::new(self.span, bottom))
            .line(Layer::Outline, Point::new(self.span, opening_bottom), Point::new(0.0, bottom));

        // Longitudinal bars with end hooks
        let main_y = bottom + self.cover + self.stirrup_dia + self.main_bar_dia / 2.0;
        let hanger_y = top - self.cover - self.stirrup_dia - self.hanger_bar_dia / 2.0;
        let bar_left = lintel_left + self.cover;
        let bar_right = lintel_right - self.cover;
        drawing
            .polyline(
                Layer::Reinforcement,
                vec![
                    Point::new(bar_left, hanger_y),
                    Point::new(bar_left, main_y),
                    Point::new(bar_right, main_y),
                    Point::new(bar_right, hanger_y),
                ],
                false,
            )
            .line(Layer::Reinforcement, Point::new(bar_left, hanger_y), Point::new(bar_right, hanger_y));

        let first = lintel_left + 50.0;
        let last = lintel_right - 50.0;
        let count = ((last - first) / self.stirrup_spacing).floor() as usize + 1;
        for i in 0..count {
            let x = first + i as f64 * self.stirrup_spacing;
            drawing.line(
                Layer::Reinforcement,
                Point::new(x, bottom + self.cover),
                Point::new(x, top - self.cover),
            );
        }

        drawing
            .dimension_h(
                Point::new(0.0, opening_bottom + 150.0),
                Point::new(self.span, opening_bottom + 150.0),
                format!("CLEAR SPAN {:.0}", self.span),
                text_h,
            )
            .dimension_h(
                Point::new(lintel_left, wall_top + 100.0),
                Point::new(lintel_right, wall_top + 100.0),
                format!("LINTEL {:.0}", lintel_right - lintel_left),
                text_h,
            )
            .text_aligned(
                Point::new(self.span / 2.0, -150.0),
                text_h * 1.3,
                format!("{} LINTEL - ELEVATION", if self.is_window { "WINDOW" } else { "DOOR" }),
                TextAlign::Center,
            );

        // Cross section beside the elevation
        let sx = wall_right + 400.0;
        let sy = bottom;
        let (b, dd) = (self.width, self.depth);
        let t = self.cover + self.stirrup_dia / 2.0;
        drawing
            .rect(Layer::Outline, Point::new(sx, sy), Point::new(sx + b, sy + dd))
            .rect(Layer::Reinforcement, Point::new(sx + t, sy + t), Point::new(sx + b - t, sy + dd - t));
        let edge = self.cover + self.stirrup_dia + self.main_bar_dia / 2.0;
        for x in spread(sx + edge, sx + b - edge, self.main_bars) {
            drawing.circle(Layer::Reinforcement, Point::new(x, sy + edge), self.main_bar_dia / 2.0);
        }
        let top_edge = self.cover + self.stirrup_dia + self.hanger_bar_dia / 2.0;
        for x in spread(sx + top_edge, sx + b - top_edge, 2) {
            drawing.circle(Layer::Reinforcement, Point::new(x, sy + dd - top_edge), self.hanger_bar_dia / 2.0);
        }
        drawing
            .dimension_h(Point::new(sx, sy - 80.0), Point::new(sx + b, sy - 80.0), format!("{:.0}", b), text_h)
            .dimension_v(Point::new(sx + b + 80.0, sy), Point::new(sx + b + 80.0, sy + dd), format!("{:.0}", dd), text_h)
            .text(Point::new(sx, sy - 250.0), text_h, "SECTION")
            .text(
                Point::new(sx, sy - 320.0),
                text_h * 0.8,
                format!("{}-{:.0} BOTTOM", self.main_bars, self.main_bar_dia),
            )
            .text(Point::new(sx, sy - 380.0), text_h * 0.8, format!("2-{:.0} TOP", self.hanger_bar_dia))
            .text(
                Point::new(sx, sy - 440.0),
                text_h * 0.8,
                format!("{:.0} STIRRUPS @ {:.0}", self.stirrup_dia, self.stirrup_spacing),
            );

        drawing
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = LintelInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> LintelInput {
        let state = ModuleParameterState::new();
        LintelInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_load_and_moment() {
        let input = defaults();
        // d = 150 - 25 - 6 - 6 = 113; span 1200 + 113 governs over 1350
        assert!((input.effective_span() - 1.313).abs() < 1e-9);
        let w = 1.5 * (15.0 + 10.0 + 3.0 + 25.0 * 0.23 * 0.15);
        assert!((input.factored_load() - w).abs() < 1e-9);
        assert!((input.moment() - w * 1.313 * 1.313 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_lintel_passes() {
        let design = defaults().design().unwrap();
        assert!(design.passes(), "{:?}", design.checks);
    }

    #[test]
    fn test_overloaded_lintel_cannot_be_drawn() {
        let mut input = defaults();
        input.span = 6000.0;
        input.wall_load = 200.0;
        let err = input.design().unwrap_err();
        assert_eq!(err.error_code(), "RENDER_FAILED");
    }

    #[test]
    fn test_window_sill_validation() {
        let mut input = defaults();
        input.is_window = true;
        assert!(input.validate().is_ok());
        input.sill_height = 1900.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_stirrups_at_spacing() {
        let input = defaults();
        let design = input.design().unwrap();
        // 1500 - 100 = 1400 / 150 -> 10 stirrups, plus the two bar lines
        let bars = design.drawing.entities.iter().filter(|e| {
            matches!(e, crate::drawing::Entity::Line { layer: Layer::Reinforcement, .. })
        });
        assert_eq!(bars.count(), 10 + 1);
    }
}
