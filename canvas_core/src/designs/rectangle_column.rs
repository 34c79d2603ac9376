//! # Rectangular Column Section
//!
//! Cross section of a tied RC column. Longitudinal bars run along both
//! `width` faces (`long_bars` per face, corners included); intermediate bars
//! sit on the `depth` faces (`short_bars` per face, corners excluded). One
//! rectangular tie encloses the cage.
//!
//! Checks follow IS 456 clause 26.5.3: longitudinal steel between 0.8 % and
//! 4 % of the gross area, and tie pitch not more than the least lateral
//! dimension, 16 bar diameters, or 300 mm.

use serde::{Deserialize, Serialize};

use super::{bar_area, grade_strength, spread, Design, CONCRETE_GRADES, STEEL_GRADES};
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "rectangle_column";

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("width", "Width", "mm", 300.0, 150.0, 2000.0),
    ParameterSpec::number("depth", "Depth", "mm", 450.0, 150.0, 2000.0),
    ParameterSpec::number("height", "Height", "mm", 3000.0, 500.0, 15000.0),
    ParameterSpec::number("cover", "Clear cover", "mm", 40.0, 20.0, 75.0),
    ParameterSpec::choice("concrete_grade", "Concrete grade", CONCRETE_GRADES, "M25"),
    ParameterSpec::choice("steel_grade", "Steel grade", STEEL_GRADES, "Fe500"),
    ParameterSpec::integer("long_bars", "Bars per width face", "", 4, 2, 12),
    ParameterSpec::number("long_bar_dia", "Width face bar diameter", "mm", 16.0, 10.0, 40.0),
    ParameterSpec::integer("short_bars", "Intermediate bars per depth face", "", 1, 0, 10),
    ParameterSpec::number("short_bar_dia", "Depth face bar diameter", "mm", 16.0, 10.0, 40.0),
    ParameterSpec::number("tie_dia", "Tie diameter", "mm", 8.0, 6.0, 16.0),
    ParameterSpec::number("tie_spacing", "Tie spacing", "mm", 150.0, 50.0, 400.0),
    ParameterSpec::number("axial_load", "Factored axial load", "kN", 1000.0, 0.0, 50000.0),
    ParameterSpec::number("moment_major", "Moment about major axis", "kN·m", 75.0, 0.0, 5000.0),
    ParameterSpec::number("moment_minor", "Moment about minor axis", "kN·m", 50.0, 0.0, 5000.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInput {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub cover: f64,
    pub fck: f64,
    pub fy: f64,
    pub long_bars: usize,
    pub long_bar_dia: f64,
    pub short_bars: usize,
    pub short_bar_dia: f64,
    pub tie_dia: f64,
    pub tie_spacing: f64,
    pub axial_load: f64,
    pub moment_major: f64,
    pub moment_minor: f64,
}

impl ColumnInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(ColumnInput {
            width: p.number("width")?,
            depth: p.number("depth")?,
            height: p.number("height")?,
            cover: p.number("cover")?,
            fck: grade_strength(MODULE, "concrete_grade", &p.choice("concrete_grade")?)?,
            fy: grade_strength(MODULE, "steel_grade", &p.choice("steel_grade")?)?,
            long_bars: p.count("long_bars")?,
            long_bar_dia: p.number("long_bar_dia")?,
            short_bars: p.count("short_bars")?,
            short_bar_dia: p.number("short_bar_dia")?,
            tie_dia: p.number("tie_dia")?,
            tie_spacing: p.number("tie_spacing")?,
            axial_load: p.number("axial_load")?,
            moment_major: p.number("moment_major")?,
            moment_minor: p.number("moment_minor")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        // Bars must fit inside the tie with at least one diameter clear between them
        let core_w = self.width - 2.0 * (self.cover + self.tie_dia);
        let needed_w = (2 * self.long_bars - 1) as f64 * self.long_bar_dia;
        if needed_w > core_w {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "long_bars",
                self.long_bars.to_string(),
                format!("{} bars of {} mm do not fit in a {} mm face", self.long_bars, self.long_bar_dia, self.width),
            ));
        }
        let core_d = self.depth - 2.0 * (self.cover + self.tie_dia);
        let needed_d = (2 * self.short_bars + 3) as f64 * self.short_bar_dia.max(self.long_bar_dia);
        if self.short_bars > 0 && needed_d > core_d {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "short_bars",
                self.short_bars.to_string(),
                format!("{} intermediate bars do not fit in a {} mm face", self.short_bars, self.depth),
            ));
        }
        if self.tie_dia < self.long_bar_dia.max(self.short_bar_dia) / 4.0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "tie_dia",
                self.tie_dia.to_string(),
                "Tie diameter must be at least a quarter of the largest bar",
            ));
        }
        Ok(())
    }

    pub fn gross_area(&self) -> f64 {
        self.width * self.depth
    }

    pub fn steel_area(&self) -> f64 {
        2.0 * self.long_bars as f64 * bar_area(self.long_bar_dia)
            + 2.0 * self.short_bars as f64 * bar_area(self.short_bar_dia)
    }

    pub fn steel_percent(&self) -> f64 {
        100.0 * self.steel_area() / self.gross_area()
    }

    /// Maximum tie pitch (IS 456 26.5.3.2 c)
    pub fn max_tie_spacing(&self) -> f64 {
        let min_dia = self.long_bar_dia.min(if self.short_bars > 0 {
            self.short_bar_dia
        } else {
            self.long_bar_dia
        });
        self.width.min(self.depth).min(16.0 * min_dia).min(300.0)
    }

    /// Pure axial capacity (IS 456 39.3), kN
    pub fn axial_capacity(&self) -> f64 {
        let asc = self.steel_area();
        (0.4 * self.fck * (self.gross_area() - asc) + 0.67 * self.fy * asc) / 1000.0
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let mut drawing = Drawing::new("Column Cross Section", DrawingUnits::Millimetres);
        let text_h = (self.width.max(self.depth) / 20.0).max(10.0);
        let (w, d) = (self.width, self.depth);

        drawing.rect(Layer::Outline, Point::new(0.0, 0.0), Point::new(w, d));

        // Tie runs on the outside of the bars
        let t = self.cover + self.tie_dia / 2.0;
        drawing.rect(Layer::Reinforcement, Point::new(t, t), Point::new(w - t, d - t));

        let edge = self.cover + self.tie_dia + self.long_bar_dia / 2.0;
        let xs = spread(edge, w - edge, self.long_bars);
        for x in &xs {
            drawing
                .circle(Layer::Reinforcement, Point::new(*x, edge), self.long_bar_dia / 2.0)
                .circle(Layer::Reinforcement, Point::new(*x, d - edge), self.long_bar_dia / 2.0);
        }

        if self.short_bars > 0 {
            let side = self.cover + self.tie_dia + self.short_bar_dia / 2.0;
            let ys = spread(edge, d - edge, self.short_bars + 2);
            for y in &ys[1..ys.len() - 1] {
                drawing
                    .circle(Layer::Reinforcement, Point::new(side, *y), self.short_bar_dia / 2.0)
                    .circle(Layer::Reinforcement, Point::new(w - side, *y), self.short_bar_dia / 2.0);
            }
        }

        drawing
            .dimension_h(Point::new(0.0, -2.0 * text_h), Point::new(w, -2.0 * text_h), format!("{:.0}", w), text_h)
            .dimension_v(Point::new(w + 2.0 * text_h, 0.0), Point::new(w + 2.0 * text_h, d), format!("{:.0}", d), text_h)
            .text_aligned(
                Point::new(w / 2.0, d + 1.5 * text_h),
                text_h * 1.2,
                format!("COLUMN {:.0} x {:.0}", w, d),
                TextAlign::Center,
            );

        let mut notes = vec![
            format!("{}-{:.0} dia (width faces)", 2 * self.long_bars, self.long_bar_dia),
            format!("Ties {:.0} dia @ {:.0} c/c", self.tie_dia, self.tie_spacing),
            format!("Cover {:.0}", self.cover),
        ];
        if self.short_bars > 0 {
            notes.insert(1, format!("{}-{:.0} dia (depth faces)", 2 * self.short_bars, self.short_bar_dia));
        }
        for (i, note) in notes.iter().enumerate() {
            drawing.text(Point::new(0.0, -4.0 * text_h - i as f64 * 1.6 * text_h), text_h, note.clone());
        }

        let design = Design::new(drawing)
            .summary("Gross area", self.gross_area(), 0, "mm²")
            .summary("Steel area", self.steel_area(), 0, "mm²")
            .summary("Steel percentage", self.steel_percent(), 2, "%")
            .summary("Axial capacity", self.axial_capacity(), 0, "kN")
            .summary("Slenderness (height / least dimension)", self.height / w.min(d), 1, "")
            .summary("Maximum tie spacing", self.max_tie_spacing(), 0, "mm")
            .check_min("Minimum steel", self.steel_percent(), 0.8, 2)
            .check_max("Maximum steel", self.steel_percent(), 4.0, 2)
            .check_max("Tie spacing", self.tie_spacing, self.max_tie_spacing(), 0)
            .check_min("Axial capacity", self.axial_capacity(), self.axial_load, 0)
            .check_max("Slenderness", self.height / w.min(d), 12.0, 1);

        Ok(design)
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = ColumnInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> ColumnInput {
        let state = ModuleParameterState::new();
        ColumnInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_bar_count_in_drawing() {
        let input = defaults();
        let design = input.design().unwrap();
        let circles = design
            .drawing
            .entities
            .iter()
            .filter(|e| matches!(e, crate::drawing::Entity::Circle { .. }))
            .count();
        assert_eq!(circles, 2 * input.long_bars + 2 * input.short_bars);
    }

    #[test]
    fn test_steel_percentage() {
        let input = defaults();
        // 10 bars of 16 mm = 2010.6 mm² on 135000 mm²
        assert!((input.steel_percent() - 1.489).abs() < 0.01);
        assert!(input.design().unwrap().passes());
    }

    #[test]
    fn test_tie_spacing_limit() {
        let input = defaults();
        assert_eq!(input.max_tie_spacing(), 256.0);
    }

    #[test]
    fn test_too_many_bars_rejected() {
        let mut input = defaults();
        input.long_bars = 8;
        input.long_bar_dia = 25.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_thin_tie_rejected() {
        let mut input = defaults();
        input.long_bar_dia = 32.0;
        input.tie_dia = 6.0;
        let err = input.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }
}
