//! # T-Beam / L-Beam
//!
//! Flanged beam monolithic with the slab. A T-beam has the flange on both
//! sides of the web; an L-beam (edge beam) has it on one side only, chosen
//! by `flange_position`.
//!
//! Overall depth is taken as `d + cover + 10`. Forces use the factored load
//! `1.5 (DL + LL)`:
//!
//! | Support          | Moment     | Shear    |
//! |------------------|------------|----------|
//! | Simply supported | `w L² / 8`  | `w L / 2` |
//! | Continuous       | `w L² / 10` | `0.6 w L` |
//!
//! Flexure follows IS 456 Annex G for flanged sections; shear uses the
//! Table 19 design strength in its closed form.

use serde::{Deserialize, Serialize};

use super::{bar_area, grade_strength, spread, xu_max_ratio, Design, CONCRETE_GRADES, STEEL_GRADES};
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "tbeam_lbeam";

pub const BEAM_TYPES: &[&str] = &["T-Beam", "L-Beam"];
pub const FLANGE_POSITIONS: &[&str] = &["Left", "Right"];
pub const SUPPORT_TYPES: &[&str] = &["Simply Supported", "Continuous"];

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::choice("beam_type", "Beam type", BEAM_TYPES, "T-Beam"),
    ParameterSpec::choice("flange_position", "L-beam flange side", FLANGE_POSITIONS, "Right"),
    ParameterSpec::number("flange_width", "Effective flange width", "mm", 1500.0, 300.0, 4000.0),
    ParameterSpec::number("flange_thickness", "Flange thickness", "mm", 100.0, 50.0, 300.0),
    ParameterSpec::number("web_width", "Web width", "mm", 230.0, 100.0, 600.0),
    ParameterSpec::number("effective_depth", "Effective depth", "mm", 400.0, 200.0, 1500.0),
    ParameterSpec::number("cover", "Clear cover", "mm", 25.0, 15.0, 50.0),
    ParameterSpec::number("span", "Effective span", "m", 5.0, 1.0, 15.0),
    ParameterSpec::choice("support", "Support type", SUPPORT_TYPES, "Simply Supported"),
    ParameterSpec::number("dead_load", "Dead load", "kN/m", 10.0, 1.0, 200.0),
    ParameterSpec::number("live_load", "Live load", "kN/m", 15.0, 1.0, 200.0),
    ParameterSpec::integer("num_bars", "Tension bars", "", 5, 2, 10),
    ParameterSpec::number("main_bar_dia", "Tension bar diameter", "mm", 16.0, 10.0, 32.0),
    ParameterSpec::number("stirrup_dia", "Stirrup diameter", "mm", 8.0, 6.0, 12.0),
    ParameterSpec::number("stirrup_spacing", "Stirrup spacing", "mm", 150.0, 50.0, 300.0),
    ParameterSpec::choice("concrete_grade", "Concrete grade", CONCRETE_GRADES, "M20"),
    ParameterSpec::choice("steel_grade", "Steel grade", STEEL_GRADES, "Fe415"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamShape {
    T,
    /// Flange on the left of the web
    LLeft,
    /// Flange on the right of the web
    LRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlangedBeamInput {
    pub shape: BeamShape,
    pub flange_width: f64,
    pub flange_thickness: f64,
    pub web_width: f64,
    pub effective_depth: f64,
    pub cover: f64,
    pub span: f64,
    pub continuous: bool,
    pub dead_load: f64,
    pub live_load: f64,
    pub num_bars: usize,
    pub main_bar_dia: f64,
    pub stirrup_dia: f64,
    pub stirrup_spacing: f64,
    pub fck: f64,
    pub fy: f64,
}

impl FlangedBeamInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        let shape = match (p.choice("beam_type")?.as_str(), p.choice("flange_position")?.as_str()) {
            ("T-Beam", _) => BeamShape::T,
            (_, "Left") => BeamShape::LLeft,
            _ => BeamShape::LRight,
        };
        Ok(FlangedBeamInput {
            shape,
            flange_width: p.number("flange_width")?,
            flange_thickness: p.number("flange_thickness")?,
            web_width: p.number("web_width")?,
            effective_depth: p.number("effective_depth")?,
            cover: p.number("cover")?,
            span: p.number("span")?,
            continuous: p.choice("support")? == "Continuous",
            dead_load: p.number("dead_load")?,
            live_load: p.number("live_load")?,
            num_bars: p.count("num_bars")?,
            main_bar_dia: p.number("main_bar_dia")?,
            stirrup_dia: p.number("stirrup_dia")?,
            stirrup_spacing: p.number("stirrup_spacing")?,
            fck: grade_strength(MODULE, "concrete_grade", &p.choice("concrete_grade")?)?,
            fy: grade_strength(MODULE, "steel_grade", &p.choice("steel_grade")?)?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.flange_width <= self.web_width {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "flange_width",
                self.flange_width.to_string(),
                "Flange must be wider than the web",
            ));
        }
        if self.flange_thickness >= self.total_depth() {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "flange_thickness",
                self.flange_thickness.to_string(),
                "Flange must be thinner than the overall depth",
            ));
        }
        let clear = self.web_width - 2.0 * (self.cover + self.stirrup_dia);
        if (2 * self.num_bars - 1) as f64 * self.main_bar_dia > clear {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "num_bars",
                self.num_bars.to_string(),
                "Tension bars do not fit in one layer across the web",
            ));
        }
        Ok(())
    }

    pub fn total_depth(&self) -> f64 {
        self.effective_depth + self.cover + 10.0
    }

    pub fn factored_load(&self) -> f64 {
        1.5 * (self.dead_load + self.live_load)
    }

    /// Design moment, kN·m
    pub fn moment(&self) -> f64 {
        let w = self.factored_load();
        if self.continuous {
            w * self.span * self.span / 10.0
        } else {
            w * self.span * self.span / 8.0
        }
    }

    /// Design shear, kN
    pub fn shear(&self) -> f64 {
        let w = self.factored_load();
        if self.continuous {
            0.6 * w * self.span
        } else {
            w * self.span / 2.0
        }
    }

    pub fn steel_area(&self) -> f64 {
        self.num_bars as f64 * bar_area(self.main_bar_dia)
    }

    pub fn xu_lim(&self) -> f64 {
        xu_max_ratio(self.fy) * self.effective_depth
    }

    /// Depth of flange counted in compression (IS 456 G-2.2)
    fn flange_depth_in_compression(&self, xu: f64) -> f64 {
        if self.flange_thickness / self.effective_depth <= 0.2 {
            self.flange_thickness
        } else {
            (0.15 * xu + 0.65 * self.flange_thickness).min(self.flange_thickness)
        }
    }

    /// Limiting moment of resistance, kN·m
    pub fn mu_lim(&self) -> f64 {
        let (d, bw, bf) = (self.effective_depth, self.web_width, self.flange_width);
        let xu = self.xu_lim();
        let yf = self.flange_depth_in_compression(xu);
        let web = 0.36 * self.fck * bw * xu * (d - 0.42 * xu);
        let flange = 0.45 * self.fck * (bf - bw) * yf * (d - yf / 2.0);
        (web + flange) / 1e6
    }

    /// Neutral axis depth for the steel provided, mm
    pub fn neutral_axis(&self) -> f64 {
        let tension = 0.87 * self.fy * self.steel_area();
        let in_flange = tension / (0.36 * self.fck * self.flange_width);
        if in_flange <= self.flange_thickness {
            return in_flange;
        }
        let yf = self.flange_depth_in_compression(self.xu_lim());
        let flange_force = 0.45 * self.fck * (self.flange_width - self.web_width) * yf;
        ((tension - flange_force) / (0.36 * self.fck * self.web_width)).max(self.flange_thickness)
    }

    /// Moment of resistance for the steel provided, kN·m
    pub fn moment_capacity(&self) -> f64 {
        let d = self.effective_depth;
        let tension = 0.87 * self.fy * self.steel_area();
        let xu = self.neutral_axis().min(self.xu_lim());
        if xu <= self.flange_thickness {
            return tension * (d - 0.42 * xu) / 1e6;
        }
        let yf = self.flange_depth_in_compression(xu);
        let web = 0.36 * self.fck * self.web_width * xu * (d - 0.42 * xu);
        let flange = 0.45 * self.fck * (self.flange_width - self.web_width) * yf * (d - yf / 2.0);
        (web + flange) / 1e6
    }

    /// Nominal shear stress, N/mm²
    pub fn shear_stress(&self) -> f64 {
        self.shear() * 1000.0 / (self.web_width * self.effective_depth)
    }

    /// Design shear strength of concrete for the tension steel provided, N/mm²
    pub fn concrete_shear_strength(&self) -> f64 {
        let pt = (100.0 * self.steel_area() / (self.web_width * self.effective_depth)).clamp(0.15, 3.0);
        let beta = (0.8 * self.fck / (6.89 * pt)).max(1.0);
        0.85 * (0.8 * self.fck).sqrt() * ((1.0 + 5.0 * beta).sqrt() - 1.0) / (6.0 * beta)
    }

    pub fn max_shear_stress(&self) -> f64 {
        match self.fck as u32 {
            0..=20 => 2.8,
            21..=25 => 3.1,
            26..=30 => 3.5,
            31..=35 => 3.7,
            _ => 4.0,
        }
    }

    /// Largest stirrup spacing that satisfies strength, minimum shear steel
    /// and detailing limits, mm
    pub fn max_stirrup_spacing(&self) -> f64 {
        let d = self.effective_depth;
        let asv = 2.0 * bar_area(self.stirrup_dia);
        let minimum = 0.87 * self.fy * asv / (0.4 * self.web_width);
        let vus = self.shear() * 1000.0 - self.concrete_shear_strength() * self.web_width * d;
        let strength = if vus > 0.0 { 0.87 * self.fy * asv * d / vus } else { f64::INFINITY };
        (0.75 * d).min(300.0).min(minimum).min(strength)
    }

    /// Code limit on effective flange width, mm
    pub fn flange_width_limit(&self) -> f64 {
        let l0 = if self.continuous { 0.7 * self.span } else { self.span } * 1000.0;
        match self.shape {
            BeamShape::T => l0 / 6.0 + self.web_width + 6.0 * self.flange_thickness,
            BeamShape::LLeft | BeamShape::LRight => l0 / 12.0 + self.web_width + 3.0 * self.flange_thickness,
        }
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let ast_min = 0.85 * self.web_width * self.effective_depth / self.fy;
        let self_weight = 25.0
            * (self.flange_width * self.flange_thickness
                + (self.total_depth() - self.flange_thickness) * self.web_width)
            / 1e6;

        Ok(Design::new(self.draw())
            .summary("Overall depth", self.total_depth(), 0, "mm")
            .summary("Self weight", self_weight, 2, "kN/m")
            .summary("Factored load", self.factored_load(), 2, "kN/m")
            .summary("Design moment", self.moment(), 2, "kN·m")
            .summary("Design shear", self.shear(), 2, "kN")
            .summary("Limiting neutral axis depth", self.xu_lim(), 1, "mm")
            .summary("Neutral axis depth", self.neutral_axis(), 1, "mm")
            .summary("Steel provided", self.steel_area(), 1, "mm²")
            .summary("Nominal shear stress", self.shear_stress(), 3, "N/mm²")
            .summary("Concrete shear strength", self.concrete_shear_strength(), 3, "N/mm²")
            .check_max("Design moment vs limiting moment", self.moment(), self.mu_lim(), 2)
            .check_min("Moment capacity", self.moment_capacity(), self.moment(), 2)
            .check_min("Minimum tension steel", self.steel_area(), ast_min, 1)
            .check_max("Shear stress", self.shear_stress(), self.max_shear_stress(), 3)
            .check_max("Stirrup spacing", self.stirrup_spacing, self.max_stirrup_spacing(), 0)
            .check_max("Effective flange width", self.flange_width, self.flange_width_limit(), 0))
    }

    /// Left edge of the web in section coordinates
    fn web_left(&self) -> f64 {
        match self.shape {
            BeamShape::T => (self.flange_width - self.web_width) / 2.0,
            BeamShape::LLeft => self.flange_width - self.web_width,
            BeamShape::LRight => 0.0,
        }
    }

    fn draw(&self) -> Drawing {
        let title = match self.shape {
            BeamShape::T => "T-Beam",
            BeamShape::LLeft | BeamShape::LRight => "L-Beam",
        };
        let mut drawing = Drawing::new(title, DrawingUnits::Millimetres);
        let text_h = 30.0;
        let (bf, tf, bw, depth) = (self.flange_width, self.flange_thickness, self.web_width, self.total_depth());
        let (wl, wr) = (self.web_left(), self.web_left() + bw);
        let soffit = depth - tf;

        // Section outline, traced anticlockwise from the web bottom left
        let mut outline = vec![Point::new(wl, 0.0), Point::new(wr, 0.0)];
        if wr < bf {
            outline.extend([Point::new(wr, soffit), Point::new(bf, soffit)]);
        }
        outline.extend([Point::new(bf, depth), Point::new(0.0, depth)]);
        if wl > 0.0 {
            outline.extend([Point::new(0.0, soffit), Point::new(wl, soffit)]);
        }
        drawing.polyline(Layer::Outline, outline, true);

        let t = self.cover + self.stirrup_dia / 2.0;
        drawing.rect(Layer::Reinforcement, Point::new(wl + t, t), Point::new(wr - t, depth - t));
        let edge = self.cover + self.stirrup_dia + self.main_bar_dia / 2.0;
        for x in spread(wl + edge, wr - edge, self.num_bars) {
            drawing.circle(Layer::Reinforcement, Point::new(x, edge), self.main_bar_dia / 2.0);
        }

        drawing
            .dimension_h(Point::new(0.0, depth + 80.0), Point::new(bf, depth + 80.0), format!("{:.0}", bf), text_h)
            .dimension_h(Point::new(wl, -80.0), Point::new(wr, -80.0), format!("{:.0}", bw), text_h)
            .dimension_v(Point::new(-80.0, 0.0), Point::new(-80.0, depth), format!("{:.0}", depth), text_h)
            .dimension_v(Point::new(bf + 60.0, soffit), Point::new(bf + 60.0, depth), format!("{:.0}", tf), text_h);

        // Elevation to the right of the section
        let x0 = bf + 600.0;
        let length = self.span * 1000.0;
        drawing
            .rect(Layer::Outline, Point::new(x0, 0.0), Point::new(x0 + length, depth))
            .line(Layer::Outline, Point::new(x0, soffit), Point::new(x0 + length, soffit))
            .rect(Layer::Outline, Point::new(x0 - bw / 2.0, -300.0), Point::new(x0 + bw / 2.0, 0.0))
            .rect(
                Layer::Outline,
                Point::new(x0 + length - bw / 2.0, -300.0),
                Point::new(x0 + length + bw / 2.0, 0.0),
            )
            .line(Layer::Reinforcement, Point::new(x0 + self.cover, edge), Point::new(x0 + length - self.cover, edge));
        let stirrups = ((length - 2.0 * self.cover) / self.stirrup_spacing).floor() as usize + 1;
        for x in spread(x0 + self.cover, x0 + self.cover + (stirrups - 1) as f64 * self.stirrup_spacing, stirrups) {
            drawing.line(Layer::Reinforcement, Point::new(x, t), Point::new(x, depth - t));
        }
        drawing.dimension_h(
            Point::new(x0, -400.0),
            Point::new(x0 + length, -400.0),
            format!("{:.2} m", self.span),
            text_h,
        );

        let support = if self.continuous { "CONTINUOUS" } else { "SIMPLY SUPPORTED" };
        let notes = [
            format!("{}-{:.0} TENSION BARS", self.num_bars, self.main_bar_dia),
            format!("{:.0} STIRRUPS @ {:.0} c/c", self.stirrup_dia, self.stirrup_spacing),
            format!("M{:.0} / Fe{:.0}, COVER {:.0}", self.fck, self.fy, self.cover),
            format!("SPAN {:.2} m {}", self.span, support),
        ];
        for (i, note) in notes.iter().enumerate() {
            drawing.text(Point::new(x0, -600.0 - i as f64 * 1.6 * text_h), text_h, note.clone());
        }
        drawing
            .text_aligned(
                Point::new(bf / 2.0, depth + 220.0),
                text_h * 1.5,
                format!("{} - SECTION", title.to_uppercase()),
                TextAlign::Center,
            )
            .text_aligned(
                Point::new(x0 + length / 2.0, depth + 220.0),
                text_h * 1.5,
                "ELEVATION",
                TextAlign::Center,
            );

        drawing
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = FlangedBeamInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Entity;
    use crate::params::{ModuleParameterState, ParamValue};

    fn with(overrides: &[(&str, ParamValue)]) -> FlangedBeamInput {
        let mut state = ModuleParameterState::new();
        for (name, value) in overrides {
            state.insert(name.to_string(), value.clone());
        }
        FlangedBeamInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_simply_supported_forces() {
        let input = with(&[]);
        assert_eq!(input.total_depth(), 435.0);
        assert!((input.factored_load() - 37.5).abs() < 1e-9);
        assert!((input.moment() - 117.1875).abs() < 1e-9);
        assert!((input.shear() - 93.75).abs() < 1e-9);
    }

    #[test]
    fn test_continuous_forces() {
        let input = with(&[("support", ParamValue::Text("Continuous".into()))]);
        assert!((input.moment() - 93.75).abs() < 1e-9);
        assert!((input.shear() - 112.5).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_axis_in_flange_for_defaults() {
        let input = with(&[]);
        let xu = input.neutral_axis();
        assert!(xu < input.flange_thickness, "{xu}");
        assert!((input.moment_capacity() - 140.1).abs() < 0.5);
    }

    #[test]
    fn test_defaults_pass() {
        let design = with(&[]).design().unwrap();
        assert!(design.passes(), "{:?}", design.checks);
    }

    #[test]
    fn test_concrete_shear_strength() {
        // pt about 1.09 % in M20
        let tc = with(&[]).concrete_shear_strength();
        assert!((tc - 0.643).abs() < 0.01, "{tc}");
    }

    #[test]
    fn test_l_beam_flange_side() {
        let left = with(&[
            ("beam_type", ParamValue::Text("L-Beam".into())),
            ("flange_position", ParamValue::Text("Left".into())),
        ]);
        assert_eq!(left.shape, BeamShape::LLeft);
        assert_eq!(left.web_left(), 1270.0);

        let right = with(&[("beam_type", ParamValue::Text("L-Beam".into()))]);
        assert_eq!(right.web_left(), 0.0);
        assert!(right.flange_width_limit() < 1500.0);
    }

    #[test]
    fn test_outline_vertex_count() {
        let count = |input: &FlangedBeamInput| match &input.draw().entities[0] {
            Entity::Polyline { points, .. } => points.len(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(count(&with(&[])), 8);
        assert_eq!(count(&with(&[("beam_type", ParamValue::Text("L-Beam".into()))])), 6);
    }

    #[test]
    fn test_bars_must_fit_web() {
        let input = with(&[("num_bars", ParamValue::Number(8.0))]);
        let err = input.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }
}
