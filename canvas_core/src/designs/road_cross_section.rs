//! # Road Profile and Earthwork
//!
//! Formation and existing ground levels between two chainages, with an
//! optional symmetric parabolic vertical curve at a vertical point of
//! intersection (VPI). Existing ground is either entered as two end levels or
//! derived from a uniform slope starting `min_cover` below the formation.
//! Earthwork is estimated from trapezoidal sections of the formation width
//! (carriageway plus each shoulder) with separate left and right side slopes,
//! integrated by the average end area method.
//!
//! Vertical curve relations (grades as percentages):
//!
//! ```text
//! y(x) = y_bvc + g1 x / 100 + (g2 - g1) x² / (200 L)
//! A    = |g2 - g1|            K = L / A
//! crest L_min = A S² / 440    sag L_min = A S² / (100 (1.5 + 0.035 S))
//! ```

use serde::{Deserialize, Serialize};

use super::Design;
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "road_cross_section";

const SEGMENTS: usize = 100;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("chainage_start", "Start chainage", "m", 0.0, 0.0, 100000.0),
    ParameterSpec::number("chainage_end", "End chainage", "m", 500.0, 10.0, 100000.0),
    ParameterSpec::flag("manual_egl", "Enter existing ground levels", true),
    ParameterSpec::number("egl_start", "Existing ground at start", "m", 100.0, 0.0, 9000.0),
    ParameterSpec::number("egl_end", "Existing ground at end", "m", 105.0, 0.0, 9000.0),
    ParameterSpec::number("egl_slope", "Existing ground slope", "%", 1.0, -20.0, 20.0),
    ParameterSpec::number("min_cover", "Cover below formation at start", "m", 0.3, 0.0, 5.0),
    ParameterSpec::number("formation_start", "Formation at start", "m", 100.5, 0.0, 9000.0),
    ParameterSpec::number("formation_end", "Formation at end", "m", 105.5, 0.0, 9000.0),
    ParameterSpec::flag("vertical_curve", "Vertical curve", false),
    ParameterSpec::number("vpi_chainage", "VPI chainage", "m", 250.0, 0.0, 100000.0),
    ParameterSpec::number("vpi_level", "VPI level", "m", 104.0, 0.0, 9000.0),
    ParameterSpec::number("curve_length", "Vertical curve length", "m", 100.0, 10.0, 2000.0),
    ParameterSpec::number("carriageway_width", "Carriageway width", "m", 7.0, 3.0, 30.0),
    ParameterSpec::number("left_shoulder", "Left shoulder width", "m", 1.5, 0.0, 5.0),
    ParameterSpec::number("right_shoulder", "Right shoulder width", "m", 1.5, 0.0, 5.0),
    ParameterSpec::number("left_slope", "Left side slope (H:1V)", "", 2.0, 0.5, 6.0),
    ParameterSpec::number("right_slope", "Right side slope (H:1V)", "", 2.0, 0.5, 6.0),
    ParameterSpec::number("max_cut", "Maximum cut depth", "m", 3.0, 0.0, 50.0),
    ParameterSpec::number("design_speed", "Design speed", "km/h", 60.0, 20.0, 120.0),
    ParameterSpec::number("vertical_scale", "Vertical exaggeration", "", 10.0, 1.0, 50.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub chainage_start: f64,
    pub chainage_end: f64,
    pub manual_egl: bool,
    pub egl_start: f64,
    pub egl_end: f64,
    /// Percent, used when `manual_egl` is off
    pub egl_slope: f64,
    pub min_cover: f64,
    pub formation_start: f64,
    pub formation_end: f64,
    pub vertical_curve: bool,
    pub vpi_chainage: f64,
    pub vpi_level: f64,
    pub curve_length: f64,
    pub carriageway_width: f64,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    pub left_slope: f64,
    pub right_slope: f64,
    pub max_cut: f64,
    pub design_speed: f64,
    pub vertical_scale: f64,
}

impl ProfileInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(ProfileInput {
            chainage_start: p.number("chainage_start")?,
            chainage_end: p.number("chainage_end")?,
            manual_egl: p.flag("manual_egl")?,
            egl_start: p.number("egl_start")?,
            egl_end: p.number("egl_end")?,
            egl_slope: p.number("egl_slope")?,
            min_cover: p.number("min_cover")?,
            formation_start: p.number("formation_start")?,
            formation_end: p.number("formation_end")?,
            vertical_curve: p.flag("vertical_curve")?,
            vpi_chainage: p.number("vpi_chainage")?,
            vpi_level: p.number("vpi_level")?,
            curve_length: p.number("curve_length")?,
            carriageway_width: p.number("carriageway_width")?,
            left_shoulder: p.number("left_shoulder")?,
            right_shoulder: p.number("right_shoulder")?,
            left_slope: p.number("left_slope")?,
            right_slope: p.number("right_slope")?,
            max_cut: p.number("max_cut")?,
            design_speed: p.number("design_speed")?,
            vertical_scale: p.number("vertical_scale")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.chainage_end <= self.chainage_start {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "chainage_end",
                self.chainage_end.to_string(),
                "End chainage must be greater than start chainage",
            ));
        }
        if self.vertical_curve {
            let half = self.curve_length / 2.0;
            if self.vpi_chainage - half < self.chainage_start || self.vpi_chainage + half > self.chainage_end {
                return Err(CanvasError::invalid_parameter(
                    MODULE,
                    "vpi_chainage",
                    self.vpi_chainage.to_string(),
                    "Vertical curve must lie within the start and end chainages",
                ));
            }
        }
        Ok(())
    }

    pub fn length(&self) -> f64 {
        self.chainage_end - self.chainage_start
    }

    /// Incoming and outgoing grades in percent
    pub fn grades(&self) -> (f64, f64) {
        if self.vertical_curve {
            (
                100.0 * (self.vpi_level - self.formation_start) / (self.vpi_chainage - self.chainage_start),
                100.0 * (self.formation_end - self.vpi_level) / (self.chainage_end - self.vpi_chainage),
            )
        } else {
            let g = 100.0 * (self.formation_end - self.formation_start) / self.length();
            (g, g)
        }
    }

    /// Algebraic difference of grades, percent
    pub fn grade_difference(&self) -> f64 {
        let (g1, g2) = self.grades();
        (g2 - g1).abs()
    }

    pub fn is_crest(&self) -> bool {
        let (g1, g2) = self.grades();
        g2 < g1
    }

    pub fn existing_level(&self, chainage: f64) -> f64 {
        let from_start = chainage - self.chainage_start;
        if self.manual_egl {
            self.egl_start + from_start / self.length() * (self.egl_end - self.egl_start)
        } else {
            self.formation_level(self.chainage_start) - self.min_cover + self.egl_slope / 100.0 * from_start
        }
    }

    pub fn formation_level(&self, chainage: f64) -> f64 {
        if !self.vertical_curve {
            let t = (chainage - self.chainage_start) / self.length();
            return self.formation_start + t * (self.formation_end - self.formation_start);
        }
        let (g1, g2) = self.grades();
        let bvc = self.vpi_chainage - self.curve_length / 2.0;
        let evc = self.vpi_chainage + self.curve_length / 2.0;
        if chainage <= bvc {
            self.formation_start + g1 / 100.0 * (chainage - self.chainage_start)
        } else if chainage >= evc {
            self.vpi_level + g2 / 100.0 * (chainage - self.vpi_chainage)
        } else {
            let x = chainage - bvc;
            let y_bvc = self.vpi_level - g1 / 100.0 * self.curve_length / 2.0;
            y_bvc + g1 / 100.0 * x + (g2 - g1) * x * x / (200.0 * self.curve_length)
        }
    }

    pub fn stopping_sight_distance(&self) -> f64 {
        let v = self.design_speed;
        v / 3.6 * 2.5 + v * v / (254.0 * 0.35)
    }

    /// Minimum vertical curve length for stopping sight distance
    pub fn minimum_curve_length(&self) -> f64 {
        let a = self.grade_difference();
        let s = self.stopping_sight_distance();
        if self.is_crest() {
            a * s * s / 440.0
        } else {
            a * s * s / (100.0 * (1.5 + 0.035 * s))
        }
    }

    pub fn formation_width(&self) -> f64 {
        self.carriageway_width + self.left_shoulder + self.right_shoulder
    }

    /// Cross-section area for a fill (positive) or cut (negative) depth
    fn section_area(&self, depth: f64) -> f64 {
        let h = depth.abs();
        h * self.formation_width() + h * h * (self.left_slope + self.right_slope) / 2.0
    }

    /// Highest (crest) or lowest (sag) point on the vertical curve as
    /// `(chainage, level)`, when it falls within the curve
    pub fn turning_point(&self) -> Option<(f64, f64)> {
        if !self.vertical_curve {
            return None;
        }
        let (g1, g2) = self.grades();
        if g2 == g1 {
            return None;
        }
        let x = -g1 * self.curve_length / (g2 - g1);
        if !(0.0..=self.curve_length).contains(&x) {
            return None;
        }
        let chainage = self.vpi_chainage - self.curve_length / 2.0 + x;
        Some((chainage, self.formation_level(chainage)))
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let step = self.length() / SEGMENTS as f64;
        let chainages: Vec<f64> = (0..=SEGMENTS).map(|i| self.chainage_start + i as f64 * step).collect();
        let levels: Vec<(f64, f64, f64)> = chainages
            .iter()
            .map(|c| (*c, self.existing_level(*c), self.formation_level(*c)))
            .collect();

        let lowest = levels.iter().map(|l| l.1.min(l.2)).fold(f64::INFINITY, f64::min);
        let highest = levels.iter().map(|l| l.1.max(l.2)).fold(f64::NEG_INFINITY, f64::max);
        let datum = lowest.floor() - 2.0;
        let v = self.vertical_scale;
        let x_of = |c: f64| c - self.chainage_start;
        let y_of = |level: f64| (level - datum) * v;
        let text_h = (self.length() / 100.0).clamp(0.5, 40.0);

        let mut drawing = Drawing::new(format!("Road Profile (V x{:.0})", v), DrawingUnits::Metres);

        // Datum and chainage band
        drawing.line(Layer::Grid, Point::new(0.0, 0.0), Point::new(self.length(), 0.0));
        let top = y_of(highest.ceil() + 1.0);
        for (i, (c, egl, fl)) in levels.iter().enumerate() {
            if i % 10 == 0 {
                drawing
                    .line(Layer::Grid, Point::new(x_of(*c), 0.0), Point::new(x_of(*c), top))
                    .text_aligned(Point::new(x_of(*c), -2.0 * text_h), text_h, format!("{:.0}", c), TextAlign::Center)
                    .text_aligned(Point::new(x_of(*c), -3.6 * text_h), text_h * 0.8, format!("{:.3}", egl), TextAlign::Center)
                    .text_aligned(Point::new(x_of(*c), -5.2 * text_h), text_h * 0.8, format!("{:.3}", fl), TextAlign::Center);
            }
            if (fl - egl).abs() > 1e-6 {
                drawing.line(Layer::Fill, Point::new(x_of(*c), y_of(*egl)), Point::new(x_of(*c), y_of(*fl)));
            }
        }
        drawing
            .text_aligned(Point::new(-text_h, -2.0 * text_h), text_h, "CH", TextAlign::Right)
            .text_aligned(Point::new(-text_h, -3.6 * text_h), text_h * 0.8, "EGL", TextAlign::Right)
            .text_aligned(Point::new(-text_h, -5.2 * text_h), text_h * 0.8, "FRL", TextAlign::Right)
            .text_aligned(Point::new(-text_h, 0.0), text_h * 0.8, format!("DATUM {:.1}", datum), TextAlign::Right);

        drawing
            .polyline(Layer::Ground, levels.iter().map(|l| Point::new(x_of(l.0), y_of(l.1))).collect(), false)
            .polyline(Layer::Profile, levels.iter().map(|l| Point::new(x_of(l.0), y_of(l.2))).collect(), false);

        if self.vertical_curve {
            let vpi = Point::new(x_of(self.vpi_chainage), y_of(self.vpi_level));
            let half = self.curve_length / 2.0;
            let bvc = self.vpi_chainage - half;
            let evc = self.vpi_chainage + half;
            drawing
                .circle(Layer::Dimensions, vpi, text_h * 0.4)
                .line(Layer::Dimensions, Point::new(x_of(bvc), y_of(self.formation_level(bvc))), vpi)
                .line(Layer::Dimensions, vpi, Point::new(x_of(evc), y_of(self.formation_level(evc))))
                .text_aligned(
                    vpi.offset(0.0, 1.5 * text_h),
                    text_h,
                    format!("VPI CH {:.1} RL {:.3}  L = {:.0} m", self.vpi_chainage, self.vpi_level, self.curve_length),
                    TextAlign::Center,
                );
            for (label, ch) in [("BVC", bvc), ("EVC", evc)] {
                let p = Point::new(x_of(ch), y_of(self.formation_level(ch)));
                drawing
                    .line(Layer::Dimensions, p.offset(0.0, -text_h), p.offset(0.0, text_h))
                    .text_aligned(p.offset(0.0, -2.2 * text_h), text_h * 0.8, label, TextAlign::Center);
            }
        }

        drawing.text_aligned(
            Point::new(self.length() / 2.0, top + 1.5 * text_h),
            text_h * 1.3,
            "ROAD PROFILE - FORMATION AND EXISTING GROUND",
            TextAlign::Center,
        );

        // Average end area earthwork
        let mut fill_volume = 0.0;
        let mut cut_volume = 0.0;
        for pair in levels.windows(2) {
            let d0 = pair[0].2 - pair[0].1;
            let d1 = pair[1].2 - pair[1].1;
            let area = |d: f64| if d > 0.0 { (self.section_area(d), 0.0) } else { (0.0, self.section_area(d)) };
            let (f0, c0) = area(d0);
            let (f1, c1) = area(d1);
            fill_volume += (f0 + f1) / 2.0 * step;
            cut_volume += (c0 + c1) / 2.0 * step;
        }
        let depths: Vec<f64> = levels.iter().map(|l| l.2 - l.1).collect();
        let fills: Vec<f64> = depths.iter().copied().filter(|d| *d > 0.0).collect();
        let cuts: Vec<f64> = depths.iter().copied().filter(|d| *d < 0.0).map(|d| -d).collect();
        let mean = |v: &[f64]| if v.is_empty() { 0.0 } else { v.iter().sum::<f64>() / v.len() as f64 };

        let (g1, g2) = self.grades();
        let mut design = Design::new(drawing)
            .summary("Incoming grade", g1, 3, "%")
            .summary("Outgoing grade", g2, 3, "%")
            .summary("Formation width", self.formation_width(), 2, "m")
            .summary("Average fill depth", mean(&fills), 3, "m")
            .summary("Average cut depth", mean(&cuts), 3, "m")
            .summary("Fill volume", fill_volume, 0, "m³")
            .summary("Cut volume", cut_volume, 0, "m³")
            .summary("Stopping sight distance", self.stopping_sight_distance(), 1, "m")
            .check_max("Maximum cut depth", cuts.iter().copied().fold(0.0, f64::max), self.max_cut, 3);
        if self.vertical_curve {
            let a = self.grade_difference();
            design = design.summary("Algebraic grade difference", a, 3, "%");
            if a > 0.0 {
                design = design.summary("K value", self.curve_length / a, 1, "m/%");
            }
            design = design
                .summary("Minimum curve length", self.minimum_curve_length(), 1, "m")
                .check_min("Vertical curve length", self.curve_length, self.minimum_curve_length(), 1);
            if let Some((chainage, level)) = self.turning_point() {
                let label = if self.is_crest() { "High point" } else { "Low point" };
                design = design
                    .summary(format!("{} chainage", label), chainage, 2, "m")
                    .summary(format!("{} level", label), level, 3, "m");
            }
        }
        Ok(design)
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = ProfileInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> ProfileInput {
        let state = ModuleParameterState::new();
        ProfileInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_uniform_fill_without_curve() {
        let input = defaults();
        let design = input.design().unwrap();
        assert!((design.value("Average fill depth").unwrap() - 0.5).abs() < 1e-9);
        // 0.5 m fill over 10 m base with 2:1 slopes = 5.5 m² over 500 m
        assert!((design.value("Fill volume").unwrap() - 2750.0).abs() < 1e-6);
        assert_eq!(design.value("Cut volume"), Some(0.0));
    }

    #[test]
    fn test_vertical_curve_is_continuous() {
        let mut input = defaults();
        input.vertical_curve = true;
        let (g1, g2) = input.grades();
        assert!((g1 - 1.4).abs() < 1e-9);
        assert!((g2 - 0.6).abs() < 1e-9);
        assert!(input.is_crest());

        for ch in [200.0, 300.0] {
            let before = input.formation_level(ch - 1e-6);
            let after = input.formation_level(ch + 1e-6);
            assert!((before - after).abs() < 1e-6, "jump at {}", ch);
        }
        // Mid-curve ordinate sits A L / 800 below the VPI
        let mid = input.formation_level(250.0);
        assert!((input.vpi_level - mid - 0.8 * 100.0 / 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_sloped_ground_starts_below_formation() {
        let mut input = defaults();
        input.manual_egl = false;
        input.egl_slope = 2.0;
        assert!((input.existing_level(0.0) - 100.2).abs() < 1e-9);
        assert!((input.existing_level(500.0) - 110.2).abs() < 1e-9);

        // Ground rises 1% faster than the formation, ending 4.7 m above it
        let design = input.design().unwrap();
        assert!(design.value("Cut volume").unwrap() > 0.0);
        assert!(!design.passes());
    }

    #[test]
    fn test_asymmetric_section_area() {
        let mut input = defaults();
        input.left_shoulder = 0.0;
        input.right_slope = 4.0;
        assert!((input.formation_width() - 8.5).abs() < 1e-9);
        // 1 m fill: 8.5 + (2 + 4) / 2
        assert!((input.section_area(1.0) - 11.5).abs() < 1e-9);
        assert!((input.section_area(-1.0) - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_crest_high_point() {
        let mut input = defaults();
        input.vertical_curve = true;
        input.formation_end = 101.0;
        // g1 = 1.4 %, g2 = -1.2 %: high point 1.4 * 100 / 2.6 m past the BVC
        let (chainage, level) = input.turning_point().unwrap();
        assert!((chainage - (200.0 + 140.0 / 2.6)).abs() < 1e-9);
        assert!(level < input.vpi_level);
        assert!(level >= input.formation_level(chainage - 1.0));
        assert!(level >= input.formation_level(chainage + 1.0));

        // Both grades rising: no turning point on the curve
        input.formation_end = 105.5;
        assert_eq!(input.turning_point(), None);
    }

    #[test]
    fn test_curve_outside_range_rejected() {
        let mut input = defaults();
        input.vertical_curve = true;
        input.vpi_chainage = 20.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_k_value_reported() {
        let mut input = defaults();
        input.vertical_curve = true;
        let design = input.design().unwrap();
        assert!((design.value("K value").unwrap() - 125.0).abs() < 1e-6);
    }
}
