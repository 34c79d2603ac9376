//! # Road Plan
//!
//! Plan view of a two-lane road: centreline, carriageway edges and shoulder
//! edges, with chainage ticks. The alignment is a straight, a single
//! left-hand circular curve, or a curve between two equal tangents.
//!
//! Reported geometry uses the usual highway relations:
//!
//! - curve length `Lc = π R Δ / 180`
//! - tangent length `T = R tan(Δ/2)`, external `E = R (sec(Δ/2) - 1)`
//! - stopping sight distance `SSD = v t + v² / (2 g f)` with t = 2.5 s, f = 0.35
//! - minimum radius `Rmin = V² / (127 (e + f))` with lateral friction 0.15

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::Design;
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "road_plan";

pub const ALIGNMENTS: &[&str] = &["Straight", "Curved", "Combined"];

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("road_length", "Road length", "m", 500.0, 50.0, 20000.0),
    ParameterSpec::number("road_width", "Carriageway width", "m", 7.0, 3.0, 30.0),
    ParameterSpec::number("shoulder_width", "Shoulder width", "m", 1.5, 0.0, 5.0),
    ParameterSpec::number("design_speed", "Design speed", "km/h", 60.0, 20.0, 120.0),
    ParameterSpec::choice("alignment", "Alignment", ALIGNMENTS, "Combined"),
    ParameterSpec::number("curve_radius", "Curve radius", "m", 150.0, 10.0, 5000.0),
    ParameterSpec::number("deflection_angle", "Deflection angle", "deg", 45.0, 1.0, 180.0),
    ParameterSpec::number("superelevation", "Superelevation", "%", 5.0, 0.0, 10.0),
    ParameterSpec::number("station_interval", "Chainage tick interval", "m", 50.0, 10.0, 1000.0),
];

/// Horizontal alignment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Straight,
    Curved,
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadPlanInput {
    pub road_length: f64,
    pub road_width: f64,
    pub shoulder_width: f64,
    pub design_speed: f64,
    pub alignment: Alignment,
    pub curve_radius: f64,
    pub deflection_angle: f64,
    pub superelevation: f64,
    pub station_interval: f64,
}

/// Centreline sample: position, heading in radians, chainage
#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Point,
    heading: f64,
    chainage: f64,
}

impl Sample {
    /// Point `d` to the left of the centreline (negative for right)
    fn offset(&self, d: f64) -> Point {
        Point::new(self.at.x - d * self.heading.sin(), self.at.y + d * self.heading.cos())
    }

    /// Sample `s` further along a straight
    fn along(&self, s: f64) -> Sample {
        Sample {
            at: Point::new(self.at.x + s * self.heading.cos(), self.at.y + s * self.heading.sin()),
            heading: self.heading,
            chainage: self.chainage + s,
        }
    }
}

/// One element of the horizontal alignment
#[derive(Debug, Clone, Copy)]
enum Leg {
    Straight { from: Sample, length: f64 },
    /// Left-hand circular curve of the design radius and deflection
    Curve { from: Sample },
}

impl RoadPlanInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        let alignment = match p.choice("alignment")?.as_str() {
            "Straight" => Alignment::Straight,
            "Curved" => Alignment::Curved,
            _ => Alignment::Combined,
        };
        Ok(RoadPlanInput {
            road_length: p.number("road_length")?,
            road_width: p.number("road_width")?,
            shoulder_width: p.number("shoulder_width")?,
            design_speed: p.number("design_speed")?,
            alignment,
            curve_radius: p.number("curve_radius")?,
            deflection_angle: p.number("deflection_angle")?,
            superelevation: p.number("superelevation")?,
            station_interval: p.number("station_interval")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        let half = self.road_width / 2.0 + self.shoulder_width;
        if self.alignment != Alignment::Straight && self.curve_radius <= half {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "curve_radius",
                self.curve_radius.to_string(),
                "Radius must exceed half the formation width",
            ));
        }
        if self.alignment == Alignment::Combined && self.curve_length() >= self.road_length {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "road_length",
                self.road_length.to_string(),
                format!("Curve is {:.1} m long; the road must be longer to fit the tangents", self.curve_length()),
            ));
        }
        Ok(())
    }

    pub fn curve_length(&self) -> f64 {
        PI * self.curve_radius * self.deflection_angle / 180.0
    }

    pub fn tangent_length(&self) -> f64 {
        self.curve_radius * (self.deflection_angle.to_radians() / 2.0).tan()
    }

    pub fn external_distance(&self) -> f64 {
        self.curve_radius * (1.0 / (self.deflection_angle.to_radians() / 2.0).cos() - 1.0)
    }

    pub fn stopping_sight_distance(&self) -> f64 {
        let v = self.design_speed;
        v / 3.6 * 2.5 + v * v / (254.0 * 0.35)
    }

    pub fn minimum_radius(&self) -> f64 {
        let v = self.design_speed;
        v * v / (127.0 * (0.15 + self.superelevation / 100.0))
    }

    /// Length measured along the centreline
    pub fn centreline_length(&self) -> f64 {
        match self.alignment {
            Alignment::Curved => self.curve_length(),
            _ => self.road_length,
        }
    }

    fn legs(&self) -> Vec<Leg> {
        let start = Sample {
            at: Point::new(0.0, 0.0),
            heading: 0.0,
            chainage: 0.0,
        };
        match self.alignment {
            Alignment::Straight => vec![Leg::Straight {
                from: start,
                length: self.road_length,
            }],
            Alignment::Curved => vec![Leg::Curve { from: start }],
            Alignment::Combined => {
                let tangent = (self.road_length - self.curve_length()) / 2.0;
                let pc = start.along(tangent);
                let pt = self.curve_at(pc, self.deflection_angle.to_radians());
                vec![
                    Leg::Straight {
                        from: start,
                        length: tangent,
                    },
                    Leg::Curve { from: pc },
                    Leg::Straight {
                        from: pt,
                        length: tangent,
                    },
                ]
            }
        }
    }

    /// Centre of the curve starting at `from`
    fn curve_center(&self, from: Sample) -> Point {
        from.offset(self.curve_radius)
    }

    /// Sample after turning through `t` radians on the curve starting at `from`
    fn curve_at(&self, from: Sample, t: f64) -> Sample {
        let r = self.curve_radius;
        let center = self.curve_center(from);
        let angle = from.heading - PI / 2.0 + t;
        Sample {
            at: Point::new(center.x + r * angle.cos(), center.y + r * angle.sin()),
            heading: from.heading + t,
            chainage: from.chainage + r * t,
        }
    }

    fn samples(&self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for (i, leg) in self.legs().into_iter().enumerate() {
            let (from, steps) = match leg {
                Leg::Straight { from, .. } => (from, 20),
                Leg::Curve { from } => (from, ((self.deflection_angle / 2.0).ceil() as usize).max(20)),
            };
            if i == 0 {
                samples.push(from);
            }
            for step in 1..=steps {
                let f = step as f64 / steps as f64;
                samples.push(match leg {
                    Leg::Straight { from, length } => from.along(length * f),
                    Leg::Curve { from } => self.curve_at(from, self.deflection_angle.to_radians() * f),
                });
            }
        }
        samples
    }

    /// Draw the line parallel to the centreline at offset `d` (left positive)
    fn draw_offset(&self, drawing: &mut Drawing, layer: Layer, d: f64) {
        for leg in self.legs() {
            match leg {
                Leg::Straight { from, length } => {
                    drawing.line(layer, from.offset(d), from.along(length).offset(d));
                }
                Leg::Curve { from } => {
                    let start_deg = (from.heading - PI / 2.0).to_degrees();
                    drawing.arc(
                        layer,
                        self.curve_center(from),
                        self.curve_radius - d,
                        start_deg,
                        start_deg + self.deflection_angle,
                    );
                }
            }
        }
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let samples = self.samples();
        let half = self.road_width / 2.0;
        let outer = half + self.shoulder_width;
        let text_h = (self.centreline_length() / 80.0).clamp(1.0, 20.0);

        let mut drawing = Drawing::new("Road Plan", DrawingUnits::Metres);
        self.draw_offset(&mut drawing, Layer::Centerline, 0.0);
        self.draw_offset(&mut drawing, Layer::Outline, half);
        self.draw_offset(&mut drawing, Layer::Outline, -half);
        if self.shoulder_width > 0.0 {
            self.draw_offset(&mut drawing, Layer::Ground, outer);
            self.draw_offset(&mut drawing, Layer::Ground, -outer);
        }

        // Chainage ticks at the sample nearest each station
        let total = self.centreline_length();
        let mut station = 0.0;
        while station <= total + 1e-6 {
            if let Some(s) = samples
                .iter()
                .min_by(|a, b| (a.chainage - station).abs().total_cmp(&(b.chainage - station).abs()))
            {
                drawing
                    .line(Layer::Grid, s.offset(outer + text_h * 0.5), s.offset(-outer - text_h * 0.5))
                    .text_aligned(
                        s.offset(-outer - 2.0 * text_h),
                        text_h,
                        format!("{}+{:03.0}", (station / 1000.0).floor(), station % 1000.0),
                        TextAlign::Center,
                    );
            }
            station += self.station_interval;
        }

        if self.alignment != Alignment::Straight {
            let mid = samples
                .iter()
                .min_by(|a, b| (a.chainage - total / 2.0).abs().total_cmp(&(b.chainage - total / 2.0).abs()))
                .copied()
                .unwrap_or(Sample {
                    at: Point::new(0.0, 0.0),
                    heading: 0.0,
                    chainage: 0.0,
                });
            drawing.text_aligned(
                mid.offset(outer + 2.0 * text_h),
                text_h,
                format!("R = {:.0} m, Δ = {:.1}°", self.curve_radius, self.deflection_angle),
                TextAlign::Center,
            );
        }
        drawing.text(
            Point::new(0.0, -outer - 6.0 * text_h),
            text_h * 1.3,
            format!("ROAD PLAN - {:.0} km/h, {:.1} m carriageway", self.design_speed, self.road_width),
        );

        let mut design = Design::new(drawing)
            .summary("Centreline length", total, 1, "m")
            .summary("Formation width", 2.0 * outer, 2, "m")
            .summary("Stopping sight distance", self.stopping_sight_distance(), 1, "m");
        if self.alignment != Alignment::Straight {
            design = design
                .summary("Curve length", self.curve_length(), 2, "m")
                .summary("Tangent length", self.tangent_length(), 2, "m")
                .summary("External distance", self.external_distance(), 2, "m")
                .summary("Minimum radius", self.minimum_radius(), 1, "m")
                .check_min("Curve radius", self.curve_radius, self.minimum_radius(), 1);
        }
        Ok(design)
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = RoadPlanInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Entity;
    use crate::params::ModuleParameterState;

    fn defaults() -> RoadPlanInput {
        let state = ModuleParameterState::new();
        RoadPlanInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_geometry_formulas() {
        let input = defaults();
        assert!((input.curve_length() - 117.81).abs() < 0.01);
        assert!((input.stopping_sight_distance() - 82.16).abs() < 0.01);
        assert!((input.minimum_radius() - 141.73).abs() < 0.01);
    }

    #[test]
    fn test_combined_alignment_ends_at_road_length() {
        let input = defaults();
        let samples = input.samples();
        let last = samples.last().unwrap();
        assert!((last.chainage - 500.0).abs() < 1e-6);
        assert!((last.heading - 45f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_curve_edges_stay_at_constant_offset() {
        let mut input = defaults();
        input.alignment = Alignment::Curved;
        let samples = input.samples();
        let center = samples[0].offset(input.curve_radius);
        for s in &samples {
            assert!((s.offset(3.5).distance(center) - (input.curve_radius - 3.5)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_curve_drawn_as_arcs() {
        let input = defaults();
        let design = input.design().unwrap();
        let arcs: Vec<(f64, f64)> = design
            .drawing
            .entities
            .iter()
            .filter_map(|e| match e {
                Entity::Arc {
                    radius,
                    start_deg,
                    end_deg,
                    ..
                } => Some((*radius, end_deg - start_deg)),
                _ => None,
            })
            .collect();
        // Centreline, two carriageway edges, two shoulder edges
        assert_eq!(arcs.len(), 5);
        assert!(arcs.iter().all(|(_, sweep)| (sweep - 45.0).abs() < 1e-9));
        let mut radii: Vec<f64> = arcs.iter().map(|(r, _)| *r).collect();
        radii.sort_by(f64::total_cmp);
        assert_eq!(radii, vec![145.0, 146.5, 150.0, 153.5, 155.0]);
    }

    #[test]
    fn test_straight_has_no_arcs() {
        let mut input = defaults();
        input.alignment = Alignment::Straight;
        let design = input.design().unwrap();
        assert!(!design.drawing.entities.iter().any(|e| matches!(e, Entity::Arc { .. })));
        assert_eq!(design.drawing.count_on(Layer::Outline), 2);
    }

    #[test]
    fn test_tight_radius_fails_check() {
        let mut input = defaults();
        input.curve_radius = 80.0;
        let design = input.design().unwrap();
        assert!(!design.passes());
    }

    #[test]
    fn test_curve_too_long_for_road() {
        let mut input = defaults();
        input.road_length = 100.0;
        assert!(input.validate().is_err());
        input.alignment = Alignment::Straight;
        assert!(input.validate().is_ok());
    }
}
