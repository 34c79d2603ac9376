//! # PMGSY Rural Road Typical Section
//!
//! Typical cross section of a rural road built to PMGSY standards: cambered
//! bituminous surface over a granular base and sub-base, shoulders sloping
//! 1 % steeper than the camber, 2:1 embankment slopes and optional
//! rectangular side drains beyond the toe.
//!
//! Design traffic is the cumulative standard axles over a 10 year design
//! life at 6 % growth with a vehicle damage factor of 0.5 (IRC:SP:72 style).

use serde::{Deserialize, Serialize};

use super::Design;
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "pmgsy_road";

pub const CARRIAGEWAYS: &[&str] = &["Single Lane", "Intermediate Lane", "Double Lane"];

const EMBANKMENT_HEIGHT: f64 = 1.0;
const EMBANKMENT_SLOPE: f64 = 2.0;
const DESIGN_LIFE_YEARS: i32 = 10;
const GROWTH_RATE: f64 = 0.06;
const VEHICLE_DAMAGE_FACTOR: f64 = 0.5;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("road_length", "Road length", "km", 5.0, 0.1, 100.0),
    ParameterSpec::choice("design_speed", "Design speed (km/h)", &["30", "40", "50", "65"], "40"),
    ParameterSpec::choice("carriageway", "Carriageway", CARRIAGEWAYS, "Single Lane"),
    ParameterSpec::number("shoulder_width", "Shoulder width", "m", 1.875, 0.0, 3.0),
    ParameterSpec::choice("shoulder_type", "Shoulder type", &["Earthen", "Granular", "Hard"], "Earthen"),
    ParameterSpec::number("cross_slope", "Camber", "%", 2.5, 1.0, 5.0),
    ParameterSpec::flag("side_drain", "Side drains", true),
    ParameterSpec::number("drain_width", "Drain width", "m", 0.45, 0.2, 2.0),
    ParameterSpec::number("drain_depth", "Drain depth", "m", 0.45, 0.2, 2.0),
    ParameterSpec::number("subgrade_cbr", "Subgrade CBR", "%", 5.0, 1.0, 30.0),
    ParameterSpec::number("traffic_cvpd", "Commercial vehicles per day", "", 150.0, 0.0, 5000.0),
    ParameterSpec::number("subbase_thickness", "Granular sub-base", "mm", 150.0, 0.0, 600.0),
    ParameterSpec::number("base_thickness", "WBM base", "mm", 225.0, 75.0, 600.0),
    ParameterSpec::number("surface_thickness", "Bituminous surface", "mm", 50.0, 0.0, 100.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmgsyInput {
    pub road_length_km: f64,
    pub design_speed: String,
    pub carriageway: String,
    pub shoulder_width: f64,
    pub shoulder_type: String,
    pub cross_slope: f64,
    pub side_drain: bool,
    pub drain_width: f64,
    pub drain_depth: f64,
    pub subgrade_cbr: f64,
    pub traffic_cvpd: f64,
    pub subbase_thickness: f64,
    pub base_thickness: f64,
    pub surface_thickness: f64,
}

impl PmgsyInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(PmgsyInput {
            road_length_km: p.number("road_length")?,
            design_speed: p.choice("design_speed")?,
            carriageway: p.choice("carriageway")?,
            shoulder_width: p.number("shoulder_width")?,
            shoulder_type: p.choice("shoulder_type")?,
            cross_slope: p.number("cross_slope")?,
            side_drain: p.flag("side_drain")?,
            drain_width: p.number("drain_width")?,
            drain_depth: p.number("drain_depth")?,
            subgrade_cbr: p.number("subgrade_cbr")?,
            traffic_cvpd: p.number("traffic_cvpd")?,
            subbase_thickness: p.number("subbase_thickness")?,
            base_thickness: p.number("base_thickness")?,
            surface_thickness: p.number("surface_thickness")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.shoulder_type == "Hard" && self.shoulder_width == 0.0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "shoulder_width",
                "0",
                "Hard shoulders need a width",
            ));
        }
        if self.pavement_thickness_mm() / 1000.0 >= EMBANKMENT_HEIGHT {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "base_thickness",
                self.base_thickness.to_string(),
                "Pavement crust must be thinner than the embankment",
            ));
        }
        Ok(())
    }

    pub fn carriageway_width(&self) -> f64 {
        match self.carriageway.as_str() {
            "Intermediate Lane" => 5.5,
            "Double Lane" => 7.0,
            _ => 3.75,
        }
    }

    pub fn roadway_width(&self) -> f64 {
        self.carriageway_width() + 2.0 * self.shoulder_width
    }

    pub fn pavement_thickness_mm(&self) -> f64 {
        self.subbase_thickness + self.base_thickness + self.surface_thickness
    }

    /// Cumulative standard axles over the design life, million
    pub fn design_traffic_msa(&self) -> f64 {
        let growth = ((1.0 + GROWTH_RATE).powi(DESIGN_LIFE_YEARS) - 1.0) / GROWTH_RATE;
        365.0 * self.traffic_cvpd * growth * VEHICLE_DAMAGE_FACTOR / 1e6
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let half_cw = self.carriageway_width() / 2.0;
        let camber = self.cross_slope / 100.0;
        let shoulder_slope = camber + 0.01;
        let edge_y = -half_cw * camber;
        let outer_x = half_cw + self.shoulder_width;
        let outer_y = edge_y - self.shoulder_width * shoulder_slope;
        let ground_y = outer_y - EMBANKMENT_HEIGHT;
        let toe_x = outer_x + EMBANKMENT_HEIGHT * EMBANKMENT_SLOPE;
        let text_h = 0.15;

        let mut drawing = Drawing::new("PMGSY Typical Cross Section", DrawingUnits::Metres);

        // Pavement layers follow the camber: crown at x = 0
        let mut depth = 0.0;
        drawing.polyline(
            Layer::Outline,
            vec![Point::new(-half_cw, edge_y), Point::new(0.0, 0.0), Point::new(half_cw, edge_y)],
            false,
        );
        let mut layer_labels = Vec::new();
        for (name, thickness) in [
            ("BT SURFACE", self.surface_thickness),
            ("WBM BASE", self.base_thickness),
            ("GSB", self.subbase_thickness),
        ] {
            if thickness <= 0.0 {
                continue;
            }
            depth += thickness / 1000.0;
            drawing.polyline(
                Layer::Outline,
                vec![
                    Point::new(-half_cw, edge_y - depth),
                    Point::new(0.0, -depth),
                    Point::new(half_cw, edge_y - depth),
                ],
                false,
            );
            layer_labels.push((name, thickness, -depth));
        }
        drawing
            .line(Layer::Outline, Point::new(-half_cw, edge_y), Point::new(-half_cw, edge_y - depth))
            .line(Layer::Outline, Point::new(half_cw, edge_y), Point::new(half_cw, edge_y - depth));

        // Shoulders, embankment and ground
        for side in [-1.0, 1.0] {
            drawing.polyline(
                Layer::Ground,
                vec![
                    Point::new(side * half_cw, edge_y),
                    Point::new(side * outer_x, outer_y),
                    Point::new(side * toe_x, ground_y),
                ],
                false,
            );
        }
        let ground_extent = if self.side_drain {
            toe_x + 0.5 + self.drain_width + 1.0
        } else {
            toe_x + 1.0
        };

        if self.side_drain {
            for side in [-1.0, 1.0] {
                let inner = side * (toe_x + 0.5);
                let outer = side * (toe_x + 0.5 + self.drain_width);
                drawing.polyline(
                    Layer::Outline,
                    vec![
                        Point::new(inner, ground_y),
                        Point::new(inner, ground_y - self.drain_depth),
                        Point::new(outer, ground_y - self.drain_depth),
                        Point::new(outer, ground_y),
                    ],
                    false,
                );
            }
            let inner = toe_x + 0.5;
            let outer = inner + self.drain_width;
            drawing
                .line(Layer::Ground, Point::new(-ground_extent, ground_y), Point::new(-outer, ground_y))
                .line(Layer::Ground, Point::new(-inner, ground_y), Point::new(inner, ground_y))
                .line(Layer::Ground, Point::new(outer, ground_y), Point::new(ground_extent, ground_y))
                .text_aligned(
                    Point::new(inner + self.drain_width / 2.0, ground_y - self.drain_depth - 1.5 * text_h),
                    text_h,
                    format!("DRAIN {:.2} x {:.2}", self.drain_width, self.drain_depth),
                    TextAlign::Center,
                );
        } else {
            drawing.line(Layer::Ground, Point::new(-ground_extent, ground_y), Point::new(ground_extent, ground_y));
        }

        drawing
            .line(Layer::Centerline, Point::new(0.0, ground_y - 0.2), Point::new(0.0, 0.6))
            .dimension_h(
                Point::new(-half_cw, 0.45),
                Point::new(half_cw, 0.45),
                format!("CARRIAGEWAY {:.2} m", self.carriageway_width()),
                text_h,
            )
            .dimension_h(
                Point::new(-outer_x, 0.9),
                Point::new(outer_x, 0.9),
                format!("ROADWAY {:.3} m", self.roadway_width()),
                text_h,
            )
            .text_aligned(
                Point::new(half_cw * 0.5, 0.1),
                text_h * 0.8,
                format!("CAMBER {:.1}%", self.cross_slope),
                TextAlign::Center,
            )
            .text_aligned(
                Point::new(outer_x, outer_y + 0.15),
                text_h * 0.8,
                format!("{} SHOULDER", self.shoulder_type.to_uppercase()),
                TextAlign::Center,
            );
        for (i, (name, thickness, y)) in layer_labels.iter().enumerate() {
            drawing.text(
                Point::new(-ground_extent, ground_y - 1.0 - i as f64 * 1.6 * text_h),
                text_h,
                format!("{} {:.0} mm (to {:.3} below crown)", name, thickness, -y),
            );
        }
        drawing.text_aligned(
            Point::new(0.0, 1.4),
            text_h * 1.4,
            format!("PMGSY ROAD - {} km/h, {:.2} km", self.design_speed, self.road_length_km),
            TextAlign::Center,
        );

        Ok(Design::new(drawing)
            .summary("Carriageway width", self.carriageway_width(), 2, "m")
            .summary("Roadway width", self.roadway_width(), 3, "m")
            .summary("Pavement thickness", self.pavement_thickness_mm(), 0, "mm")
            .summary("Design traffic", self.design_traffic_msa(), 3, "msa")
            .summary("Shoulder slope", shoulder_slope * 100.0, 1, "%")
            .summary("Embankment toe width", 2.0 * toe_x, 2, "m")
            .check_min("Roadway width", self.roadway_width(), 7.5, 2)
            .check_min("Subgrade CBR", self.subgrade_cbr, 5.0, 1)
            .check_min("Granular crust", self.subbase_thickness + self.base_thickness, 225.0, 0))
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = PmgsyInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> PmgsyInput {
        let state = ModuleParameterState::new();
        PmgsyInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_carriageway_widths() {
        let mut input = defaults();
        assert_eq!(input.carriageway_width(), 3.75);
        input.carriageway = "Intermediate Lane".into();
        assert_eq!(input.carriageway_width(), 5.5);
        input.carriageway = "Double Lane".into();
        assert_eq!(input.carriageway_width(), 7.0);
    }

    #[test]
    fn test_design_traffic() {
        let input = defaults();
        // 365 * 150 * 13.18 * 0.5 = 0.361 msa
        assert!((input.design_traffic_msa() - 0.361).abs() < 0.001);
    }

    #[test]
    fn test_defaults_pass_checks() {
        let design = defaults().design().unwrap();
        assert!(design.passes());
        assert_eq!(design.value("Pavement thickness"), Some(425.0));
    }

    #[test]
    fn test_drains_are_optional() {
        let mut input = defaults();
        let with = input.design().unwrap().drawing.entities.len();
        input.side_drain = false;
        let without = input.design().unwrap().drawing.entities.len();
        assert!(without < with);
    }

    #[test]
    fn test_thick_crust_rejected() {
        let mut input = defaults();
        input.subbase_thickness = 600.0;
        input.base_thickness = 450.0;
        assert!(input.validate().is_err());
    }
}
