//! # Bridge General Arrangement
//!
//! Longitudinal elevation of a multi-span slab bridge: datum with chainage
//! and level ticks, deck slab with wearing course and kerb, approach slabs,
//! abutments, and intermediate piers with caps, battered shafts and open
//! footings. All levels are reduced levels in metres.
//!
//! ## Assumptions
//!
//! - Equal spans; `num_spans * span_length` must match the bridge length
//! - Piers batter on both faces at 1 horizontal in `pier_batter` vertical
//! - Abutment stems are drawn as wide as the pier cap

use serde::{Deserialize, Serialize};

use super::Design;
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "bridge";

/// Most ticks drawn along either datum axis
pub const MAX_TICKS: usize = 200;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("bridge_length", "Total length (LBRIDGE)", "m", 43.2, 5.0, 1000.0),
    ParameterSpec::integer("num_spans", "Number of spans (NSPAN)", "", 4, 1, 50),
    ParameterSpec::number("span_length", "Span (SPAN1)", "m", 10.8, 2.0, 100.0),
    ParameterSpec::number("skew", "Skew angle", "deg", 0.0, 0.0, 60.0),
    ParameterSpec::number("datum", "Datum level", "m", 100.0, 0.0, 9000.0),
    ParameterSpec::number("road_top_level", "Road top level (RTL)", "m", 110.98, 0.0, 9000.0),
    ParameterSpec::number("soffit_level", "Soffit level (SOFL)", "m", 110.0, 0.0, 9000.0),
    ParameterSpec::number("carriageway_width", "Carriageway width (CCBR)", "m", 11.1, 3.0, 50.0),
    ParameterSpec::number("wearing_course", "Wearing course (WCTH)", "m", 0.08, 0.0, 0.3),
    ParameterSpec::number("kerb_width", "Kerb width", "m", 0.23, 0.0, 1.0),
    ParameterSpec::number("kerb_depth", "Kerb depth", "m", 0.23, 0.0, 1.0),
    ParameterSpec::number("approach_slab_length", "Approach slab length", "m", 3.5, 0.0, 20.0),
    ParameterSpec::number("approach_slab_thickness", "Approach slab thickness", "m", 0.38, 0.1, 1.0),
    ParameterSpec::number("pier_top_width", "Pier top width", "m", 1.2, 0.3, 5.0),
    ParameterSpec::number("pier_batter", "Pier batter (1 in)", "", 10.0, 2.0, 100.0),
    ParameterSpec::number("cap_top", "Pier cap top level", "m", 110.0, 0.0, 9000.0),
    ParameterSpec::number("cap_bottom", "Pier cap bottom level", "m", 109.4, 0.0, 9000.0),
    ParameterSpec::number("cap_width", "Pier cap width", "m", 1.2, 0.3, 5.0),
    ParameterSpec::number("footing_level", "Founding level", "m", 100.0, 0.0, 9000.0),
    ParameterSpec::number("footing_depth", "Footing depth", "m", 1.0, 0.3, 5.0),
    ParameterSpec::number("footing_width", "Footing width", "m", 4.5, 0.5, 20.0),
    ParameterSpec::number("chainage_interval", "Chainage tick interval", "m", 10.0, 1.0, 100.0),
    ParameterSpec::number("level_interval", "Level tick interval", "m", 1.0, 0.1, 10.0),
];

/// Typed bridge inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeInput {
    pub bridge_length: f64,
    pub num_spans: usize,
    pub span_length: f64,
    pub skew_deg: f64,
    pub datum: f64,
    pub road_top_level: f64,
    pub soffit_level: f64,
    pub carriageway_width: f64,
    pub wearing_course: f64,
    pub kerb_width: f64,
    pub kerb_depth: f64,
    pub approach_slab_length: f64,
    pub approach_slab_thickness: f64,
    pub pier_top_width: f64,
    pub pier_batter: f64,
    pub cap_top: f64,
    pub cap_bottom: f64,
    pub cap_width: f64,
    pub footing_level: f64,
    pub footing_depth: f64,
    pub footing_width: f64,
    pub chainage_interval: f64,
    pub level_interval: f64,
}

impl BridgeInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(BridgeInput {
            bridge_length: p.number("bridge_length")?,
            num_spans: p.count("num_spans")?,
            span_length: p.number("span_length")?,
            skew_deg: p.number("skew")?,
            datum: p.number("datum")?,
            road_top_level: p.number("road_top_level")?,
            soffit_level: p.number("soffit_level")?,
            carriageway_width: p.number("carriageway_width")?,
            wearing_course: p.number("wearing_course")?,
            kerb_width: p.number("kerb_width")?,
            kerb_depth: p.number("kerb_depth")?,
            approach_slab_length: p.number("approach_slab_length")?,
            approach_slab_thickness: p.number("approach_slab_thickness")?,
            pier_top_width: p.number("pier_top_width")?,
            pier_batter: p.number("pier_batter")?,
            cap_top: p.number("cap_top")?,
            cap_bottom: p.number("cap_bottom")?,
            cap_width: p.number("cap_width")?,
            footing_level: p.number("footing_level")?,
            footing_depth: p.number("footing_depth")?,
            footing_width: p.number("footing_width")?,
            chainage_interval: p.number("chainage_interval")?,
            level_interval: p.number("level_interval")?,
        })
    }

    /// Validate level ordering and span arrangement.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.num_spans == 0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "num_spans",
                "0",
                "Number of spans must be greater than zero",
            ));
        }
        let arranged = self.num_spans as f64 * self.span_length;
        if (arranged - self.bridge_length).abs() > 0.01 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "span_length",
                self.span_length.to_string(),
                format!(
                    "{} spans of {} m give {:.2} m, but the bridge is {} m long",
                    self.num_spans, self.span_length, arranged, self.bridge_length
                ),
            ));
        }
        if self.road_top_level <= self.soffit_level {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "road_top_level",
                self.road_top_level.to_string(),
                "Road top level must be above the soffit level",
            ));
        }
        if self.wearing_course >= self.deck_depth() {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "wearing_course",
                self.wearing_course.to_string(),
                "Wearing course must be thinner than the deck",
            ));
        }
        if self.cap_top > self.soffit_level {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "cap_top",
                self.cap_top.to_string(),
                "Pier cap cannot rise above the soffit",
            ));
        }
        if self.cap_bottom >= self.cap_top {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "cap_bottom",
                self.cap_bottom.to_string(),
                "Cap bottom must be below cap top",
            ));
        }
        if self.footing_level + self.footing_depth >= self.cap_bottom {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "footing_level",
                self.footing_level.to_string(),
                "Footing must be below the pier cap",
            ));
        }
        if self.datum > self.footing_level {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "datum",
                self.datum.to_string(),
                "Datum must not be above the founding level",
            ));
        }
        if self.chainage_ticks() > MAX_TICKS {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "chainage_interval",
                self.chainage_interval.to_string(),
                format!("Gives {} chainage ticks; at most {} are drawn", self.chainage_ticks(), MAX_TICKS),
            ));
        }
        if self.level_ticks() > MAX_TICKS {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "level_interval",
                self.level_interval.to_string(),
                format!("Gives {} level ticks; at most {} are drawn", self.level_ticks(), MAX_TICKS),
            ));
        }
        Ok(())
    }

    /// Number of chainage ticks on the datum line, both ends included
    pub fn chainage_ticks(&self) -> usize {
        (self.bridge_length / self.chainage_interval).floor() as usize + 1
    }

    fn level_top(&self) -> f64 {
        self.road_top_level + self.kerb_depth
    }

    /// Number of level ticks from the datum up to the kerb top
    pub fn level_ticks(&self) -> usize {
        ((self.level_top() - self.datum) / self.level_interval).ceil() as usize + 1
    }

    pub fn deck_depth(&self) -> f64 {
        self.road_top_level - self.soffit_level
    }

    pub fn pier_height(&self) -> f64 {
        self.cap_bottom - (self.footing_level + self.footing_depth)
    }

    /// Width of a pier shaft at its base
    pub fn pier_base_width(&self) -> f64 {
        self.pier_top_width + 2.0 * self.pier_height() / self.pier_batter
    }

    fn skew_factor(&self) -> f64 {
        1.0 / self.skew_deg.to_radians().cos()
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let mut drawing = Drawing::new("Bridge General Arrangement", DrawingUnits::Metres);
        let text_h = (self.bridge_length / 120.0).clamp(0.2, 2.0);
        let deck_top = self.road_top_level - self.wearing_course;
        let footing_top = self.footing_level + self.footing_depth;
        let left = -self.approach_slab_length - self.cap_width;
        let right = self.bridge_length + self.approach_slab_length + self.cap_width;

        self.draw_datum(&mut drawing, left, right, text_h);

        // Deck, wearing course and kerb
        drawing
            .rect(
                Layer::Outline,
                Point::new(0.0, self.soffit_level),
                Point::new(self.bridge_length, deck_top),
            )
            .line(
                Layer::Outline,
                Point::new(-self.approach_slab_length, self.road_top_level),
                Point::new(self.bridge_length + self.approach_slab_length, self.road_top_level),
            );
        if self.kerb_depth > 0.0 && self.kerb_width > 0.0 {
            drawing.rect(
                Layer::Outline,
                Point::new(0.0, self.road_top_level),
                Point::new(self.bridge_length, self.road_top_level + self.kerb_depth),
            );
        }

        // Approach slabs
        if self.approach_slab_length > 0.0 {
            let slab_bottom = deck_top - self.approach_slab_thickness;
            drawing
                .rect(
                    Layer::Outline,
                    Point::new(-self.approach_slab_length, slab_bottom),
                    Point::new(0.0, deck_top),
                )
                .rect(
                    Layer::Outline,
                    Point::new(self.bridge_length, slab_bottom),
                    Point::new(self.bridge_length + self.approach_slab_length, deck_top),
                );
        }

        // Abutments
        for (face, stem_from, stem_to) in [
            (0.0, -self.cap_width, 0.0),
            (self.bridge_length, self.bridge_length, self.bridge_length + self.cap_width),
        ] {
            drawing
                .rect(
                    Layer::Outline,
                    Point::new(stem_from, footing_top),
                    Point::new(stem_to, self.soffit_level),
                )
                .rect(
                    Layer::Outline,
                    Point::new((stem_from + stem_to - self.footing_width) / 2.0, self.footing_level),
                    Point::new((stem_from + stem_to + self.footing_width) / 2.0, footing_top),
                )
                .line(
                    Layer::Centerline,
                    Point::new(face, self.footing_level - text_h),
                    Point::new(face, self.road_top_level + self.kerb_depth + text_h),
                );
        }

        // Piers
        let half_top = self.pier_top_width / 2.0;
        let half_base = self.pier_base_width() / 2.0;
        for i in 1..self.num_spans {
            let x = i as f64 * self.span_length;
            drawing
                .rect(
                    Layer::Outline,
                    Point::new(x - self.cap_width / 2.0, self.cap_bottom),
                    Point::new(x + self.cap_width / 2.0, self.cap_top),
                )
                .polyline(
                    Layer::Outline,
                    vec![
                        Point::new(x - half_top, self.cap_bottom),
                        Point::new(x + half_top, self.cap_bottom),
                        Point::new(x + half_base, footing_top),
                        Point::new(x - half_base, footing_top),
                    ],
                    true,
                )
                .rect(
                    Layer::Outline,
                    Point::new(x - self.footing_width / 2.0, self.footing_level),
                    Point::new(x + self.footing_width / 2.0, footing_top),
                )
                .line(
                    Layer::Centerline,
                    Point::new(x, self.footing_level - text_h),
                    Point::new(x, self.road_top_level + self.kerb_depth + text_h),
                )
                .text_aligned(
                    Point::new(x, self.footing_level - 2.5 * text_h),
                    text_h,
                    format!("P{}", i),
                    TextAlign::Center,
                );
        }

        // Span annotations
        let label_y = self.road_top_level + self.kerb_depth + 1.5 * text_h;
        for i in 0..self.num_spans {
            let x = (i as f64 + 0.5) * self.span_length;
            drawing.text_aligned(
                Point::new(x, label_y),
                text_h,
                format!("SPAN {} = {:.2} m", i + 1, self.span_length),
                TextAlign::Center,
            );
        }
        drawing.dimension_h(
            Point::new(0.0, label_y + 2.5 * text_h),
            Point::new(self.bridge_length, label_y + 2.5 * text_h),
            format!("{:.3} m", self.bridge_length),
            text_h,
        );
        drawing.text_aligned(
            Point::new(self.bridge_length / 2.0, label_y + 5.0 * text_h),
            text_h * 1.5,
            "GENERAL ARRANGEMENT - ELEVATION",
            TextAlign::Center,
        );
        drawing.text(
            Point::new(right + text_h, self.road_top_level),
            text_h,
            format!("RTL {:.3}", self.road_top_level),
        );
        drawing.text(
            Point::new(right + text_h, self.soffit_level - text_h),
            text_h,
            format!("SOFFIT {:.3}", self.soffit_level),
        );

        let design = Design::new(drawing)
            .summary("Total length", self.bridge_length, 3, "m")
            .summary("Number of spans", self.num_spans as f64, 0, "")
            .summary("Number of piers", self.num_spans.saturating_sub(1) as f64, 0, "")
            .summary("Deck depth", self.deck_depth(), 3, "m")
            .summary("Vertical clearance above datum", self.soffit_level - self.datum, 3, "m")
            .summary("Pier height", self.pier_height(), 3, "m")
            .summary("Pier base width", self.pier_base_width(), 3, "m")
            .summary("Skew span", self.span_length * self.skew_factor(), 3, "m")
            .summary("Skew carriageway width", self.carriageway_width * self.skew_factor(), 3, "m")
            .check_min("Footing width vs pier base", self.footing_width, self.pier_base_width(), 2)
            .check_max("Span / deck depth", self.span_length / self.deck_depth(), 20.0, 1);

        Ok(design)
    }

    /// Datum line with chainage ticks below and a level scale on the left.
    fn draw_datum(&self, drawing: &mut Drawing, left: f64, right: f64, text_h: f64) {
        drawing.line(Layer::Grid, Point::new(left, self.datum), Point::new(right, self.datum));
        drawing.text(
            Point::new(left, self.datum - 4.0 * text_h),
            text_h,
            format!("DATUM {:.3}", self.datum),
        );

        for i in 0..self.chainage_ticks() {
            let x = i as f64 * self.chainage_interval;
            drawing
                .line(Layer::Grid, Point::new(x, self.datum), Point::new(x, self.datum - text_h))
                .text_aligned(
                    Point::new(x, self.datum - 2.5 * text_h),
                    text_h,
                    format!("{:.1}", x),
                    TextAlign::Center,
                );
        }

        let top = self.level_top();
        for i in 0..self.level_ticks() {
            let y = self.datum + i as f64 * self.level_interval;
            drawing
                .line(Layer::Grid, Point::new(left, y), Point::new(left + text_h, y))
                .text_aligned(
                    Point::new(left - text_h * 0.5, y),
                    text_h * 0.8,
                    format!("{:.3}", y),
                    TextAlign::Right,
                );
        }
        drawing.line(Layer::Grid, Point::new(left, self.datum), Point::new(left, top));
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = BridgeInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ModuleParameterState, ParamValue};

    fn defaults() -> BridgeInput {
        let state = ModuleParameterState::new();
        BridgeInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_default_arrangement_is_valid() {
        let input = defaults();
        assert!(input.validate().is_ok());
        assert!((input.deck_depth() - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_soffit_above_road_rejected() {
        let mut input = defaults();
        input.soffit_level = 111.5;
        let err = input.validate().unwrap_err();
        assert!(matches!(err, CanvasError::InvalidParameter { ref field, .. } if field == "road_top_level"));
    }

    #[test]
    fn test_span_arrangement_must_match_length() {
        let mut input = defaults();
        input.num_spans = 3;
        assert!(input.validate().is_err());
        input.bridge_length = 32.4;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_pier_count_and_geometry() {
        let design = defaults().design().unwrap();
        assert_eq!(design.value("Number of piers"), Some(3.0));
        // 109.4 - 101.0 = 8.4 m shaft, base = 1.2 + 2 * 8.4 / 10
        assert!((design.value("Pier base width").unwrap() - 2.88).abs() < 1e-9);
        assert!(design.passes());
    }

    #[test]
    fn test_skew_widens_carriageway() {
        let mut input = defaults();
        input.skew_deg = 60.0;
        let design = input.design().unwrap();
        assert!((design.value("Skew carriageway width").unwrap() - 22.2).abs() < 1e-6);
    }

    #[test]
    fn test_tick_counts_are_capped() {
        let mut input = defaults();
        assert_eq!(input.chainage_ticks(), 5);
        // 100.0 up to 111.21 at 1 m
        assert_eq!(input.level_ticks(), 13);

        input.level_interval = 0.1;
        assert!(input.validate().is_ok());

        input.datum = 0.0;
        input.footing_level = 1.0;
        input.footing_depth = 1.0;
        let err = input.validate().unwrap_err();
        assert!(matches!(err, CanvasError::InvalidParameter { ref field, .. } if field == "level_interval"));

        let mut input = defaults();
        input.num_spans = 50;
        input.span_length = 20.0;
        input.bridge_length = 1000.0;
        input.chainage_interval = 1.0;
        let err = input.validate().unwrap_err();
        assert!(matches!(err, CanvasError::InvalidParameter { ref field, .. } if field == "chainage_interval"));
    }

    #[test]
    fn test_generate_reads_entered_values() {
        let mut state = ModuleParameterState::new();
        state.insert("num_spans".into(), ParamValue::Number(2.0));
        state.insert("span_length".into(), ParamValue::Number(21.6));
        let design = generate(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap();
        assert_eq!(design.value("Number of piers"), Some(1.0));
    }
}
