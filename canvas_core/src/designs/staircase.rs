//! # Staircase
//!
//! One flight of a dog-legged stair spanning longitudinally between the
//! support beam at its foot and the landing edge. The waist slab is sized
//! at clear length / 20 rounded up to the next 10 mm, never less than
//! 150 mm.
//!
//! Loads per metre width: the going carries the inclined waist, the step
//! triangles, live load and finishes; the landing carries its slab, live
//! load and finishes. The maximum moment is found where the shear changes
//! sign. Main bars are 12 mm or as entered at a spacing rounded down to
//! 10 mm and held between 100 and 300 mm; distribution bars are 8 mm at
//! 0.12 % of the gross section.

use serde::{Deserialize, Serialize};

use super::{
    bar_area, grade_strength, required_steel, span_depth_modification, Design, CONCRETE_GRADES, STEEL_GRADES,
};
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "staircase";

const MIN_WAIST: f64 = 150.0;
const DIST_BAR_DIA: f64 = 8.0;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("clear_length", "Clear length", "mm", 3600.0, 2000.0, 8000.0),
    ParameterSpec::number("width", "Width of stair", "mm", 1200.0, 900.0, 3000.0),
    ParameterSpec::number("beam_width", "Support beam width", "mm", 300.0, 200.0, 500.0),
    ParameterSpec::integer("num_risers", "Risers per flight", "", 9, 3, 16),
    ParameterSpec::number("riser_height", "Riser height", "mm", 175.0, 150.0, 200.0),
    ParameterSpec::number("tread_width", "Tread width", "mm", 275.0, 250.0, 350.0),
    ParameterSpec::number("live_load", "Live load", "kN/m²", 4.0, 2.0, 10.0),
    ParameterSpec::number("finish_load", "Finishes", "kN/m²", 1.0, 0.5, 3.0),
    ParameterSpec::number("main_bar_dia", "Main bar diameter", "mm", 12.0, 8.0, 20.0),
    ParameterSpec::number("cover", "Clear cover", "mm", 20.0, 15.0, 40.0),
    ParameterSpec::choice("concrete_grade", "Concrete grade", CONCRETE_GRADES, "M25"),
    ParameterSpec::choice("steel_grade", "Steel grade", STEEL_GRADES, "Fe415"),
    ParameterSpec::number("scale", "Drawing scale 1:", "", 50.0, 20.0, 100.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaircaseInput {
    pub clear_length: f64,
    pub width: f64,
    pub beam_width: f64,
    pub num_risers: usize,
    pub riser_height: f64,
    pub tread_width: f64,
    pub live_load: f64,
    pub finish_load: f64,
    pub main_bar_dia: f64,
    pub cover: f64,
    pub fck: f64,
    pub fy: f64,
    pub scale: f64,
}

/// Results of the flexural design per metre width
#[derive(Debug, Clone, PartialEq)]
pub struct FlightDesign {
    /// mm
    pub waist: f64,
    /// mm
    pub effective_depth: f64,
    /// kN/m² on plan
    pub going_load: f64,
    /// kN/m²
    pub landing_load: f64,
    /// Reaction at the foot of the flight, kN/m
    pub reaction: f64,
    /// kN·m/m
    pub max_moment: f64,
    /// mm²/m
    pub steel_required: f64,
    /// mm
    pub main_spacing: f64,
    /// mm
    pub dist_spacing: f64,
}

impl StaircaseInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(StaircaseInput {
            clear_length: p.number("clear_length")?,
            width: p.number("width")?,
            beam_width: p.number("beam_width")?,
            num_risers: p.count("num_risers")?,
            riser_height: p.number("riser_height")?,
            tread_width: p.number("tread_width")?,
            live_load: p.number("live_load")?,
            finish_load: p.number("finish_load")?,
            main_bar_dia: p.number("main_bar_dia")?,
            cover: p.number("cover")?,
            fck: grade_strength(MODULE, "concrete_grade", &p.choice("concrete_grade")?)?,
            fy: grade_strength(MODULE, "steel_grade", &p.choice("steel_grade")?)?,
            scale: p.number("scale")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.going_length() >= self.clear_length {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "num_risers",
                self.num_risers.to_string(),
                format!(
                    "Flight going of {:.0} mm does not fit in the clear length of {:.0} mm",
                    self.going_length(),
                    self.clear_length
                ),
            ));
        }
        Ok(())
    }

    pub fn treads(&self) -> usize {
        self.num_risers.saturating_sub(1)
    }

    /// Horizontal length loaded as going, including half the support beam, mm
    pub fn going_length(&self) -> f64 {
        self.treads() as f64 * self.tread_width + self.tread_width + self.beam_width / 2.0
    }

    pub fn rise(&self) -> f64 {
        self.num_risers as f64 * self.riser_height
    }

    pub fn waist(&self) -> f64 {
        ((self.clear_length / 20.0 / 10.0).ceil() * 10.0).max(MIN_WAIST)
    }

    /// 2R + T, mm
    pub fn step_comfort(&self) -> f64 {
        2.0 * self.riser_height + self.tread_width
    }

    /// Slope length of one step over its tread
    fn slope_factor(&self) -> f64 {
        self.riser_height.hypot(self.tread_width) / self.tread_width
    }

    pub fn flight(&self) -> CanvasResult<FlightDesign> {
        let waist = self.waist();
        let d = waist - self.cover - self.main_bar_dia / 2.0;
        let (t, r) = (waist / 1000.0, self.riser_height / 1000.0);

        let going_load = 1.5 * (25.0 * t * self.slope_factor() + 25.0 * r / 2.0 + self.live_load + self.finish_load);
        let landing_load = 1.5 * (25.0 * t + self.live_load + self.finish_load);

        let lc = self.clear_length / 1000.0;
        let lg = self.going_length() / 1000.0;
        let ll = lc - lg;
        let reaction = (going_load * lg * (lg / 2.0 + ll) + landing_load * ll * ll / 2.0) / lc;

        // Zero shear on the going, or past it on the landing
        let x = reaction / going_load;
        let max_moment = if x <= lg {
            reaction * x - going_load * x * x / 2.0
        } else {
            let x = lg + (reaction - going_load * lg) / landing_load;
            reaction * x - going_load * lg * (x - lg / 2.0) - landing_load * (x - lg).powi(2) / 2.0
        };

        let steel_required = required_steel(max_moment * 1e6, self.fck, self.fy, 1000.0, d)
            .ok_or_else(|| CanvasError::render_failed(MODULE, "waist slab is too thin for the flight moment"))?
            .max(0.0012 * 1000.0 * waist);

        let main_spacing = round_spacing(bar_area(self.main_bar_dia) * 1000.0 / steel_required, 100.0, 300.0);
        let dist_required = 0.0012 * 1000.0 * waist;
        let dist_spacing = round_spacing(bar_area(DIST_BAR_DIA) * 1000.0 / dist_required, 150.0, 300.0);

        Ok(FlightDesign {
            waist,
            effective_depth: d,
            going_load,
            landing_load,
            reaction,
            max_moment,
            steel_required,
            main_spacing,
            dist_spacing,
        })
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let flight = self.flight()?;
        let d = flight.effective_depth;
        let provided = bar_area(self.main_bar_dia) * 1000.0 / flight.main_spacing;
        let factor = span_depth_modification(self.fy, flight.steel_required, provided, 1000.0, d);

        Ok(Design::new(self.draw(&flight))
            .summary("Waist slab thickness", flight.waist, 0, "mm")
            .summary("Effective depth", d, 1, "mm")
            .summary("Factored load on going", flight.going_load, 3, "kN/m²")
            .summary("Factored load on landing", flight.landing_load, 3, "kN/m²")
            .summary("Reaction", flight.reaction, 2, "kN/m")
            .summary("Maximum moment", flight.max_moment, 2, "kN·m/m")
            .summary("Main steel required", flight.steel_required, 1, "mm²/m")
            .summary("Main bar spacing", flight.main_spacing, 0, "mm")
            .summary("Distribution bar spacing", flight.dist_spacing, 0, "mm")
            .summary("Flight rise", self.rise(), 0, "mm")
            .check_min("Main steel", provided, flight.steel_required, 1)
            .check_max("Span / effective depth", self.clear_length / d, 20.0 * factor, 2)
            .check_min("2R + T (min)", self.step_comfort(), 550.0, 0)
            .check_max("2R + T (max)", self.step_comfort(), 700.0, 0))
    }

    fn draw(&self, flight: &FlightDesign) -> Drawing {
        let mut drawing = Drawing::new("Staircase", DrawingUnits::Millimetres);
        let text_h = 60.0;
        let (rs, td, lc) = (self.riser_height, self.tread_width, self.clear_length);
        let height = self.rise();
        let going = self.treads() as f64 * td;
        let tan = rs / td;
        let cos = td / rs.hypot(td);
        let sloped_waist = flight.waist / cos;

        // Concrete outline: steps up, landing, then back along the soffit
        let mut outline = vec![Point::new(0.0, 0.0)];
        for i in 0..self.num_risers {
            let y = (i + 1) as f64 * rs;
            let x = i as f64 * td;
            outline.push(Point::new(x, y));
            if i + 1 < self.num_risers {
                outline.push(Point::new(x + td, y));
            }
        }
        let landing_soffit = height - flight.waist;
        outline.extend([
            Point::new(lc, height),
            Point::new(lc, landing_soffit),
            Point::new((landing_soffit - rs + sloped_waist) / tan, landing_soffit),
            Point::new(0.0, rs - sloped_waist),
        ]);
        drawing.polyline(Layer::Outline, outline, true);

        // Support beams at the foot and at the landing edge
        drawing
            .rect(Layer::Outline, Point::new(-self.beam_width, rs - sloped_waist - 300.0), Point::new(0.0, rs - sloped_waist))
            .rect(Layer::Outline, Point::new(lc, landing_soffit - 300.0), Point::new(lc + self.beam_width, height));

        // Main bars along the soffit, continuing into the landing
        let c = self.cover + self.main_bar_dia / 2.0;
        let knee = Point::new(
            (landing_soffit + c - rs + sloped_waist - c / cos) / tan,
            landing_soffit + c,
        );
        drawing.polyline(
            Layer::Reinforcement,
            vec![
                Point::new(self.cover, rs - sloped_waist + c / cos + self.cover * tan),
                knee,
                Point::new(lc - self.cover, landing_soffit + c),
            ],
            false,
        );

        // Distribution bars sitting on the main bars
        let lift = (self.main_bar_dia + DIST_BAR_DIA) / 2.0;
        let step = flight.dist_spacing * cos;
        let mut x = self.cover + step / 2.0;
        while x < knee.x {
            let y = rs - sloped_waist + c / cos + x * tan + lift / cos;
            drawing.circle(Layer::Reinforcement, Point::new(x, y), DIST_BAR_DIA / 2.0);
            x += step;
        }
        let mut x = knee.x + flight.dist_spacing;
        while x < lc - self.cover {
            drawing.circle(
                Layer::Reinforcement,
                Point::new(x, landing_soffit + c + lift),
                DIST_BAR_DIA / 2.0,
            );
            x += flight.dist_spacing;
        }

        let base = rs - sloped_waist - 450.0;
        drawing
            .dimension_h(Point::new(0.0, base), Point::new(going, base), format!("GOING {:.0}", going), text_h)
            .dimension_h(
                Point::new(0.0, base - 250.0),
                Point::new(lc, base - 250.0),
                format!("CLEAR {:.0}", lc),
                text_h,
            )
            .dimension_v(Point::new(lc + self.beam_width + 150.0, 0.0), Point::new(lc + self.beam_width + 150.0, height), format!("{:.0}", height), text_h);

        let notes = [
            format!("WAIST {:.0} THICK", flight.waist),
            format!("MAIN {:.0} @ {:.0} c/c", self.main_bar_dia, flight.main_spacing),
            format!("DIST {:.0} @ {:.0} c/c", DIST_BAR_DIA, flight.dist_spacing),
            format!("{} RISERS {:.0}, TREADS {:.0}", self.num_risers, rs, td),
            format!("WIDTH {:.0}, M{:.0} / Fe{:.0}", self.width, self.fck, self.fy),
        ];
        for (i, note) in notes.iter().enumerate() {
            drawing.text(Point::new(lc * 0.55, height * 0.45 - i as f64 * 1.6 * text_h), text_h, note.clone());
        }
        drawing
            .text_aligned(
                Point::new(lc / 2.0, height + 300.0),
                text_h * 1.5,
                "STAIRCASE - FLIGHT SECTION",
                TextAlign::Center,
            )
            .text_aligned(
                Point::new(lc / 2.0, height + 180.0),
                text_h,
                format!("SCALE 1:{:.0}", self.scale),
                TextAlign::Center,
            );

        drawing
    }
}

/// Spacing rounded down to 10 mm and held within `[min, max]`
fn round_spacing(spacing: f64, min: f64, max: f64) -> f64 {
    ((spacing / 10.0).floor() * 10.0).clamp(min, max)
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = StaircaseInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> StaircaseInput {
        let state = ModuleParameterState::new();
        StaircaseInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_waist_rounding() {
        let mut input = defaults();
        assert_eq!(input.waist(), 180.0);
        input.clear_length = 3610.0;
        assert_eq!(input.waist(), 190.0);
        input.clear_length = 2000.0;
        assert_eq!(input.waist(), MIN_WAIST);
    }

    #[test]
    fn test_flight_forces() {
        let flight = defaults().flight().unwrap();
        assert!((flight.going_load - 18.782).abs() < 0.01, "{}", flight.going_load);
        assert!((flight.landing_load - 14.25).abs() < 1e-9);
        assert!((flight.reaction - 33.21).abs() < 0.05, "{}", flight.reaction);
        assert!((flight.max_moment - 29.36).abs() < 0.1, "{}", flight.max_moment);
    }

    #[test]
    fn test_bar_spacing() {
        let flight = defaults().flight().unwrap();
        assert_eq!(flight.main_spacing, 200.0);
        assert_eq!(flight.dist_spacing, 230.0);
    }

    #[test]
    fn test_round_spacing_limits() {
        assert_eq!(round_spacing(57.0, 100.0, 300.0), 100.0);
        assert_eq!(round_spacing(418.0, 100.0, 300.0), 300.0);
        assert_eq!(round_spacing(187.6, 100.0, 300.0), 180.0);
    }

    #[test]
    fn test_defaults_pass() {
        let design = defaults().design().unwrap();
        assert!(design.passes(), "{:?}", design.checks);
        assert_eq!(design.value("Waist slab thickness"), Some(180.0));
    }

    #[test]
    fn test_flight_must_fit() {
        let mut input = defaults();
        input.num_risers = 16;
        let err = input.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_step_outline() {
        let input = defaults();
        let flight = input.flight().unwrap();
        let drawing = input.draw(&flight);
        match &drawing.entities[0] {
            crate::drawing::Entity::Polyline { points, closed, .. } => {
                assert!(*closed);
                // origin, 9 risers, 8 treads, 4 closing points
                assert_eq!(points.len(), 1 + 9 + 8 + 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
