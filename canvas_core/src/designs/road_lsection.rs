//! # Road Longitudinal Section
//!
//! Ground and design profiles along the road centreline. Ground levels are
//! generated from a starting level and a total rise (optionally with a gentle
//! undulation). The design line follows the ground at a formation offset but
//! is limited to the maximum gradient between consecutive stations.
//!
//! Levels are plotted with a vertical exaggeration above a datum 5 m below
//! the minimum level, with station and level bands under the profile.

use serde::{Deserialize, Serialize};

use super::Design;
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "road_lsection";

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::number("road_length", "Road length", "m", 1000.0, 50.0, 20000.0),
    ParameterSpec::number("interval", "Station interval", "m", 20.0, 5.0, 500.0),
    ParameterSpec::number("start_ground_level", "Ground level at start", "m", 88.0, 0.0, 9000.0),
    ParameterSpec::number("ground_rise", "Ground rise over length", "m", 2.0, -200.0, 200.0),
    ParameterSpec::flag("undulating", "Undulating ground", false),
    ParameterSpec::number("min_level", "Minimum level", "m", 85.0, 0.0, 9000.0),
    ParameterSpec::number("max_level", "Maximum level", "m", 100.0, 0.0, 9000.0),
    ParameterSpec::number("formation_offset", "Formation above ground", "m", 0.5, 0.0, 5.0),
    ParameterSpec::number("max_gradient", "Maximum gradient", "%", 6.0, 0.5, 15.0),
    ParameterSpec::choice("design_speed", "Design speed (km/h)", &["30", "40", "50", "60", "80", "100"], "60"),
    ParameterSpec::choice("road_type", "Road type", &["NH", "SH", "MDR", "ODR", "VR"], "MDR"),
    ParameterSpec::number("vertical_scale", "Vertical exaggeration", "", 10.0, 1.0, 50.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LsectionInput {
    pub road_length: f64,
    pub interval: f64,
    pub start_ground_level: f64,
    pub ground_rise: f64,
    pub undulating: bool,
    pub min_level: f64,
    pub max_level: f64,
    pub formation_offset: f64,
    pub max_gradient: f64,
    pub design_speed: String,
    pub road_type: String,
    pub vertical_scale: f64,
}

/// One surveyed station with its ground and design levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub chainage: f64,
    pub ground: f64,
    pub design: f64,
}

impl Station {
    /// Positive for fill, negative for cut
    pub fn depth(&self) -> f64 {
        self.design - self.ground
    }
}

impl LsectionInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(LsectionInput {
            road_length: p.number("road_length")?,
            interval: p.number("interval")?,
            start_ground_level: p.number("start_ground_level")?,
            ground_rise: p.number("ground_rise")?,
            undulating: p.flag("undulating")?,
            min_level: p.number("min_level")?,
            max_level: p.number("max_level")?,
            formation_offset: p.number("formation_offset")?,
            max_gradient: p.number("max_gradient")?,
            design_speed: p.choice("design_speed")?,
            road_type: p.choice("road_type")?,
            vertical_scale: p.number("vertical_scale")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.max_level <= self.min_level {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "max_level",
                self.max_level.to_string(),
                "Maximum level must be above the minimum level",
            ));
        }
        if self.interval >= self.road_length {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "interval",
                self.interval.to_string(),
                "Station interval must be shorter than the road",
            ));
        }
        if self.road_length / self.interval > 2000.0 {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "interval",
                self.interval.to_string(),
                "Too many stations; increase the interval",
            ));
        }
        if self.start_ground_level < self.min_level || self.start_ground_level > self.max_level {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "start_ground_level",
                self.start_ground_level.to_string(),
                "Starting ground level must lie between the minimum and maximum levels",
            ));
        }
        Ok(())
    }

    fn ground_level(&self, chainage: f64) -> f64 {
        let trend = self.start_ground_level + self.ground_rise * chainage / self.road_length;
        if self.undulating {
            trend + (chainage / 100.0).sin()
        } else {
            trend
        }
    }

    /// Stations from 0 to the road length; the last one is added even when
    /// the length is not a multiple of the interval.
    pub fn stations(&self) -> Vec<Station> {
        let mut chainages: Vec<f64> = (0..)
            .map(|i| i as f64 * self.interval)
            .take_while(|c| *c < self.road_length - 1e-9)
            .collect();
        chainages.push(self.road_length);

        let max_step = self.max_gradient / 100.0;
        let mut stations: Vec<Station> = Vec::with_capacity(chainages.len());
        for chainage in chainages {
            let ground = self.ground_level(chainage);
            let target = ground + self.formation_offset;
            let design = match stations.last() {
                None => target,
                Some(prev) => {
                    let reach = max_step * (chainage - prev.chainage);
                    target.clamp(prev.design - reach, prev.design + reach)
                }
            };
            stations.push(Station { chainage, ground, design });
        }
        stations
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let stations = self.stations();
        let datum = self.min_level - 5.0;
        let v = self.vertical_scale;
        let y_of = |level: f64| (level - datum) * v;
        let text_h = (self.road_length / 150.0).clamp(1.0, 50.0);
        let top = y_of(self.max_level);

        let mut drawing = Drawing::new(
            format!("Longitudinal Section (V x{:.0})", v),
            DrawingUnits::Metres,
        );

        // Level grid
        let level_step = if self.max_level - datum > 40.0 { 5.0 } else { 1.0 };
        let mut level = datum;
        while level <= self.max_level + 1e-9 {
            drawing
                .line(Layer::Grid, Point::new(0.0, y_of(level)), Point::new(self.road_length, y_of(level)))
                .text_aligned(
                    Point::new(-text_h * 0.5, y_of(level)),
                    text_h * 0.8,
                    format!("{:.1}", level),
                    TextAlign::Right,
                );
            level += level_step;
        }

        let label_every = ((stations.len() as f64 / 10.0).ceil() as usize).max(1);
        for (i, s) in stations.iter().enumerate() {
            drawing.line(Layer::Grid, Point::new(s.chainage, 0.0), Point::new(s.chainage, top));
            if (s.depth()).abs() > 1e-6 {
                drawing.line(
                    Layer::Fill,
                    Point::new(s.chainage, y_of(s.ground)),
                    Point::new(s.chainage, y_of(s.design)),
                );
            }
            if i % label_every == 0 || i == stations.len() - 1 {
                drawing
                    .text_aligned(Point::new(s.chainage, -2.0 * text_h), text_h, format!("{:.0}", s.chainage), TextAlign::Center)
                    .text_aligned(Point::new(s.chainage, -3.8 * text_h), text_h * 0.8, format!("{:.2}", s.ground), TextAlign::Center)
                    .text_aligned(Point::new(s.chainage, -5.4 * text_h), text_h * 0.8, format!("{:.2}", s.design), TextAlign::Center);
            }
        }

        drawing
            .polyline(
                Layer::Ground,
                stations.iter().map(|s| Point::new(s.chainage, y_of(s.ground))).collect(),
                false,
            )
            .polyline(
                Layer::Profile,
                stations.iter().map(|s| Point::new(s.chainage, y_of(s.design))).collect(),
                false,
            )
            .text(Point::new(-12.0 * text_h, -2.0 * text_h), text_h, "CHAINAGE")
            .text(Point::new(-12.0 * text_h, -3.8 * text_h), text_h * 0.8, "GROUND")
            .text(Point::new(-12.0 * text_h, -5.4 * text_h), text_h * 0.8, "FORMATION")
            .text_aligned(
                Point::new(self.road_length / 2.0, top + 2.0 * text_h),
                text_h * 1.4,
                format!("LONGITUDINAL SECTION - {} ({} km/h)", self.road_type, self.design_speed),
                TextAlign::Center,
            );

        let mut fill_area = 0.0;
        let mut cut_area = 0.0;
        for pair in stations.windows(2) {
            let len = pair[1].chainage - pair[0].chainage;
            let avg = (pair[0].depth() + pair[1].depth()) / 2.0;
            if avg > 0.0 {
                fill_area += avg * len;
            } else {
                cut_area -= avg * len;
            }
        }
        let steepest = stations
            .windows(2)
            .map(|w| 100.0 * (w[1].design - w[0].design).abs() / (w[1].chainage - w[0].chainage))
            .fold(0.0_f64, f64::max);
        let lowest = stations.iter().map(|s| s.design).fold(f64::INFINITY, f64::min);
        let max_fill = stations.iter().map(|s| s.depth()).fold(0.0_f64, f64::max);
        let max_cut = stations.iter().map(|s| -s.depth()).fold(0.0_f64, f64::max);

        Ok(Design::new(drawing)
            .summary("Stations", stations.len() as f64, 0, "")
            .summary("Steepest design gradient", steepest, 2, "%")
            .summary("Maximum fill", max_fill, 3, "m")
            .summary("Maximum cut", max_cut, 3, "m")
            .summary("Fill area (profile)", fill_area, 1, "m²")
            .summary("Cut area (profile)", cut_area, 1, "m²")
            .check_max("Design gradient", steepest, self.max_gradient, 2)
            .check_min("Lowest formation level", lowest, self.min_level, 3))
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = LsectionInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModuleParameterState;

    fn defaults() -> LsectionInput {
        let state = ModuleParameterState::new();
        LsectionInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_station_count_includes_end() {
        let mut input = defaults();
        assert_eq!(input.stations().len(), 51);
        input.road_length = 1010.0;
        let stations = input.stations();
        assert_eq!(stations.len(), 52);
        assert_eq!(stations.last().unwrap().chainage, 1010.0);
    }

    #[test]
    fn test_design_respects_gradient_limit() {
        let mut input = defaults();
        input.ground_rise = 150.0;
        input.max_level = 300.0;
        input.max_gradient = 4.0;
        let stations = input.stations();
        for w in stations.windows(2) {
            let g = (w[1].design - w[0].design).abs() / (w[1].chainage - w[0].chainage);
            assert!(g <= 0.04 + 1e-9);
        }
        // Steep ground forces cut at the far end
        assert!(stations.last().unwrap().depth() < 0.0);
    }

    #[test]
    fn test_gentle_ground_is_all_fill() {
        let design = defaults().design().unwrap();
        assert!((design.value("Maximum fill").unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(design.value("Maximum cut"), Some(0.0));
        assert!(design.passes());
    }

    #[test]
    fn test_level_range_validated() {
        let mut input = defaults();
        input.max_level = 80.0;
        assert!(input.validate().is_err());
    }
}
