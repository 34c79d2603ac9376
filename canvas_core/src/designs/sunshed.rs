//! # Sunshade (Chhajja)
//!
//! Section through a lintel beam carrying a cantilevered sunshade slab.
//! The slab top falls towards the free edge; the soffit is level. Main bars
//! sit at the top of the cantilever and anchor down into the beam;
//! distribution bars run under them.
//!
//! Design per metre run, limit state:
//!
//! - factored load `1.5 x (self weight + finishes + live)` in kN/m²
//! - `M = w L² / 2`, steel from the singly reinforced section at the support
//! - minimum steel 0.12 % of the gross section
//! - main bar spacing not more than 3d or 300 mm
//! - projection / effective depth not more than 7 (cantilever) times the
//!   tension steel modification factor

use serde::{Deserialize, Serialize};

use super::{
    bar_area, grade_strength, required_steel, span_depth_modification, spread, Design, CONCRETE_GRADES,
    STEEL_GRADES,
};
use crate::drawing::{Drawing, DrawingUnits, Layer, Point, TextAlign};
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParameterSet, ParameterSpec};

const MODULE: &str = "sunshed";

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::text("mark", "Sunshade mark", "01", 8),
    ParameterSpec::number("web_width", "Beam width", "mm", 300.0, 150.0, 600.0),
    ParameterSpec::number("total_depth", "Beam depth", "mm", 450.0, 200.0, 1200.0),
    ParameterSpec::number("projection", "Projection", "mm", 1000.0, 300.0, 2000.0),
    ParameterSpec::number("support_thickness", "Thickness at support", "mm", 150.0, 75.0, 300.0),
    ParameterSpec::number("edge_thickness", "Thickness at edge", "mm", 100.0, 50.0, 200.0),
    ParameterSpec::number("cover", "Clear cover", "mm", 20.0, 15.0, 40.0),
    ParameterSpec::number("main_bar_dia", "Main bar diameter", "mm", 10.0, 6.0, 16.0),
    ParameterSpec::number("main_bar_spacing", "Main bar spacing", "mm", 150.0, 75.0, 300.0),
    ParameterSpec::number("dist_bar_dia", "Distribution bar diameter", "mm", 8.0, 6.0, 12.0),
    ParameterSpec::number("dist_bar_spacing", "Distribution bar spacing", "mm", 150.0, 75.0, 300.0),
    ParameterSpec::integer("beam_bottom_bars", "Beam bottom bars", "", 3, 2, 6),
    ParameterSpec::integer("beam_top_bars", "Beam top bars", "", 2, 2, 6),
    ParameterSpec::number("beam_bar_dia", "Beam bar diameter", "mm", 12.0, 8.0, 25.0),
    ParameterSpec::number("stirrup_dia", "Beam stirrup diameter", "mm", 8.0, 6.0, 12.0),
    ParameterSpec::number("live_load", "Live load", "kN/m²", 0.75, 0.0, 5.0),
    ParameterSpec::number("finish_load", "Finishes", "kN/m²", 0.5, 0.0, 3.0),
    ParameterSpec::choice("concrete_grade", "Concrete grade", CONCRETE_GRADES, "M20"),
    ParameterSpec::choice("steel_grade", "Steel grade", STEEL_GRADES, "Fe415"),
    ParameterSpec::number("scale", "Drawing scale 1:", "", 25.0, 1.0, 200.0),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunshedInput {
    pub mark: String,
    pub web_width: f64,
    pub total_depth: f64,
    pub projection: f64,
    pub support_thickness: f64,
    pub edge_thickness: f64,
    pub cover: f64,
    pub main_bar_dia: f64,
    pub main_bar_spacing: f64,
    pub dist_bar_dia: f64,
    pub dist_bar_spacing: f64,
    pub beam_bottom_bars: usize,
    pub beam_top_bars: usize,
    pub beam_bar_dia: f64,
    pub stirrup_dia: f64,
    pub live_load: f64,
    pub finish_load: f64,
    pub fck: f64,
    pub fy: f64,
    pub scale: f64,
}

impl SunshedInput {
    pub fn from_params(p: &ParameterSet<'_>) -> CanvasResult<Self> {
        Ok(SunshedInput {
            mark: p.text("mark")?,
            web_width: p.number("web_width")?,
            total_depth: p.number("total_depth")?,
            projection: p.number("projection")?,
            support_thickness: p.number("support_thickness")?,
            edge_thickness: p.number("edge_thickness")?,
            cover: p.number("cover")?,
            main_bar_dia: p.number("main_bar_dia")?,
            main_bar_spacing: p.number("main_bar_spacing")?,
            dist_bar_dia: p.number("dist_bar_dia")?,
            dist_bar_spacing: p.number("dist_bar_spacing")?,
            beam_bottom_bars: p.count("beam_bottom_bars")?,
            beam_top_bars: p.count("beam_top_bars")?,
            beam_bar_dia: p.number("beam_bar_dia")?,
            stirrup_dia: p.number("stirrup_dia")?,
            live_load: p.number("live_load")?,
            finish_load: p.number("finish_load")?,
            fck: grade_strength(MODULE, "concrete_grade", &p.choice("concrete_grade")?)?,
            fy: grade_strength(MODULE, "steel_grade", &p.choice("steel_grade")?)?,
            scale: p.number("scale")?,
        })
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.edge_thickness > self.support_thickness {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "edge_thickness",
                self.edge_thickness.to_string(),
                "Edge cannot be thicker than the slab at the support",
            ));
        }
        if self.support_thickness >= self.total_depth {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "support_thickness",
                self.support_thickness.to_string(),
                "Sunshade must be thinner than the supporting beam",
            ));
        }
        if 2.0 * self.cover + self.main_bar_dia + self.dist_bar_dia >= self.edge_thickness {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "edge_thickness",
                self.edge_thickness.to_string(),
                "Edge is too thin for cover and bars",
            ));
        }
        let clear = self.web_width - 2.0 * (self.cover + self.stirrup_dia);
        if (2 * self.beam_bottom_bars - 1) as f64 * self.beam_bar_dia > clear {
            return Err(CanvasError::invalid_parameter(
                MODULE,
                "beam_bottom_bars",
                self.beam_bottom_bars.to_string(),
                "Beam bars do not fit in the web",
            ));
        }
        Ok(())
    }

    /// Effective depth at the support, mm
    pub fn effective_depth(&self) -> f64 {
        self.support_thickness - self.cover - self.main_bar_dia / 2.0
    }

    /// Factored load per m², kN/m²
    pub fn factored_load(&self) -> f64 {
        let self_weight = 25.0 * (self.support_thickness + self.edge_thickness) / 2.0 / 1000.0;
        1.5 * (self_weight + self.finish_load + self.live_load)
    }

    /// Cantilever moment per metre run, kN·m/m
    pub fn moment(&self) -> f64 {
        let l = self.projection / 1000.0;
        self.factored_load() * l * l / 2.0
    }

    pub fn steel_provided(&self) -> f64 {
        bar_area(self.main_bar_dia) * 1000.0 / self.main_bar_spacing
    }

    /// Modification factor on the span/depth ratio for the steel provided
    pub fn modification_factor(&self, ast_required: f64) -> f64 {
        span_depth_modification(self.fy, ast_required, self.steel_provided(), 1000.0, self.effective_depth())
    }

    pub fn design(&self) -> CanvasResult<Design> {
        let d = self.effective_depth();
        let ast_required = required_steel(self.moment() * 1e6, self.fck, self.fy, 1000.0, d).ok_or_else(|| {
            CanvasError::render_failed(MODULE, "sunshade is too thin for its projection at the support")
        })?;
        let ast_min = 0.0012 * 1000.0 * self.support_thickness;
        let dist_provided = bar_area(self.dist_bar_dia) * 1000.0 / self.dist_bar_spacing;
        let dist_min = 0.0012 * 1000.0 * (self.support_thickness + self.edge_thickness) / 2.0;

        Ok(Design::new(self.draw())
            .summary("Factored load", self.factored_load(), 3, "kN/m²")
            .summary("Cantilever moment", self.moment(), 3, "kN·m/m")
            .summary("Effective depth", d, 1, "mm")
            .summary("Main steel required", ast_required.max(ast_min), 1, "mm²/m")
            .summary("Main steel provided", self.steel_provided(), 1, "mm²/m")
            .summary("Distribution steel provided", dist_provided, 1, "mm²/m")
            .check_min("Main steel", self.steel_provided(), ast_required.max(ast_min), 1)
            .check_min("Distribution steel", dist_provided, dist_min, 1)
            .check_max("Main bar spacing", self.main_bar_spacing, (3.0 * d).min(300.0), 0)
            .check_max(
                "Projection / effective depth",
                self.projection / d,
                7.0 * self.modification_factor(ast_required.max(ast_min)),
                2,
            ))
    }

    fn draw(&self) -> Drawing {
        let mut drawing = Drawing::new(format!("Sunshade S{}", self.mark), DrawingUnits::Millimetres);
        let text_h = 25.0;
        let (b, h, p) = (self.web_width, self.total_depth, self.projection);
        let drop = self.support_thickness - self.edge_thickness;
        let soffit = -self.support_thickness;

        // Beam with the sunshade on its outer face; beam top at y = 0
        drawing
            .rect(Layer::Outline, Point::new(-b, -h), Point::new(0.0, 0.0))
            .polyline(
                Layer::Outline,
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(p, -drop),
                    Point::new(p, soffit),
                    Point::new(0.0, soffit),
                ],
                false,
            );

        // Beam cage
        let t = self.cover + self.stirrup_dia / 2.0;
        drawing.rect(Layer::Reinforcement, Point::new(-b + t, -h + t), Point::new(-t, -t));
        let edge = self.cover + self.stirrup_dia + self.beam_bar_dia / 2.0;
        for x in spread(-b + edge, -edge, self.beam_bottom_bars) {
            drawing.circle(Layer::Reinforcement, Point::new(x, -h + edge), self.beam_bar_dia / 2.0);
        }
        for x in spread(-b + edge, -edge, self.beam_top_bars) {
            drawing.circle(Layer::Reinforcement, Point::new(x, -edge), self.beam_bar_dia / 2.0);
        }

        // Main bar: anchored down the far face of the beam, along the top, bent at the tip
        let c = self.cover + self.main_bar_dia / 2.0;
        let anchor_x = -b + self.cover + self.stirrup_dia + self.main_bar_dia;
        drawing.polyline(
            Layer::Reinforcement,
            vec![
                Point::new(anchor_x, -h / 2.0),
                Point::new(anchor_x, -c),
                Point::new(0.0, -c),
                Point::new(p - self.cover, -drop - c),
                Point::new(p - self.cover, soffit + self.cover),
            ],
            false,
        );

        // Distribution bars under the main bar
        let first = self.cover + self.dist_bar_dia;
        let last = p - self.cover - self.dist_bar_dia;
        let count = ((last - first) / self.dist_bar_spacing).floor() as usize + 1;
        for i in 0..count {
            let x = first + i as f64 * self.dist_bar_spacing;
            let top_at_x = -drop * x / p;
            drawing.circle(
                Layer::Reinforcement,
                Point::new(x, top_at_x - self.cover - self.main_bar_dia - self.dist_bar_dia / 2.0),
                self.dist_bar_dia / 2.0,
            );
        }

        drawing
            .dimension_h(Point::new(0.0, 60.0), Point::new(p, 60.0), format!("{:.0}", p), text_h)
            .dimension_h(Point::new(-b, -h - 60.0), Point::new(0.0, -h - 60.0), format!("{:.0}", b), text_h)
            .dimension_v(Point::new(-b - 60.0, -h), Point::new(-b - 60.0, 0.0), format!("{:.0}", h), text_h)
            .dimension_v(Point::new(p + 40.0, soffit), Point::new(p + 40.0, -drop), format!("{:.0}", self.edge_thickness), text_h);

        let notes = [
            format!("MAIN {:.0} @ {:.0} c/c", self.main_bar_dia, self.main_bar_spacing),
            format!("DIST {:.0} @ {:.0} c/c", self.dist_bar_dia, self.dist_bar_spacing),
            format!(
                "BEAM {}-{:.0} BOT, {}-{:.0} TOP",
                self.beam_bottom_bars, self.beam_bar_dia, self.beam_top_bars, self.beam_bar_dia
            ),
            format!("COVER {:.0}", self.cover),
        ];
        for (i, note) in notes.iter().enumerate() {
            drawing.text(Point::new(40.0, soffit - 120.0 - i as f64 * 1.6 * text_h), text_h, note.clone());
        }
        drawing
            .text_aligned(
                Point::new((p - b) / 2.0, 180.0),
                text_h * 1.5,
                format!("SUNSHADE S{} - SECTION", self.mark),
                TextAlign::Center,
            )
            .text_aligned(
                Point::new((p - b) / 2.0, 130.0),
                text_h,
                format!("SCALE 1:{:.0}", self.scale),
                TextAlign::Center,
            );

        drawing
    }
}

pub fn generate(p: &ParameterSet<'_>) -> CanvasResult<Design> {
    let input = SunshedInput::from_params(p)?;
    input.validate()?;
    input.design()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Entity;
    use crate::params::ModuleParameterState;

    fn defaults() -> SunshedInput {
        let state = ModuleParameterState::new();
        SunshedInput::from_params(&ParameterSet::new(MODULE, PARAMETERS, &state)).unwrap()
    }

    #[test]
    fn test_cantilever_moment() {
        let input = defaults();
        // self weight 3.125, w = 1.5 * 4.375 = 6.5625, M = 6.5625 / 2
        assert!((input.factored_load() - 6.5625).abs() < 1e-9);
        assert!((input.moment() - 3.28125).abs() < 1e-9);
    }

    #[test]
    fn test_defaults_pass() {
        let design = defaults().design().unwrap();
        assert!(design.passes(), "{:?}", design.checks);
    }

    #[test]
    fn test_distribution_bar_count() {
        let input = defaults();
        let design = input.design().unwrap();
        let circles = design
            .drawing
            .entities
            .iter()
            .filter(|e| matches!(e, Entity::Circle { .. }))
            .count();
        // (1000 - 56) / 150 -> 7 bars, plus 3 + 2 beam bars
        assert_eq!(circles, 7 + 5);
    }

    #[test]
    fn test_modification_factor_capped() {
        let input = defaults();
        // lightly stressed steel hits the cap
        assert_eq!(input.modification_factor(180.0), 2.0);
        let fully_stressed = input.modification_factor(input.steel_provided());
        assert!((fully_stressed - 1.309).abs() < 0.01, "{fully_stressed}");
    }

    #[test]
    fn test_reversed_taper_rejected() {
        let mut input = defaults();
        input.edge_thickness = 180.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_mark_in_title() {
        let mut input = defaults();
        input.mark = "S7".into();
        assert_eq!(input.design().unwrap().drawing.title, "Sunshade SS7");
    }
}
