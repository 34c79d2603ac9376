//! # Application Shell
//!
//! The shell owns the navigation state: which module is active and the
//! sessions of modules that have been mounted. Every user action enters
//! through [`Shell::handle`] as a [`ShellEvent`]; the GUI and tests read the
//! result through the pure [`Shell::view`].
//!
//! ## Navigation semantics
//!
//! - A fresh shell selects the configured default module (`bridge`).
//! - Selecting a registered id mounts its session if needed and makes it
//!   active. With [`RetentionPolicy::DiscardOnSwitch`] the session being left
//!   is unmounted.
//! - Selecting an unregistered id is not an error. The selection becomes
//!   [`ActiveSelection::Unrecognized`], the main panel renders empty, a
//!   warning is logged, and the navigation list is untouched.
//! - Module events while nothing is active are ignored.
//!
//! ## Example
//!
//! ```rust
//! use canvas_core::shell::{SelectOutcome, Shell};
//!
//! let mut shell = Shell::default();
//! assert_eq!(shell.active_component().unwrap().id, "bridge");
//!
//! assert!(matches!(shell.select_module("sunshed"), SelectOutcome::Selected(_)));
//! let view = shell.view();
//! assert_eq!(view.panel.unwrap().title, "Sunshed");
//!
//! assert_eq!(shell.select_module("nonexistent_id"), SelectOutcome::Unrecognized);
//! assert!(shell.active_component().is_none());
//! assert!(shell.view().panel.is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::designs::Design;
use crate::errors::{CanvasError, CanvasResult};
use crate::params::{ParamValue, ResolvedParameter};
use crate::project::Project;
use crate::registry::{lookup, ModuleDescriptor, ModuleKind, REGISTRY};
use crate::session::{ModulePhase, ModuleSession};
use crate::settings::{RetentionPolicy, ShellSettings};

/// What the main panel is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSelection {
    None,
    Module(ModuleKind),
    /// The last navigation named an id that is not registered
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(ModuleKind),
    /// The module was already active
    Unchanged,
    Unrecognized,
}

/// User input, one variant per action.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    Navigate(String),
    /// Raw form text for a parameter of the active module
    SetParameter { name: String, value: String },
    /// Typed value from a pick list or checkbox
    SetValue { name: String, value: ParamValue },
    ResetParameter(String),
    LoadDefaults,
    Render,
    GenerateDxf,
    ExportSvg,
    ExportPdf,
    Clear,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEffect {
    None,
    /// A module event arrived with no module active
    Ignored,
    Navigated(SelectOutcome),
    Rendered,
    Exported(ExportArtifact),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Dxf,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dxf => "dxf",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// Bytes produced by an export action, ready to be written to disk.
#[derive(Clone, PartialEq)]
pub struct ExportArtifact {
    pub module: ModuleKind,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Suggested file name, e.g. `staircase.dxf`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.module.id(), self.format.extension())
    }
}

impl fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("module", &self.module)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// View model
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ShellView<'a> {
    pub nav: Vec<NavEntry>,
    pub panel: Option<PanelView<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub selected: bool,
}

/// One of the three action buttons under the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportAction {
    pub label: &'static str,
    pub event: ActionKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    GenerateDxf,
    ExportPdf,
    Clear,
}

impl ActionKind {
    pub fn event(self) -> ShellEvent {
        match self {
            ActionKind::GenerateDxf => ShellEvent::GenerateDxf,
            ActionKind::ExportPdf => ShellEvent::ExportPdf,
            ActionKind::Clear => ShellEvent::Clear,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView<'a> {
    pub kind: ModuleKind,
    pub title: &'static str,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub canvas_margin: f32,
    pub phase: ModulePhase,
    pub parameters: Vec<ResolvedParameter>,
    pub design: Option<&'a Design>,
    pub actions: [ExportAction; 3],
    pub last_error: Option<&'a CanvasError>,
    pub can_undo: bool,
    pub can_redo: bool,
}

// ============================================================================
// Shell
// ============================================================================

#[derive(Debug, Clone)]
pub struct Shell {
    settings: ShellSettings,
    selection: ActiveSelection,
    sessions: BTreeMap<ModuleKind, ModuleSession>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(ShellSettings::default())
    }
}

impl Shell {
    /// A shell with the configured default module selected and mounted.
    pub fn new(settings: ShellSettings) -> Self {
        let default = settings.default_module;
        let mut shell = Shell {
            settings,
            selection: ActiveSelection::None,
            sessions: BTreeMap::new(),
        };
        shell.activate(default);
        shell
    }

    /// Restore a shell from a project: settings and stored parameters.
    /// Modules with stored parameters are mounted; nothing is drawn.
    pub fn from_project(project: &Project) -> CanvasResult<Self> {
        let mut shell = Self::new(project.settings.clone());
        for (kind, parameters) in &project.designs {
            let session = ModuleSession::with_parameters(*kind, parameters)?;
            shell.sessions.insert(*kind, session);
        }
        Ok(shell)
    }

    /// Copy non-empty parameter states into `project`.
    pub fn store_in(&self, project: &mut Project) {
        project.settings = self.settings.clone();
        project.designs = self
            .sessions
            .iter()
            .filter(|(_, s)| !s.parameters().is_empty())
            .map(|(kind, s)| (*kind, s.parameters().clone()))
            .collect();
        project.touch();
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    pub fn active_selection(&self) -> &ActiveSelection {
        &self.selection
    }

    fn active_kind(&self) -> Option<ModuleKind> {
        match self.selection {
            ActiveSelection::Module(kind) => Some(kind),
            _ => None,
        }
    }

    fn activate(&mut self, kind: ModuleKind) {
        self.sessions.entry(kind).or_insert_with(|| kind.mount());
        self.selection = ActiveSelection::Module(kind);
    }

    /// Under [`RetentionPolicy::DiscardOnSwitch`], drop the session being left.
    fn leave_active(&mut self) {
        if self.settings.retention != RetentionPolicy::DiscardOnSwitch {
            return;
        }
        if let Some(previous) = self.active_kind() {
            self.sessions.remove(&previous);
            debug!(module = previous.id(), "unmounted module");
        }
    }

    /// Navigate to `id`. Unknown ids empty the panel without raising.
    pub fn select_module(&mut self, id: &str) -> SelectOutcome {
        let Some(descriptor) = lookup(id) else {
            warn!(id, "navigation to unregistered module");
            self.leave_active();
            self.selection = ActiveSelection::Unrecognized(id.to_string());
            return SelectOutcome::Unrecognized;
        };

        let kind = descriptor.kind;
        if self.active_kind() == Some(kind) {
            return SelectOutcome::Unchanged;
        }
        self.leave_active();
        self.activate(kind);
        debug!(module = kind.id(), "selected module");
        SelectOutcome::Selected(kind)
    }

    /// Registry entry for the active selection; `None` when nothing or an
    /// unrecognized id is selected.
    pub fn active_component(&self) -> Option<&'static ModuleDescriptor> {
        self.active_kind().map(ModuleKind::descriptor)
    }

    pub fn active_session(&self) -> Option<&ModuleSession> {
        self.active_kind().and_then(|kind| self.sessions.get(&kind))
    }

    fn active_session_mut(&mut self) -> Option<&mut ModuleSession> {
        let kind = self.active_kind()?;
        self.sessions.get_mut(&kind)
    }

    /// Session of any mounted module
    pub fn session(&self, kind: ModuleKind) -> Option<&ModuleSession> {
        self.sessions.get(&kind)
    }

    /// Apply one user event.
    ///
    /// # Errors
    ///
    /// Errors from the active session (invalid parameters, failed renders,
    /// exports from an empty module). They are also kept on the session as
    /// its last error; the shell stays usable.
    pub fn handle(&mut self, event: ShellEvent) -> CanvasResult<ShellEffect> {
        if let ShellEvent::Navigate(id) = &event {
            return Ok(ShellEffect::Navigated(self.select_module(id)));
        }

        let settings = self.settings.clone();
        let Some(session) = self.active_session_mut() else {
            debug!(?event, "ignored event with no active module");
            return Ok(ShellEffect::Ignored);
        };
        let module = session.kind();

        let effect = match event {
            ShellEvent::Navigate(_) => ShellEffect::None,
            ShellEvent::SetParameter { name, value } => {
                session.set_parameter(&name, &value)?;
                ShellEffect::None
            }
            ShellEvent::SetValue { name, value } => {
                session.set_value(&name, value)?;
                ShellEffect::None
            }
            ShellEvent::ResetParameter(name) => {
                session.reset_parameter(&name);
                ShellEffect::None
            }
            ShellEvent::LoadDefaults => {
                session.load_defaults();
                ShellEffect::None
            }
            ShellEvent::Render => {
                session.render()?;
                ShellEffect::Rendered
            }
            ShellEvent::GenerateDxf => ShellEffect::Exported(ExportArtifact {
                module,
                format: ExportFormat::Dxf,
                bytes: session.generate_dxf(&settings.dxf)?,
            }),
            ShellEvent::ExportSvg => ShellEffect::Exported(ExportArtifact {
                module,
                format: ExportFormat::Svg,
                bytes: session.export_svg(&settings.canvas)?.into_bytes(),
            }),
            ShellEvent::ExportPdf => ShellEffect::Exported(ExportArtifact {
                module,
                format: ExportFormat::Pdf,
                bytes: session.export_pdf(&settings.report)?,
            }),
            ShellEvent::Clear => {
                session.clear();
                ShellEffect::None
            }
            ShellEvent::Undo => {
                session.undo();
                ShellEffect::None
            }
            ShellEvent::Redo => {
                session.redo();
                ShellEffect::None
            }
        };

        if let ShellEffect::Exported(artifact) = &effect {
            info!(module = module.id(), format = %artifact.format, "export ready");
        }
        Ok(effect)
    }

    /// Pure view of the current state.
    pub fn view(&self) -> ShellView<'_> {
        let active = self.active_kind();
        let nav = REGISTRY
            .iter()
            .map(|d| NavEntry {
                id: d.id,
                display_name: d.display_name,
                selected: active == Some(d.kind),
            })
            .collect();

        let panel = self.active_session().map(|session| {
            let has_parameters = session.phase() != ModulePhase::Empty;
            let canvas = &self.settings.canvas;
            PanelView {
                kind: session.kind(),
                title: session.kind().display_name(),
                canvas_width: canvas.width,
                canvas_height: canvas.height,
                canvas_margin: canvas.margin,
                phase: session.phase(),
                parameters: session.resolved(),
                design: session.design(),
                actions: [
                    ExportAction {
                        label: "Generate DXF",
                        event: ActionKind::GenerateDxf,
                        enabled: has_parameters,
                    },
                    ExportAction {
                        label: "Export PDF",
                        event: ActionKind::ExportPdf,
                        enabled: has_parameters,
                    },
                    ExportAction {
                        label: "Clear",
                        event: ActionKind::Clear,
                        enabled: true,
                    },
                ],
                last_error: session.last_error(),
                can_undo: session.can_undo(),
                can_redo: session.can_redo(),
            }
        });

        ShellView { nav, panel }
    }

    /// Fail with `UnknownModule` for ids that are not registered; used by
    /// callers that must not fall back to an empty panel.
    pub fn require_module(id: &str) -> CanvasResult<ModuleKind> {
        id.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn selected(view: &ShellView<'_>) -> Vec<&'static str> {
        view.nav.iter().filter(|e| e.selected).map(|e| e.id).collect()
    }

    #[test]
    fn test_default_selection_is_bridge() {
        let shell = Shell::default();
        assert_eq!(shell.active_selection(), &ActiveSelection::Module(ModuleKind::Bridge));
        assert_eq!(selected(&shell.view()), vec!["bridge"]);
    }

    #[test]
    fn test_nav_lists_registry_in_order() {
        let shell = Shell::default();
        let names: Vec<_> = shell.view().nav.iter().map(|e| e.display_name).collect();
        assert_eq!(
            names,
            vec![
                "Bridge Design",
                "Rectangle Column",
                "Road L-Section",
                "Road Plan",
                "Road Cross Section",
                "PMGSY Road",
                "Lintel",
                "Sunshed",
                "T-Beam/L-Beam",
                "Staircase",
            ]
        );
    }

    #[rstest]
    #[case("bridge")]
    #[case("rectangle_column")]
    #[case("road_lsection")]
    #[case("road_plan")]
    #[case("road_cross_section")]
    #[case("pmgsy_road")]
    #[case("lintel")]
    #[case("sunshed")]
    #[case("tbeam_lbeam")]
    #[case("staircase")]
    fn test_select_every_module(#[case] id: &str) {
        let mut shell = Shell::default();
        shell.select_module(id);
        assert_eq!(shell.active_component().map(|d| d.id), Some(id));
        assert_eq!(selected(&shell.view()), vec![id]);
    }

    #[rstest]
    fn test_defaults_export_dxf_then_clear(
        #[values(
            ModuleKind::Bridge,
            ModuleKind::RectangleColumn,
            ModuleKind::RoadLsection,
            ModuleKind::RoadPlan,
            ModuleKind::RoadCrossSection,
            ModuleKind::PmgsyRoad,
            ModuleKind::Lintel,
            ModuleKind::Sunshed,
            ModuleKind::TbeamLbeam,
            ModuleKind::Staircase
        )]
        kind: ModuleKind,
    ) {
        let mut shell = Shell::default();
        shell.select_module(kind.id());
        shell.handle(ShellEvent::LoadDefaults).unwrap();

        let ShellEffect::Exported(artifact) = shell.handle(ShellEvent::GenerateDxf).unwrap() else {
            panic!("{kind} produced no export");
        };
        let dxf = String::from_utf8(artifact.bytes).unwrap();
        assert!(dxf.starts_with("  0\nSECTION\n  2\nHEADER\n"));
        assert!(dxf.ends_with("  0\nEOF\n"));
        assert_eq!(shell.view().panel.unwrap().phase, ModulePhase::Drawn);

        shell.handle(ShellEvent::Clear).unwrap();
        let session = shell.active_session().unwrap();
        assert!(session.parameters().is_empty());
        assert_eq!(session.phase(), ModulePhase::Empty);
    }

    #[test]
    fn test_selection_sequence_keeps_single_highlight() {
        let mut shell = Shell::default();
        for id in ["road_plan", "x", "lintel", "lintel", "", "staircase", "bridge", "BRIDGE"] {
            shell.select_module(id);
            let view = shell.view();
            let highlighted = selected(&view);
            match shell.active_component() {
                Some(descriptor) => assert_eq!(highlighted, vec![descriptor.id]),
                None => assert!(highlighted.is_empty()),
            }
            assert_eq!(view.nav.len(), REGISTRY.len());
        }
    }

    #[test]
    fn test_sunshed_panel() {
        let mut shell = Shell::default();
        shell.handle(ShellEvent::Navigate("sunshed".into())).unwrap();

        let view = shell.view();
        let panel = view.panel.unwrap();
        assert_eq!(panel.title, "Sunshed");
        assert_eq!((panel.canvas_width, panel.canvas_height), (800.0, 600.0));
        let labels: Vec<_> = panel.actions.iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["Generate DXF", "Export PDF", "Clear"]);
        assert_eq!(panel.phase, ModulePhase::Empty);
    }

    #[test]
    fn test_exports_from_empty_report_nothing_to_export() {
        let mut shell = Shell::default();
        shell.select_module("sunshed");
        for event in [ShellEvent::GenerateDxf, ShellEvent::ExportPdf] {
            let err = shell.handle(event).unwrap_err();
            assert_eq!(err.error_code(), "NOTHING_TO_EXPORT");
            assert!(err.is_recoverable());
        }
        let view = shell.view();
        let panel = view.panel.unwrap();
        assert_eq!(panel.phase, ModulePhase::Empty);
        assert!(panel.parameters.iter().all(|p| p.is_default));
    }

    #[test]
    fn test_unrecognized_id_empties_panel() {
        let mut shell = Shell::default();
        let before: Vec<_> = shell.view().nav.iter().map(|e| e.id).collect();

        let effect = shell.handle(ShellEvent::Navigate("nonexistent_id".into())).unwrap();
        assert_eq!(effect, ShellEffect::Navigated(SelectOutcome::Unrecognized));
        assert!(shell.active_component().is_none());

        let view = shell.view();
        assert!(view.panel.is_none());
        assert!(selected(&view).is_empty());
        let after: Vec<_> = view.nav.iter().map(|e| e.id).collect();
        assert_eq!(before, after);

        // Still navigable afterwards
        shell.select_module("lintel");
        assert_eq!(shell.active_component().map(|d| d.id), Some("lintel"));
    }

    #[test]
    fn test_events_without_active_module_are_ignored() {
        let mut shell = Shell::default();
        shell.select_module("nope");
        assert_eq!(shell.handle(ShellEvent::Render).unwrap(), ShellEffect::Ignored);
        assert_eq!(shell.handle(ShellEvent::GenerateDxf).unwrap(), ShellEffect::Ignored);
    }

    #[test]
    fn test_reselect_is_unchanged() {
        let mut shell = Shell::default();
        assert_eq!(shell.select_module("bridge"), SelectOutcome::Unchanged);
    }

    #[test]
    fn test_parameters_retained_across_switch() {
        let mut shell = Shell::default();
        shell.select_module("lintel");
        shell
            .handle(ShellEvent::SetParameter {
                name: "span".into(),
                value: "1500".into(),
            })
            .unwrap();
        shell.select_module("staircase");
        shell.select_module("lintel");
        let session = shell.active_session().unwrap();
        assert_eq!(session.parameters().get("span"), Some(&ParamValue::Number(1500.0)));
    }

    #[test]
    fn test_parameters_discarded_across_switch() {
        let settings = ShellSettings {
            retention: RetentionPolicy::DiscardOnSwitch,
            ..ShellSettings::default()
        };
        let mut shell = Shell::new(settings);
        shell.select_module("lintel");
        shell.handle(ShellEvent::LoadDefaults).unwrap();
        shell.select_module("staircase");
        assert!(shell.session(ModuleKind::Lintel).is_none());
        shell.select_module("lintel");
        assert_eq!(shell.active_session().unwrap().phase(), ModulePhase::Empty);
    }

    #[test]
    fn test_unknown_id_detour_still_discards() {
        let settings = ShellSettings {
            retention: RetentionPolicy::DiscardOnSwitch,
            ..ShellSettings::default()
        };
        let mut shell = Shell::new(settings);
        shell.select_module("lintel");
        shell.handle(ShellEvent::LoadDefaults).unwrap();
        assert_eq!(shell.select_module("nonexistent_id"), SelectOutcome::Unrecognized);
        assert!(shell.session(ModuleKind::Lintel).is_none());

        shell.select_module("staircase");
        shell.select_module("lintel");
        assert_eq!(shell.active_session().unwrap().phase(), ModulePhase::Empty);
    }

    #[test]
    fn test_unknown_id_detour_retains_by_default() {
        let mut shell = Shell::default();
        shell.select_module("lintel");
        shell.handle(ShellEvent::LoadDefaults).unwrap();
        shell.select_module("nonexistent_id");
        shell.select_module("lintel");
        assert_eq!(shell.active_session().unwrap().phase(), ModulePhase::ParametersEntered);
    }

    #[test]
    fn test_render_and_export_flow() {
        let mut shell = Shell::default();
        shell.select_module("tbeam_lbeam");
        shell.handle(ShellEvent::LoadDefaults).unwrap();
        assert_eq!(shell.handle(ShellEvent::Render).unwrap(), ShellEffect::Rendered);
        assert_eq!(shell.view().panel.unwrap().phase, ModulePhase::Drawn);

        match shell.handle(ShellEvent::GenerateDxf).unwrap() {
            ShellEffect::Exported(artifact) => {
                assert_eq!(artifact.file_name(), "tbeam_lbeam.dxf");
                assert!(artifact.bytes.ends_with(b"EOF\n"));
            }
            other => panic!("unexpected {other:?}"),
        }

        shell.handle(ShellEvent::Clear).unwrap();
        assert_eq!(shell.view().panel.unwrap().phase, ModulePhase::Empty);
        shell.handle(ShellEvent::Undo).unwrap();
        assert_eq!(shell.view().panel.unwrap().phase, ModulePhase::ParametersEntered);
    }

    #[test]
    fn test_invalid_parameter_is_recoverable() {
        let mut shell = Shell::default();
        let err = shell
            .handle(ShellEvent::SetParameter {
                name: "num_spans".into(),
                value: "many".into(),
            })
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(shell.view().panel.unwrap().last_error, Some(&err));
    }

    #[test]
    fn test_project_round_trip_in_memory() {
        let mut shell = Shell::default();
        shell.select_module("staircase");
        shell
            .handle(ShellEvent::SetParameter {
                name: "num_risers".into(),
                value: "10".into(),
            })
            .unwrap();

        let mut project = Project::new("Engineer", "24-001");
        shell.store_in(&mut project);
        assert_eq!(project.designs.len(), 1);

        let restored = Shell::from_project(&project).unwrap();
        let session = restored.session(ModuleKind::Staircase).unwrap();
        assert_eq!(session.parameters().get("num_risers"), Some(&ParamValue::Number(10.0)));
        assert_eq!(restored.active_component().unwrap().id, "bridge");
    }

    #[test]
    fn test_require_module() {
        assert_eq!(Shell::require_module("road_plan").unwrap(), ModuleKind::RoadPlan);
        assert_eq!(Shell::require_module("x").unwrap_err().error_code(), "UNKNOWN_MODULE");
    }
}
