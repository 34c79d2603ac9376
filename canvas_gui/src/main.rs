//! # LispCanvas GUI Application
//!
//! Desktop shell for the civil-engineering design modules. Built with the
//! Iced framework; all state transitions go through
//! [`canvas_core::shell::Shell`], this crate only maps widgets to
//! [`ShellEvent`]s and renders [`Shell::view`].
//!
//! ## Layout
//!
//! ```text
//! +--------------------------------------------------------------+
//! | header / toolbar                                             |
//! +------------+-------------------------------------------------+
//! | navigation | parameter form | 800x600 canvas                 |
//! |            |                | Generate DXF  Export PDF  Clear |
//! |            |                | results / checks               |
//! +------------+-------------------------------------------------+
//! | status bar                                                   |
//! +--------------------------------------------------------------+
//! ```

mod ui;

use std::collections::BTreeMap;
use std::path::PathBuf;

use iced::widget::{column, container, row};
use iced::{Element, Length, Size, Task, Theme};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use canvas_core::file_io::{load_project, save_project};
use canvas_core::params::{ParamKind, ParamValue};
use canvas_core::project::{Project, PROJECT_EXTENSION};
use canvas_core::settings::ShellSettings;
use canvas_core::shell::{ActionKind, ExportArtifact, Shell, ShellEffect, ShellEvent};

const NAV_WIDTH: f32 = 190.0;

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvas_core=info,lispcanvas_gui=info")),
        )
        .init();

    iced::application(App::boot, App::update, App::view)
        .title(App::title)
        .theme(App::theme)
        .window_size(Size::new(1400.0, 860.0))
        .run()
}

/// Bottom-bar message
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    Navigate(&'static str),

    // Parameter form
    DraftChanged(&'static str, String),
    DraftSubmitted(&'static str),
    ChoiceSelected(&'static str, &'static str),
    FlagToggled(&'static str, bool),
    ResetParameter(&'static str),
    LoadDefaults,
    Render,
    Undo,
    Redo,

    // Canvas actions
    Action(ActionKind),
    ExportSvg,
    ExportPathChosen(Option<PathBuf>),

    // Project files
    NewProject,
    OpenProject,
    OpenPathChosen(Option<PathBuf>),
    SaveProject,
    SaveProjectAs,
    SavePathChosen(Option<PathBuf>),

    ToggleDarkMode,
}

pub struct App {
    shell: Shell,
    project: Project,
    current_file: Option<PathBuf>,
    is_modified: bool,
    /// Form text of the active module's typed fields
    drafts: BTreeMap<&'static str, String>,
    /// Export waiting for the save dialog
    pending_export: Option<ExportArtifact>,
    status: Status,
    dark_mode: bool,
}

impl App {
    fn boot() -> (Self, Task<Message>) {
        let mut settings = ShellSettings::load_or_default(None).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring invalid settings file");
            ShellSettings::default()
        });
        if settings.report.engineer.is_empty() {
            settings.report.engineer = whoami::realname();
        }

        let mut project = Project::new(settings.report.engineer.clone(), settings.report.job_id.clone());
        project.settings = settings.clone();

        let mut app = App {
            shell: Shell::new(settings),
            project,
            current_file: None,
            is_modified: false,
            drafts: BTreeMap::new(),
            pending_export: None,
            status: Status::Info("Ready".to_string()),
            dark_mode: false,
        };
        app.sync_drafts();
        (app, Task::none())
    }

    fn title(&self) -> String {
        let file = self
            .current_file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());
        let modified = if self.is_modified { " *" } else { "" };
        format!("LispCanvas - {}{}", file, modified)
    }

    fn theme(&self) -> Theme {
        if self.dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Reset the form drafts from the active session's effective values.
    fn sync_drafts(&mut self) {
        self.drafts = self
            .shell
            .active_session()
            .map(|session| {
                session
                    .resolved()
                    .into_iter()
                    .filter(|p| matches!(p.spec.kind, ParamKind::Number { .. } | ParamKind::Integer { .. } | ParamKind::Text { .. }))
                    .map(|p| (p.spec.name, p.value.to_string()))
                    .collect()
            })
            .unwrap_or_default();
    }

    /// Send one event to the shell and reflect the outcome in the status bar.
    fn dispatch(&mut self, event: ShellEvent) -> Option<ShellEffect> {
        let edits = matches!(
            event,
            ShellEvent::SetParameter { .. }
                | ShellEvent::SetValue { .. }
                | ShellEvent::ResetParameter(_)
                | ShellEvent::LoadDefaults
                | ShellEvent::Clear
                | ShellEvent::Undo
                | ShellEvent::Redo
        );
        match self.shell.handle(event) {
            Ok(effect) => {
                if edits {
                    self.is_modified = true;
                }
                self.status = Status::Info(match &effect {
                    ShellEffect::Rendered => "Drawing updated".to_string(),
                    ShellEffect::Exported(artifact) => format!("{} ready", artifact.format),
                    _ => "Ready".to_string(),
                });
                Some(effect)
            }
            Err(e) => {
                self.status = Status::Error(e.to_string());
                None
            }
        }
    }

    /// Commit every draft that differs from the stored value. Stops at the
    /// first invalid field and returns false.
    fn commit_drafts(&mut self) -> bool {
        let Some(session) = self.shell.active_session() else {
            return true;
        };
        let changed: Vec<(&'static str, String)> = session
            .resolved()
            .into_iter()
            .filter_map(|p| {
                let draft = self.drafts.get(p.spec.name)?;
                (*draft != p.value.to_string()).then(|| (p.spec.name, draft.clone()))
            })
            .collect();

        for (name, value) in changed {
            let event = ShellEvent::SetParameter {
                name: name.to_string(),
                value,
            };
            if self.dispatch(event).is_none() {
                return false;
            }
        }
        true
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(id) => {
                self.dispatch(ShellEvent::Navigate(id.to_string()));
                self.sync_drafts();
            }

            Message::DraftChanged(name, value) => {
                self.drafts.insert(name, value);
            }
            Message::DraftSubmitted(name) => {
                if let Some(value) = self.drafts.get(name).cloned() {
                    let event = ShellEvent::SetParameter {
                        name: name.to_string(),
                        value,
                    };
                    // Keep the user's text on error so it can be corrected
                    if self.dispatch(event).is_some() {
                        self.sync_drafts();
                    }
                }
            }
            Message::ChoiceSelected(name, choice) => {
                self.dispatch(ShellEvent::SetValue {
                    name: name.to_string(),
                    value: ParamValue::Text(choice.to_string()),
                });
            }
            Message::FlagToggled(name, checked) => {
                self.dispatch(ShellEvent::SetValue {
                    name: name.to_string(),
                    value: ParamValue::Flag(checked),
                });
            }
            Message::ResetParameter(name) => {
                self.dispatch(ShellEvent::ResetParameter(name.to_string()));
                self.sync_drafts();
            }
            Message::LoadDefaults => {
                self.dispatch(ShellEvent::LoadDefaults);
                self.sync_drafts();
            }
            Message::Render => {
                if self.commit_drafts() {
                    self.dispatch(ShellEvent::Render);
                }
            }
            Message::Undo => {
                self.dispatch(ShellEvent::Undo);
                self.sync_drafts();
            }
            Message::Redo => {
                self.dispatch(ShellEvent::Redo);
                self.sync_drafts();
            }

            Message::Action(ActionKind::Clear) => {
                self.dispatch(ShellEvent::Clear);
                self.sync_drafts();
            }
            Message::Action(kind) => {
                if self.commit_drafts() {
                    return self.start_export(kind.event());
                }
            }
            Message::ExportSvg => {
                if self.commit_drafts() {
                    return self.start_export(ShellEvent::ExportSvg);
                }
            }
            Message::ExportPathChosen(path) => {
                if let (Some(path), Some(artifact)) = (path, self.pending_export.take()) {
                    match std::fs::write(&path, &artifact.bytes) {
                        Ok(()) => {
                            info!(path = %path.display(), format = %artifact.format, "wrote export");
                            self.status = Status::Info(format!("Saved {}", path.display()));
                        }
                        Err(e) => {
                            error!(path = %path.display(), error = %e, "export write failed");
                            self.status = Status::Error(format!("Could not write {}: {}", path.display(), e));
                        }
                    }
                } else {
                    self.pending_export = None;
                }
            }

            Message::NewProject => {
                let settings = self.shell.settings().clone();
                self.project = Project::new(settings.report.engineer.clone(), settings.report.job_id.clone());
                self.shell = Shell::new(settings);
                self.current_file = None;
                self.is_modified = false;
                self.sync_drafts();
                self.status = Status::Info("New project".to_string());
            }
            Message::OpenProject => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .add_filter("LispCanvas project", &[PROJECT_EXTENSION])
                            .pick_file()
                            .await
                            .map(|handle| handle.path().to_path_buf())
                    },
                    Message::OpenPathChosen,
                );
            }
            Message::OpenPathChosen(Some(path)) => {
                match load_project(&path).and_then(|project| Ok((Shell::from_project(&project)?, project))) {
                    Ok((shell, project)) => {
                        self.shell = shell;
                        self.project = project;
                        self.current_file = Some(path.clone());
                        self.is_modified = false;
                        self.sync_drafts();
                        self.status = Status::Info(format!("Opened {}", path.display()));
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "open failed");
                        self.status = Status::Error(e.to_string());
                    }
                }
            }
            Message::SaveProject => match self.current_file.clone() {
                Some(path) => self.save_to(path),
                None => return self.choose_save_path(),
            },
            Message::SaveProjectAs => return self.choose_save_path(),
            Message::SavePathChosen(Some(path)) => self.save_to(path),
            Message::OpenPathChosen(None) | Message::SavePathChosen(None) => {}

            Message::ToggleDarkMode => {
                self.dark_mode = !self.dark_mode;
            }
        }
        Task::none()
    }

    /// Run an export event and, on success, ask where to write it.
    fn start_export(&mut self, event: ShellEvent) -> Task<Message> {
        let Some(ShellEffect::Exported(artifact)) = self.dispatch(event) else {
            return Task::none();
        };
        let file_name = artifact.file_name();
        let extension = artifact.format.extension();
        let filter = artifact.format.to_string();
        self.pending_export = Some(artifact);

        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_file_name(file_name)
                    .add_filter(filter, &[extension])
                    .save_file()
                    .await
                    .map(|handle| handle.path().to_path_buf())
            },
            Message::ExportPathChosen,
        )
    }

    fn choose_save_path(&self) -> Task<Message> {
        let file_name = format!("{}.{}", self.project.meta.job_id.trim().replace(' ', "_"), PROJECT_EXTENSION);
        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_file_name(file_name)
                    .add_filter("LispCanvas project", &[PROJECT_EXTENSION])
                    .save_file()
                    .await
                    .map(|handle| handle.path().to_path_buf())
            },
            Message::SavePathChosen,
        )
    }

    fn save_to(&mut self, path: PathBuf) {
        self.shell.store_in(&mut self.project);
        match save_project(&self.project, &path) {
            Ok(()) => {
                self.status = Status::Info(format!("Saved {}", path.display()));
                self.current_file = Some(path);
                self.is_modified = false;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "save failed");
                self.status = Status::Error(e.to_string());
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let view = self.shell.view();
        let module = view
            .panel
            .as_ref()
            .map(|p| format!("{} - {}", p.title, p.phase.label()));

        let body = row![
            ui::nav_panel::view_nav_panel(view.nav, NAV_WIDTH),
            ui::module_panel::view_module_panel(view.panel, &self.drafts),
        ]
        .spacing(8)
        .height(Length::Fill);

        let content = column![
            ui::toolbar::view_header(self.title()),
            ui::toolbar::view_toolbar(self.dark_mode),
            body,
            ui::status_bar::view_status_bar(&self.current_file, self.is_modified, module, &self.status),
        ]
        .spacing(6)
        .padding(10);

        container(content).width(Length::Fill).height(Length::Fill).into()
    }
}
