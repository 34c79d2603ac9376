//! # canvas_core - Civil Engineering Design Engine
//!
//! `canvas_core` is the engine behind LispCanvas, a design shell for ten
//! civil-engineering drawing modules (bridges, roads, and RC building
//! elements). It owns everything except pixels: the module registry, the
//! navigation shell, per-module parameter sessions, the design generators,
//! and the DXF, SVG and PDF exporters.
//!
//! ## Design Philosophy
//!
//! - **UI-free**: the GUI and CLI are thin drivers over [`shell::Shell`]
//! - **Closed module set**: [`registry::ModuleKind`] dispatches to a schema
//!   and a generator, no trait objects
//! - **Data-driven drawings**: generators return a [`drawing::Drawing`];
//!   every output format is rendered from it
//! - **Recoverable errors**: bad input never leaves the shell unusable
//!
//! ## Quick Start
//!
//! ```rust
//! use canvas_core::shell::{Shell, ShellEffect, ShellEvent};
//!
//! let mut shell = Shell::default();
//! shell.handle(ShellEvent::Navigate("lintel".into())).unwrap();
//! shell.handle(ShellEvent::SetParameter { name: "span".into(), value: "1000".into() }).unwrap();
//!
//! match shell.handle(ShellEvent::GenerateDxf).unwrap() {
//!     ShellEffect::Exported(artifact) => assert_eq!(artifact.file_name(), "lintel.dxf"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - The ten modules, their ids and display names
//! - [`shell`] - Navigation, events, and the view model
//! - [`session`] - Per-module parameter state, history, and exports
//! - [`params`] - Parameter schemas and validation
//! - [`designs`] - Design generators, one per module
//! - [`drawing`] - Layered 2D drawing model
//! - [`dxf`], [`svg`], [`pdf`] - Output formats
//! - [`settings`] - Shell configuration
//! - [`project`], [`file_io`] - Project files with atomic saves
//! - [`errors`] - Structured error types

pub mod designs;
pub mod drawing;
pub mod dxf;
pub mod errors;
pub mod file_io;
pub mod params;
pub mod pdf;
pub mod project;
pub mod registry;
pub mod session;
pub mod settings;
pub mod shell;
pub mod svg;

// Re-export commonly used types at crate root for convenience
pub use errors::{CanvasError, CanvasResult};
pub use file_io::{load_project, save_project};
pub use project::{Project, ProjectMetadata};
pub use registry::{ModuleDescriptor, ModuleKind, REGISTRY};
pub use session::{ModulePhase, ModuleSession};
pub use settings::ShellSettings;
pub use shell::{Shell, ShellEffect, ShellEvent};
