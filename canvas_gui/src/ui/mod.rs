//! UI module for the LispCanvas GUI
//!
//! # Panel Structure
//! - `toolbar` - Project file operations and theme toggle
//! - `nav_panel` - Left sidebar: one button per registered module
//! - `module_panel` - Main panel: parameter form, drawing canvas, actions, results
//! - `status_bar` - Bottom status messages
//!
//! # Shared Components
//! - `drawing_canvas` - Canvas program rendering a module drawing

pub mod drawing_canvas;
pub mod module_panel;
pub mod nav_panel;
pub mod status_bar;
pub mod toolbar;
