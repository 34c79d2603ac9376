//! Status Bar (Bottom)
//!
//! Displays:
//! - Current file path
//! - Modified indicator (*)
//! - Active module and its phase
//! - Status messages (errors in red)

use std::path::PathBuf;

use iced::widget::{row, text, Space};
use iced::{Element, Length, Padding};

use crate::{Message, Status};

/// Render the status bar
pub fn view_status_bar<'a>(
    current_file: &'a Option<PathBuf>,
    is_modified: bool,
    module: Option<String>,
    status: &'a Status,
) -> Element<'a, Message> {
    let file_info = match current_file {
        Some(path) => path.display().to_string(),
        None => "Untitled".to_string(),
    };

    let modified_indicator = if is_modified { " *" } else { "" };

    let status_text = match status {
        Status::Info(message) => text(message).size(10),
        Status::Error(message) => text(message).size(10).color([0.8, 0.2, 0.2]),
    };

    row![
        text(format!("{}{}", file_info, modified_indicator)).size(10),
        Space::new().width(12),
        text(module.unwrap_or_default()).size(10).color([0.4, 0.4, 0.4]),
        Space::new().width(Length::Fill),
        status_text,
    ]
    .padding(Padding::from([4, 0]))
    .into()
}
