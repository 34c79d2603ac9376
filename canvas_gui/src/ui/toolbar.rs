//! Toolbar component
//!
//! File operations (New, Open, Save, Save As) and the theme toggle.

use iced::widget::{button, row, text, Space};
use iced::{Alignment, Element, Length, Padding};

use crate::Message;

/// Render the application header with title
pub fn view_header(window_title: String) -> Element<'static, Message> {
    row![
        text("LispCanvas").size(28),
        Space::new().width(Length::Fill),
        text(window_title).size(14),
    ]
    .align_y(Alignment::Center)
    .into()
}

/// Render the toolbar with project file operations
pub fn view_toolbar(dark_mode: bool) -> Element<'static, Message> {
    let file_buttons = row![
        button(text("New").size(11))
            .on_press(Message::NewProject)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        button(text("Open").size(11))
            .on_press(Message::OpenProject)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        button(text("Save").size(11))
            .on_press(Message::SaveProject)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        button(text("Save As").size(11))
            .on_press(Message::SaveProjectAs)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
    ]
    .spacing(4);

    let theme_label = if dark_mode { "Light Mode" } else { "Dark Mode" };

    row![
        file_buttons,
        Space::new().width(Length::Fill),
        button(text(theme_label).size(11))
            .on_press(Message::ToggleDarkMode)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
    ]
    .padding(Padding::from([4, 0]))
    .align_y(Alignment::Center)
    .into()
}
