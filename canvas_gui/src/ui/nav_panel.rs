//! Navigation Panel (Left Sidebar)
//!
//! One button per registered module, in registry order. The entry matching
//! the active selection is highlighted; after an unrecognized navigation
//! nothing is.

use iced::widget::{button, column, container, rule, scrollable, text, Column};
use iced::{Element, Length, Padding};

use canvas_core::shell::NavEntry;

use crate::Message;

/// Render the navigation sidebar
pub fn view_nav_panel(entries: Vec<NavEntry>, width: f32) -> Element<'static, Message> {
    let mut list: Column<'static, Message> = column![text("Modules").size(12), rule::horizontal(1)].spacing(4);

    for entry in entries {
        let style = if entry.selected { button::primary } else { button::secondary };
        list = list.push(
            button(text(entry.display_name).size(11))
                .on_press(Message::Navigate(entry.id))
                .padding(Padding::from([4, 8]))
                .style(style)
                .width(Length::Fill),
        );
    }

    container(scrollable(list.padding(4)))
        .width(Length::Fixed(width))
        .height(Length::Fill)
        .style(container::bordered_box)
        .padding(4)
        .into()
}
