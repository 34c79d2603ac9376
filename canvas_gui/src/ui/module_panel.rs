//! Module Panel (Main Area)
//!
//! Shows the active module:
//! - Parameter form (left), one row per schema parameter
//! - 800x600 drawing canvas with the Generate DXF / Export PDF / Clear actions
//! - Design summary and checks once drawn
//!
//! Numeric and text fields edit a draft; the value is committed on Enter or
//! when Render or an export runs. Pick lists and checkboxes commit directly.

use std::collections::BTreeMap;

use iced::widget::{
    button, checkbox, column, container, pick_list, row, rule, scrollable, text, text_input, Canvas, Column, Space,
};
use iced::{Alignment, Element, Length, Padding};

use canvas_core::designs::Design;
use canvas_core::params::{ParamKind, ResolvedParameter};
use canvas_core::session::ModulePhase;
use canvas_core::shell::{ActionKind, PanelView};

use super::drawing_canvas::DrawingCanvas;
use crate::Message;

const FORM_WIDTH: f32 = 360.0;

/// Render the main panel; `None` renders an empty panel.
pub fn view_module_panel<'a>(
    panel: Option<PanelView<'a>>,
    drafts: &'a BTreeMap<&'static str, String>,
) -> Element<'a, Message> {
    let Some(panel) = panel else {
        return container(Space::new())
            .width(Length::Fill)
            .height(Length::Fill)
            .style(container::bordered_box)
            .into();
    };

    let form = view_form(&panel, drafts);
    let drawing = view_drawing(&panel);

    container(row![form, Space::new().width(10), drawing])
        .width(Length::Fill)
        .height(Length::Fill)
        .style(container::bordered_box)
        .padding(8)
        .into()
}

fn view_form<'a>(panel: &PanelView<'a>, drafts: &'a BTreeMap<&'static str, String>) -> Element<'a, Message> {
    let mut rows: Column<'a, Message> = column![].spacing(4);
    for parameter in &panel.parameters {
        rows = rows.push(view_parameter(parameter, drafts));
    }

    let history = row![
        button(text("Load Defaults").size(11))
            .on_press(Message::LoadDefaults)
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        button(text("Undo").size(11))
            .on_press_maybe(panel.can_undo.then_some(Message::Undo))
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        button(text("Redo").size(11))
            .on_press_maybe(panel.can_redo.then_some(Message::Redo))
            .padding(Padding::from([4, 8]))
            .style(button::secondary),
        Space::new().width(Length::Fill),
        button(text("Render").size(11))
            .on_press(Message::Render)
            .padding(Padding::from([4, 12]))
            .style(button::primary),
    ]
    .spacing(4)
    .align_y(Alignment::Center);

    column![
        text(panel.title).size(18),
        text(panel.phase.label()).size(10).color([0.5, 0.5, 0.5]),
        Space::new().height(6),
        scrollable(rows.padding(Padding::from([0, 8]))).height(Length::Fill),
        Space::new().height(6),
        history,
    ]
    .width(Length::Fixed(FORM_WIDTH))
    .into()
}

fn view_parameter<'a>(
    parameter: &ResolvedParameter,
    drafts: &'a BTreeMap<&'static str, String>,
) -> Element<'a, Message> {
    let spec = parameter.spec;
    let name = spec.name;
    let label = text(spec.label).size(11).width(Length::Fixed(170.0));
    // Values still at their schema default are greyed out
    let label = if parameter.is_default { label.color([0.5, 0.5, 0.5]) } else { label };

    let field: Element<'a, Message> = match spec.kind {
        ParamKind::Choice { options, .. } => {
            let current = parameter.value.as_text();
            let selected = options.iter().copied().find(|o| Some(*o) == current);
            pick_list(options, selected, move |choice| Message::ChoiceSelected(name, choice))
                .width(Length::Fill)
                .text_size(11)
                .into()
        }
        ParamKind::Flag { .. } => checkbox(parameter.value.as_flag().unwrap_or(false))
            .on_toggle(move |checked| Message::FlagToggled(name, checked))
            .text_size(11)
            .into(),
        ParamKind::Number { .. } | ParamKind::Integer { .. } | ParamKind::Text { .. } => {
            let draft = drafts.get(name).map(String::as_str).unwrap_or_default();
            text_input(&spec.hint(), draft)
                .on_input(move |value| Message::DraftChanged(name, value))
                .on_submit(Message::DraftSubmitted(name))
                .width(Length::Fill)
                .padding(4)
                .size(11)
                .into()
        }
    };

    let reset: Element<'a, Message> = if parameter.is_default {
        Space::new().width(22).into()
    } else {
        button(text("x").size(10))
            .on_press(Message::ResetParameter(name))
            .padding(Padding::from([2, 6]))
            .style(button::text)
            .into()
    };

    row![
        label,
        field,
        text(spec.unit).size(10).width(Length::Fixed(40.0)),
        reset,
    ]
    .spacing(4)
    .align_y(Alignment::Center)
    .into()
}

fn view_drawing<'a>(panel: &PanelView<'a>) -> Element<'a, Message> {
    let placeholder = match panel.phase {
        ModulePhase::Empty => "Enter parameters or load defaults",
        ModulePhase::ParametersEntered => "Press Render to draw",
        ModulePhase::Drawn => "",
    };

    let canvas: Element<'a, Message> = Canvas::new(DrawingCanvas::new(
        panel.design.map(|d| &d.drawing),
        panel.canvas_margin,
        placeholder,
    ))
    .width(Length::Fixed(panel.canvas_width))
    .height(Length::Fixed(panel.canvas_height))
    .into();

    let mut actions = row![].spacing(6);
    for action in panel.actions {
        let style = match action.event {
            ActionKind::Clear => button::danger,
            _ => button::primary,
        };
        actions = actions.push(
            button(text(action.label).size(11))
                .on_press_maybe(action.enabled.then_some(Message::Action(action.event)))
                .padding(Padding::from([6, 12]))
                .style(style),
        );
    }
    actions = actions.push(
        button(text("Export SVG").size(11))
            .on_press(Message::ExportSvg)
            .padding(Padding::from([6, 12]))
            .style(button::secondary),
    );

    let mut content = column![
        container(canvas).style(container::bordered_box),
        Space::new().height(6),
        actions,
    ];

    if let Some(error) = panel.last_error {
        content = content
            .push(Space::new().height(6))
            .push(text(error.to_string()).size(11).color([0.8, 0.2, 0.2]));
    }

    if let Some(design) = panel.design {
        content = content.push(Space::new().height(8)).push(view_results(design));
    }

    scrollable(content.width(Length::Shrink)).into()
}

fn view_results<'a>(design: &'a Design) -> Element<'a, Message> {
    let status = if design.passes() {
        text("DESIGN ADEQUATE").size(14).color([0.2, 0.6, 0.2])
    } else {
        text("DESIGN INADEQUATE").size(14).color([0.8, 0.2, 0.2])
    };

    let mut summary: Column<'a, Message> = column![].spacing(2);
    for item in &design.summary {
        summary = summary.push(text(format!("{}: {} {}", item.label, item.formatted(), item.unit)).size(11));
    }

    let mut checks: Column<'a, Message> = column![].spacing(2);
    for check in &design.checks {
        let color = if check.passes { [0.2, 0.6, 0.2] } else { [0.8, 0.2, 0.2] };
        checks = checks.push(
            row![
                text(&check.name).size(11).width(Length::Fixed(260.0)),
                text(format!("{} / {}", check.actual, check.limit)).size(11).width(Length::Fixed(200.0)),
                text(check.status()).size(11).color(color),
            ]
            .spacing(4),
        );
    }

    column![
        status,
        Space::new().height(4),
        text("Results").size(13),
        summary,
        rule::horizontal(1),
        text("Checks").size(13),
        checks,
    ]
    .spacing(4)
    .into()
}
