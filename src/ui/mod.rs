/// UI components
///
/// - list.rs: ranked candidate list
/// - canvas.rs: label overlay and pointer tracking of the comparison area
/// - this file: sidebar, toolbar and comparison area layout
pub mod canvas;
pub mod list;

use iced::widget::image::Handle;
use iced::widget::{
    button, canvas as canvas_widget, column, container, horizontal_space, image, mouse_area,
    radio, row, stack, text, Column, Row,
};
use iced::{Alignment, Background, Border, Color, ContentFit, Element, Length};

use compare_view::loader::DropTarget;
use compare_view::state::{
    HighlightColor, Input, PointerButton, SensitivityMode, Snapshot, ViewMode,
};

use crate::Message;

/// View mode toggle and reveal control
pub fn toolbar(snapshot: &Snapshot) -> Element<'_, Message> {
    let mode_button = |label: &'static str, mode: ViewMode| {
        button(text(label).size(13))
            .style(if snapshot.view_mode == mode {
                button::primary
            } else {
                button::secondary
            })
            .on_press(Message::Pointer(Input::SelectMode(mode)))
    };

    // Hover shows the candidate, holding shows the reference
    let reveal = mouse_area(
        container(text("Hover / hold to compare").size(13))
            .padding(6)
            .style(container::rounded_box),
    )
    .on_enter(Message::Pointer(Input::EnterReveal))
    .on_exit(Message::Pointer(Input::LeaveReveal))
    .on_press(Message::Pointer(Input::Press(PointerButton::Primary)))
    .on_right_press(Message::Pointer(Input::Press(PointerButton::Secondary)))
    .on_middle_press(Message::Pointer(Input::Press(PointerButton::Middle)));

    row![
        mode_button("Slider", ViewMode::SliderWipe),
        mode_button("Diff", ViewMode::FullDiff),
        horizontal_space(),
        reveal,
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

/// Load buttons, reference summary, sensitivity, swatches and the ranked list
///
/// The reference row doubles as the reference drop zone; files dropped
/// anywhere else become candidates.
pub fn sidebar<'a>(
    snapshot: &'a Snapshot,
    swatches: &'a [HighlightColor],
    reference_hovered: bool,
) -> Element<'a, Message> {
    let summary = snapshot
        .reference
        .clone()
        .unwrap_or_else(|| "No reference".to_string());
    let hint = if reference_hovered {
        "Drop here to set the reference"
    } else {
        "Drop an image here for the reference"
    };

    let reference = mouse_area(
        container(column![text(summary).size(14), text(hint).size(11)].spacing(2))
            .padding(6)
            .width(Length::Fill)
            .style(if reference_hovered {
                container::bordered_box
            } else {
                container::rounded_box
            }),
    )
    .on_enter(Message::DropHovered(DropTarget::Reference))
    .on_exit(Message::DropHovered(DropTarget::Candidates));

    let modes = SensitivityMode::ALL.iter().fold(Column::new().spacing(6), |modes, &mode| {
        modes.push(radio(
            mode.label(),
            mode,
            Some(snapshot.sensitivity),
            Message::SensitivityChanged,
        ))
    });

    let colors = swatches.iter().fold(Row::new().spacing(6), |colors, &swatch| {
        colors.push(swatch_button(swatch, swatch == snapshot.highlight))
    });

    column![
        row![
            button("Load Reference").on_press(Message::PickReference).padding(8),
            button("Add Candidates").on_press(Message::PickCandidates).padding(8),
        ]
        .spacing(8),
        reference,
        modes,
        colors,
        list::view(snapshot),
    ]
    .spacing(12)
    .width(Length::Fixed(list::LIST_WIDTH))
    .into()
}

fn swatch_button(color: HighlightColor, selected: bool) -> Element<'static, Message> {
    let fill = Color::from_rgb8(color.red, color.green, color.blue);

    button(text(""))
        .width(Length::Fixed(22.0))
        .height(Length::Fixed(22.0))
        .style(move |_theme, _status| button::Style {
            background: Some(Background::Color(fill)),
            border: Border {
                color: Color::WHITE,
                width: if selected { 2.0 } else { 0.0 },
                radius: 4.0.into(),
            },
            ..button::Style::default()
        })
        .on_press(Message::HighlightChanged(color))
        .into()
}

/// Composed frame with its overlay, or the empty state
pub fn comparison<'a>(
    snapshot: &'a Snapshot,
    frame: Option<&'a Handle>,
    frame_size: (u32, u32),
) -> Element<'a, Message> {
    let Some(frame) = frame.filter(|_| snapshot.current.is_some()) else {
        let hint = if snapshot.reference.is_none() {
            "Load a reference image to start"
        } else {
            "Add candidates to compare"
        };
        return container(text(hint).size(16))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    };

    let overlay = canvas::Overlay {
        labels: snapshot.labels.clone(),
        image_size: frame_size,
    };

    stack![
        image(frame.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(Length::Fill),
        canvas_widget(overlay).width(Length::Fill).height(Length::Fill),
    ]
    .into()
}

/// Status line; empty once the last message auto-hid
pub fn status_bar(snapshot: &Snapshot) -> Element<'_, Message> {
    text(snapshot.status.clone().unwrap_or_default()).size(13).into()
}
