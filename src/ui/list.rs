/// Ranked candidate list
use iced::widget::{button, column, row, scrollable, text, Column};
use iced::{Element, Length};

use compare_view::state::{ListEntry, Snapshot};

use crate::Message;

pub const LIST_WIDTH: f32 = 260.0;

pub fn view(snapshot: &Snapshot) -> Element<'_, Message> {
    let rows = snapshot
        .entries
        .iter()
        .fold(Column::new().spacing(4), |rows, entry| rows.push(entry_row(entry)));

    column![
        text(snapshot.count_label()).size(14),
        scrollable(rows).height(Length::Fill),
    ]
    .spacing(8)
    .height(Length::Fill)
    .into()
}

fn entry_row(entry: &ListEntry) -> Element<'_, Message> {
    // Degraded entries are flagged next to their score
    let score = if entry.degraded {
        format!("! {}", entry.score_label())
    } else {
        entry.score_label()
    };

    let label = row![
        text(&entry.name).size(13).width(Length::Fill),
        text(score).size(13),
    ]
    .spacing(8);

    let select = button(label)
        .width(Length::Fill)
        .style(if entry.selected {
            button::primary
        } else {
            button::secondary
        })
        .on_press(Message::Select(entry.id));

    let delete = button(text("x").size(13))
        .style(button::danger)
        .on_press(Message::Delete(entry.id));

    row![select, delete].spacing(4).into()
}
