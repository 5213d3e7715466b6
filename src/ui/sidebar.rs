//! Keyword list, add/import controls and the AI expansion button

use iced::widget::{button, column, container, row, scrollable, text, text_editor, text_input, Space};
use iced::{Element, Length, Padding};

use super::theme::{self, DarkTheme};
use crate::app::Message;
use crate::keywords::{KeywordEntry, KeywordStore};

pub struct SidebarState<'a> {
    pub store: &'a KeywordStore,
    pub adding: bool,
    pub bulk_input: &'a text_editor::Content,
    pub import_path: &'a str,
    pub import_error: Option<&'a str>,
    pub expanding: bool,
}

pub fn view(state: SidebarState<'_>) -> Element<'_, Message> {
    let header = row![
        text("IMAGE SCOUT").size(16).color(DarkTheme::PRIMARY),
        Space::with_width(Length::Fill),
        button(text("Settings").size(12))
            .on_press(Message::OpenSettings)
            .style(button::text),
    ]
    .align_y(iced::Alignment::Center)
    .padding(Padding::from([12.0, 16.0]));

    let list: Element<'_, Message> = if state.store.is_empty() {
        container(
            column![
                text("No keywords loaded.").size(13).color(DarkTheme::TEXT_MUTED),
                text("Check keywords.txt").size(13).color(DarkTheme::TEXT_MUTED),
            ]
            .spacing(6)
            .align_x(iced::Alignment::Center),
        )
        .width(Length::Fill)
        .padding(32)
        .center_x(Length::Fill)
        .into()
    } else {
        let active = state.store.active_id();
        let rows: Vec<Element<'_, Message>> = state
            .store
            .entries()
            .iter()
            .map(|entry| keyword_row(entry, active == Some(entry.id)))
            .collect();
        scrollable(column(rows).spacing(4).padding(Padding::from([8.0, 8.0])))
            .height(Length::Fill)
            .into()
    };

    let footer = footer(&state);

    container(
        column![header, container(list).height(Length::Fill), footer]
            .height(Length::Fill),
    )
    .width(Length::Fixed(300.0))
    .height(Length::Fill)
    .style(theme::panel)
    .into()
}

fn keyword_row(entry: &KeywordEntry, selected: bool) -> Element<'_, Message> {
    let dot = container(Space::new(8, 8)).style(move |_theme| iced::widget::container::Style {
        background: Some(iced::Background::Color(theme::status_color(&entry.status))),
        border: iced::Border::default().rounded(4.0),
        ..Default::default()
    });

    let label = button(
        row![dot, text(&entry.term).size(14).color(DarkTheme::TEXT)]
            .spacing(10)
            .align_y(iced::Alignment::Center),
    )
    .on_press(Message::KeywordSelected(entry.id))
    .width(Length::Fill)
    .style(button::text);

    let delete = button(text("x").size(12))
        .on_press(Message::DeleteKeyword(entry.id))
        .style(button::text);

    let item = container(row![label, delete].align_y(iced::Alignment::Center))
        .padding(Padding::from([2.0, 4.0]))
        .width(Length::Fill);

    if selected {
        item.style(theme::selected_row).into()
    } else {
        item.into()
    }
}

fn footer<'a>(state: &SidebarState<'a>) -> Element<'a, Message> {
    let add_controls: Element<'a, Message> = if state.adding {
        column![
            text_editor(state.bulk_input)
                .placeholder("Enter keywords (one per line)...")
                .on_action(Message::BulkEdited)
                .height(96.0),
            row![
                button(text("Add").size(12))
                    .on_press(Message::AddKeywords)
                    .style(button::primary)
                    .width(Length::Fill),
                button(text("Cancel").size(12))
                    .on_press(Message::ToggleAddPanel)
                    .style(button::secondary),
            ]
            .spacing(8),
        ]
        .spacing(8)
        .into()
    } else {
        let import_input = text_input("Import file path (.txt)", state.import_path)
            .on_input(Message::ImportPathChanged)
            .on_submit(Message::ImportFile)
            .size(12);

        let mut controls = column![
            button(text("Add Keyword").size(12))
                .on_press(Message::ToggleAddPanel)
                .style(button::secondary)
                .width(Length::Fill),
            row![
                import_input,
                button(text("Import").size(12))
                    .on_press(Message::ImportFile)
                    .style(button::secondary),
            ]
            .spacing(8),
        ]
        .spacing(8);

        if let Some(error) = state.import_error {
            controls = controls.push(text(error).size(11).color(DarkTheme::ERROR));
        }
        controls.into()
    };

    let can_expand = !state.expanding && state.store.active_id().is_some();
    let expand_label = if state.expanding {
        "Reasoning..."
    } else {
        "Expand with Gemini AI"
    };
    let expand = button(text(expand_label).size(12))
        .on_press_maybe(can_expand.then_some(Message::Expand))
        .style(button::primary)
        .width(Length::Fill);

    container(column![add_controls, expand].spacing(12))
        .padding(16)
        .width(Length::Fill)
        .into()
}
