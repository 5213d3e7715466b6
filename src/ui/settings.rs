//! Settings form and the "configuration required" placeholder

use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Element, Length};

use super::theme::{self, DarkTheme};
use crate::app::{Message, SettingsField};
use crate::config::AppConfig;

pub fn view<'a>(draft: &'a AppConfig, error: Option<&'a str>) -> Element<'a, Message> {
    let mut form = column![
        text("Settings").size(20).color(DarkTheme::TEXT),
        text("Credentials are stored locally and sent only to the search backend and Gemini.")
            .size(12)
            .color(DarkTheme::TEXT_MUTED),
        Space::with_height(8),
        field(
            "Google API Key",
            "AIza...",
            &draft.google_api_key,
            SettingsField::GoogleApiKey,
            true,
        ),
        field(
            "Search Engine ID (CX)",
            "0123456789abcdef0",
            &draft.google_cx_id,
            SettingsField::GoogleCxId,
            false,
        ),
        field(
            "Gemini API Key",
            "Optional, enables keyword expansion",
            &draft.gemini_api_key,
            SettingsField::GeminiApiKey,
            true,
        ),
    ]
    .spacing(12);

    if let Some(error) = error {
        form = form.push(text(error).size(12).color(DarkTheme::ERROR));
    }

    form = form.push(
        row![
            Space::with_width(Length::Fill),
            button(text("Close").size(13))
                .on_press(Message::CloseSettings)
                .style(button::secondary),
            button(text("Save").size(13))
                .on_press(Message::SaveSettings)
                .style(button::primary),
        ]
        .spacing(8),
    );

    container(
        container(form)
            .padding(24)
            .max_width(520.0)
            .style(theme::panel),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}

fn field<'a>(
    label: &'a str,
    placeholder: &'a str,
    value: &'a str,
    which: SettingsField,
    secret: bool,
) -> Element<'a, Message> {
    let input = text_input(placeholder, value)
        .on_input(move |value| Message::SettingsChanged(which, value))
        .on_submit(Message::SaveSettings)
        .secure(secret)
        .padding(8)
        .size(13);

    column![text(label).size(12).color(DarkTheme::TEXT_MUTED), input]
        .spacing(4)
        .into()
}

pub fn required<'a>() -> Element<'a, Message> {
    container(
        column![
            text("Configuration Required").size(20).color(DarkTheme::TEXT),
            text("Add a Google API key and Search Engine ID to start searching.")
                .size(14)
                .color(DarkTheme::TEXT_MUTED),
            Space::with_height(8),
            button(text("Open Settings").size(13))
                .on_press(Message::OpenSettings)
                .style(button::primary),
        ]
        .spacing(8)
        .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}
