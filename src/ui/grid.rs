//! Result grid for the active keyword

use std::collections::HashMap;

use iced::widget::{button, column, container, image, row, scrollable, text, Space};
use iced::{ContentFit, Element, Length, Padding};

use super::theme::{self, DarkTheme};
use crate::app::{DownloadState, Message, Preview};
use crate::backend::SearchResult;
use crate::keywords::KeywordEntry;

const COLUMNS: usize = 4;
const CARD_HEIGHT: f32 = 300.0;
const PREVIEW_HEIGHT: f32 = 150.0;

pub fn view<'a>(
    entry: &'a KeywordEntry,
    previews: &'a HashMap<String, Preview>,
    downloads: &'a HashMap<String, DownloadState>,
) -> Element<'a, Message> {
    let body: Element<'a, Message> = match entry.results.as_deref() {
        _ if entry.status.is_loading() => {
            centered(text("Fetching assets...").color(DarkTheme::PRIMARY))
        }
        None | Some([]) => {
            centered(text("No results found for this keyword.").color(DarkTheme::TEXT_MUTED))
        }
        Some(results) => cards(results, previews, downloads),
    };

    column![toolbar(entry), body]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn toolbar(entry: &KeywordEntry) -> Element<'_, Message> {
    let mut title = row![text(&entry.term).size(18).color(DarkTheme::TEXT)]
        .spacing(10)
        .align_y(iced::Alignment::Center);
    if let Some(timecode) = &entry.timecode {
        title = title.push(pill(timecode.clone()));
    }
    title = title.push(pill(format!("{} Results", entry.result_count())));

    let mut heading = column![title].spacing(4);
    if let Some(error) = entry.status.error() {
        heading = heading.push(text(error).size(12).color(DarkTheme::ERROR));
    }

    container(
        row![
            heading,
            Space::with_width(Length::Fill),
            button(text("Refresh").size(12))
                .on_press(Message::Refresh)
                .style(button::secondary),
        ]
        .align_y(iced::Alignment::Center),
    )
    .padding(Padding::from([12.0, 24.0]))
    .width(Length::Fill)
    .into()
}

fn cards<'a>(
    results: &'a [SearchResult],
    previews: &'a HashMap<String, Preview>,
    downloads: &'a HashMap<String, DownloadState>,
) -> Element<'a, Message> {
    let rows: Vec<Element<'a, Message>> = results
        .chunks(COLUMNS)
        .enumerate()
        .map(|(chunk_index, chunk)| {
            let mut cells: Vec<Element<'a, Message>> = chunk
                .iter()
                .enumerate()
                .map(|(offset, result)| {
                    let index = chunk_index * COLUMNS + offset;
                    card(index, result, previews.get(&result.link), downloads.get(&result.link))
                })
                .collect();
            while cells.len() < COLUMNS {
                cells.push(Space::with_width(Length::FillPortion(1)).into());
            }
            row(cells).spacing(16).into()
        })
        .collect();

    scrollable(column(rows).spacing(16).padding(Padding::from([8.0, 24.0])))
        .height(Length::Fill)
        .into()
}

fn card<'a>(
    index: usize,
    result: &'a SearchResult,
    preview: Option<&'a Preview>,
    download: Option<&'a DownloadState>,
) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match preview {
        Some(Preview::Ready(handle)) => image(handle.clone())
            .width(Length::Fill)
            .height(PREVIEW_HEIGHT)
            .content_fit(ContentFit::Cover)
            .into(),
        Some(Preview::Missing) => placeholder("Image unavailable"),
        Some(Preview::Loading) | None => placeholder("Loading..."),
    };

    let mut meta = row![pill(format!("{}", index + 1))]
        .spacing(6)
        .align_y(iced::Alignment::Center);
    if !result.display_link.is_empty() {
        meta = meta.push(text(&result.display_link).size(11).color(DarkTheme::TEXT_MUTED));
    }
    if let Some((w, h)) = result.dimensions() {
        meta = meta.push(text(format!("{} x {}", w, h)).size(11).color(DarkTheme::TEXT_MUTED));
    }

    let save: Element<'a, Message> = match download {
        Some(DownloadState::Downloading) => text("Saving...").size(11).color(DarkTheme::PRIMARY).into(),
        Some(DownloadState::Saved(path)) => text(format!("Saved: {}", path))
            .size(11)
            .color(DarkTheme::SUCCESS)
            .into(),
        Some(DownloadState::Failed(error)) => column![
            text(error).size(11).color(DarkTheme::ERROR),
            button(text("Retry").size(11))
                .on_press(Message::Download(index))
                .style(button::secondary),
        ]
        .into(),
        None => button(text("Save").size(11))
            .on_press(Message::Download(index))
            .style(button::secondary)
            .into(),
    };

    container(
        column![
            picture,
            text(&result.title).size(12).color(DarkTheme::TEXT),
            meta,
            text(result.page_link()).size(10).color(DarkTheme::TEXT_MUTED),
            save,
        ]
        .spacing(6),
    )
    .padding(8)
    .width(Length::FillPortion(1))
    .height(CARD_HEIGHT)
    .style(theme::panel)
    .into()
}

fn placeholder<'a>(label: &'a str) -> Element<'a, Message> {
    container(text(label).size(12).color(DarkTheme::TEXT_MUTED))
        .width(Length::Fill)
        .height(PREVIEW_HEIGHT)
        .center_x(Length::Fill)
        .center_y(PREVIEW_HEIGHT)
        .style(theme::background)
        .into()
}

fn pill<'a>(label: String) -> Element<'a, Message> {
    container(text(label).size(11).color(DarkTheme::TEXT_MUTED))
        .padding(Padding::from([2.0, 8.0]))
        .style(theme::badge)
        .into()
}

fn centered<'a>(content: iced::widget::Text<'a>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
