//! Theme configuration

use iced::widget::container;
use iced::{Background, Border, Color};

use crate::keywords::KeywordStatus;

/// Dark theme colors
pub struct DarkTheme;

impl DarkTheme {
    pub const BACKGROUND: Color = Color::from_rgb(0.04, 0.04, 0.05);
    pub const SURFACE: Color = Color::from_rgb(0.09, 0.09, 0.11);
    pub const SURFACE_HIGHLIGHT: Color = Color::from_rgb(0.15, 0.15, 0.18);
    pub const BORDER: Color = Color::from_rgb(0.16, 0.16, 0.18);
    pub const PRIMARY: Color = Color::from_rgb(0.39, 0.4, 0.95);
    pub const TEXT: Color = Color::from_rgb(0.95, 0.95, 0.95);
    pub const TEXT_MUTED: Color = Color::from_rgb(0.55, 0.55, 0.6);
    pub const SUCCESS: Color = Color::from_rgb(0.06, 0.73, 0.51);
    pub const ERROR: Color = Color::from_rgb(0.94, 0.27, 0.27);
    pub const IDLE: Color = Color::from_rgb(0.32, 0.32, 0.36);
    pub const SELECTION: Color = Color::from_rgb(0.14, 0.15, 0.27);
}

/// Dot color in the keyword list
pub fn status_color(status: &KeywordStatus) -> Color {
    match status {
        KeywordStatus::Idle => DarkTheme::IDLE,
        KeywordStatus::Loading => DarkTheme::PRIMARY,
        KeywordStatus::Success => DarkTheme::SUCCESS,
        KeywordStatus::Error(_) => DarkTheme::ERROR,
    }
}

pub fn panel(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::SURFACE)),
        border: Border {
            color: DarkTheme::BORDER,
            width: 1.0,
            radius: 12.0.into(),
        },
        ..Default::default()
    }
}

pub fn badge(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::SURFACE_HIGHLIGHT)),
        border: Border::default().rounded(999.0),
        ..Default::default()
    }
}

pub fn background(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::BACKGROUND)),
        ..Default::default()
    }
}

pub fn selected_row(_theme: &iced::Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(DarkTheme::SELECTION)),
        border: Border {
            color: DarkTheme::PRIMARY,
            width: 1.0,
            radius: 8.0.into(),
        },
        ..Default::default()
    }
}
