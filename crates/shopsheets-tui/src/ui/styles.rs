use ratatui::style::{Color, Modifier, Style};
use shopsheets_core::models::PaymentStatus;

// Color palette
pub const PRIMARY: Color = Color::Rgb(52, 152, 219);
pub const SUCCESS: Color = Color::Rgb(39, 174, 96);
pub const ACCENT: Color = Color::Rgb(243, 156, 18);
pub const ERROR: Color = Color::Rgb(231, 76, 60);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn border_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn banner_style() -> Style {
    Style::default().bg(ACCENT).fg(Color::Black).add_modifier(Modifier::BOLD)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn payment_status_style(status: &str) -> Style {
    match PaymentStatus::from_sheet(status) {
        PaymentStatus::Paid => success_style(),
        PaymentStatus::Partial => highlight_style(),
        PaymentStatus::Unpaid => error_style(),
    }
}
