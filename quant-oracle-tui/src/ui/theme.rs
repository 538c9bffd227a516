//! Dashboard palette.

use quant_oracle_feed::{ChainSignal, SentimentTone};
use ratatui::style::Color;

pub const C_BG: Color = Color::Rgb(0x1e, 0x22, 0x2d);
pub const C_PANEL: Color = Color::Rgb(0x2b, 0x2f, 0x3a);
pub const C_TEXT: Color = Color::Rgb(0xd1, 0xd4, 0xdc);
pub const C_DIM: Color = Color::Rgb(0x78, 0x7b, 0x86);
pub const C_ACCENT: Color = Color::Rgb(0x29, 0x62, 0xff);
pub const C_POSITIVE: Color = Color::Rgb(0x26, 0xa6, 0x9a);
pub const C_NEGATIVE: Color = Color::Rgb(0xef, 0x53, 0x50);
pub const C_WARN: Color = Color::Rgb(0xf5, 0xc2, 0x42);

/// Pie / badge colour of a chain signal.
pub fn signal_color(signal: ChainSignal) -> Color {
    match signal {
        ChainSignal::LowGas => C_POSITIVE,
        ChainSignal::Normal => C_ACCENT,
        ChainSignal::WhaleAlert => C_NEGATIVE,
        ChainSignal::Unknown => C_DIM,
    }
}

pub fn tone_color(tone: SentimentTone) -> Color {
    match tone {
        SentimentTone::Positive => C_POSITIVE,
        SentimentTone::Negative => C_NEGATIVE,
        SentimentTone::Neutral => C_TEXT,
    }
}

/// Green above zero, red otherwise.
pub fn signed_color(value: f64) -> Color {
    if value > 0.0 {
        C_POSITIVE
    } else {
        C_NEGATIVE
    }
}
