use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

use crate::data::model::Metric;

// ---------------------------------------------------------------------------
// Static series colours
// ---------------------------------------------------------------------------

/// Fixed colour per metric, as CSS colour names.
pub fn series_color(metric: Metric) -> &'static str {
    match metric {
        Metric::HomePriceIndex => "blue",
        Metric::MortgageRate => "red",
        Metric::Cpi => "orange",
        Metric::UnemploymentRate => "green",
        Metric::MedianIncome => "purple",
        Metric::HousingStarts => "brown",
        Metric::RealGdp => "teal",
    }
}

/// Fill used for the yearly box plot.
pub const BOX_FILL: &str = "skyblue";

/// Marker colour for the pair-plot cells.
pub const PAIR_MARKER: &str = "steelblue";

// ---------------------------------------------------------------------------
// Name → Color32
// ---------------------------------------------------------------------------

/// Resolve a CSS colour name or `#rrggbb` string. Unknown names map to gray.
pub fn resolve(name: &str) -> Color32 {
    let rgb: Option<Srgb<u8>> = if name.starts_with('#') {
        name.parse().ok()
    } else {
        palette::named::from_str(&name.to_ascii_lowercase())
    };
    match rgb {
        Some(c) => Color32::from_rgb(c.red, c.green, c.blue),
        None => {
            log::warn!("Unknown colour '{name}', using gray");
            Color32::GRAY
        }
    }
}

// ---------------------------------------------------------------------------
// Continuous colour scales
// ---------------------------------------------------------------------------

const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

const COOLWARM: [(u8, u8, u8); 3] = [(0x3b, 0x4c, 0xc0), (0xdd, 0xdd, 0xdd), (0xb4, 0x04, 0x26)];

/// Sample a piecewise-linear scale through `stops` at `t ∈ [0, 1]`.
fn sample(stops: &[(u8, u8, u8)], t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let scaled = t * (stops.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = (scaled - lo as f64) as f32;

    let to_linear = |(r, g, b): (u8, u8, u8)| -> LinSrgb { Srgb::new(r, g, b).into_format::<f32>().into_linear() };
    let mixed = to_linear(stops[lo]).mix(to_linear(stops[lo + 1]), frac);
    let out: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
    format!("#{:02x}{:02x}{:02x}", out.red, out.green, out.blue)
}

/// Viridis sequential scale.
pub fn viridis(t: f64) -> String {
    sample(&VIRIDIS, t)
}

/// Blue–white–red diverging scale, as used for correlation heatmaps.
pub fn coolwarm(t: f64) -> String {
    sample(&COOLWARM, t)
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32 + 0.587 * background.g() as f32 + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}
