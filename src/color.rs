use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::eval::risk::RiskTier;

fn hsl(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Fixed colour per risk tier: green, amber, red.
pub fn tier_color(tier: RiskTier) -> Color32 {
    match tier {
        RiskTier::Safe => hsl(130.0, 0.55, 0.45),
        RiskTier::Warning => hsl(38.0, 0.9, 0.52),
        RiskTier::HighRisk => hsl(0.0, 0.75, 0.52),
    }
}

/// Blue ramp for heat-map cells; `fraction` in [0, 1] goes from pale to dark.
pub fn heat_color(fraction: f32) -> Color32 {
    let f = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    hsl(212.0, 0.65, 0.92 - 0.55 * f)
}

/// Text colour readable on top of [`heat_color`].
pub fn heat_text_color(fraction: f32) -> Color32 {
    if luma(heat_color(fraction)) < 140 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

/// Perceived brightness, 0..=255.
fn luma(c: Color32) -> u32 {
    (c.r() as u32 * 299 + c.g() as u32 * 587 + c.b() as u32 * 114) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_colors_distinct() {
        let colors: Vec<Color32> = RiskTier::ALL.iter().map(|&t| tier_color(t)).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
        let red = tier_color(RiskTier::HighRisk);
        assert!(red.r() > red.g() && red.r() > red.b());
    }

    #[test]
    fn test_heat_darkens() {
        assert!(luma(heat_color(0.0)) > luma(heat_color(0.5)));
        assert!(luma(heat_color(0.5)) > luma(heat_color(1.0)));
        assert_eq!(heat_color(2.0), heat_color(1.0));
        assert_eq!(heat_color(f32::NAN), heat_color(0.0));
        assert_eq!(heat_text_color(0.0), Color32::BLACK);
        assert_eq!(heat_text_color(1.0), Color32::WHITE);
    }
}
