use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::classify::{Diagnosis, ThresholdTable};

// ---------------------------------------------------------------------------
// Severity palette
// ---------------------------------------------------------------------------

/// Generates `n` colours running from green (least severe) to red (most
/// severe) at evenly spaced hues.
pub fn severity_palette(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl(120.0)],
        _ => (0..n)
            .map(|i| hsl(120.0 * (1.0 - i as f32 / (n - 1) as f32)))
            .collect(),
    }
}

fn hsl(hue: f32) -> Color32 {
    let hsl = Hsl::new(hue, 0.75, 0.45);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: diagnosis → Color32
// ---------------------------------------------------------------------------

/// Maps the diagnoses of a threshold table to severity colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    colors: Vec<Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(thresholds: &ThresholdTable) -> Self {
        ColorMap {
            colors: severity_palette(thresholds.len()),
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a diagnosis.
    pub fn color_for(&self, diagnosis: Diagnosis) -> Color32 {
        self.colors
            .get(diagnosis.rank())
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (label → colour) for the UI.
    pub fn legend_entries(&self, thresholds: &ThresholdTable) -> Vec<(String, Color32)> {
        thresholds
            .diagnoses()
            .map(|d| (thresholds.label(d).to_string(), self.color_for(d)))
            .collect()
    }
}
