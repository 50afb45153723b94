use palette::{Hsl, IntoColor, Srgb};

/// Used for ids outside the palette.
const FALLBACK_COLOR: &str = "#808080";

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues, as `#rrggbb`.
pub fn generate_palette(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cluster id → colour
// ---------------------------------------------------------------------------

/// One colour per cluster id, shared by every chart a host draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPalette {
    colors: Vec<String>,
}

impl ClusterPalette {
    pub fn new(k: usize) -> Self {
        ClusterPalette {
            colors: generate_palette(k),
        }
    }

    pub fn color_for(&self, cluster_id: usize) -> &str {
        self.colors
            .get(cluster_id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Legend entries (`"Cluster 0"` → colour) for the host.
    pub fn legend(&self) -> Vec<(String, String)> {
        self.colors
            .iter()
            .enumerate()
            .map(|(id, c)| (format!("Cluster {id}"), c.clone()))
            .collect()
    }
}
