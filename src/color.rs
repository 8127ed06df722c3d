use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Trace colours
// ---------------------------------------------------------------------------

/// An 8-bit sRGB colour shared by the figure exporter and the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// One colour per panel: all black unless `colorize` is set.
pub fn trace_colors(n: usize, colorize: bool) -> Vec<Rgb> {
    if colorize {
        generate_palette(n)
    } else {
        vec![Rgb::BLACK; n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_default_traces_are_black() {
        assert_eq!(trace_colors(3, false), vec![Rgb::BLACK; 3]);
        assert!(generate_palette(0).is_empty());
    }
}
