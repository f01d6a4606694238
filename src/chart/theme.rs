//! Per-call chart styling
//!
//! A [`Theme`] is resolved from the requested [`ChartStyle`] for every
//! render and passed down explicitly. Nothing here is global.

use plotters::style::RGBColor;

use super::ChartStyle;

/// Colors used by one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: RGBColor,
    pub text: RGBColor,
    pub grid: RGBColor,
    /// Markers, bars and lines
    pub primary: RGBColor,
    /// Network nodes
    pub node: RGBColor,
    /// Mean reference line
    pub mean: RGBColor,
    /// Median reference line
    pub median: RGBColor,
}

impl Theme {
    pub fn for_style(style: ChartStyle) -> Self {
        match style {
            ChartStyle::Default => Theme {
                background: RGBColor(0xff, 0xff, 0xff),
                text: RGBColor(0x2c, 0x3e, 0x50),
                grid: RGBColor(0xb0, 0xb0, 0xb0),
                primary: RGBColor(0x1f, 0x77, 0xb4),
                node: RGBColor(0xad, 0xd8, 0xe6),
                mean: RGBColor(0xd6, 0x27, 0x28),
                median: RGBColor(0x2c, 0xa0, 0x2c),
            },
            ChartStyle::Seaborn => Theme {
                background: RGBColor(0xea, 0xea, 0xf2),
                text: RGBColor(0x26, 0x26, 0x26),
                grid: RGBColor(0xff, 0xff, 0xff),
                primary: RGBColor(0x4c, 0x72, 0xb0),
                node: RGBColor(0xa1, 0xc9, 0xf4),
                mean: RGBColor(0xc4, 0x4e, 0x52),
                median: RGBColor(0x55, 0xa8, 0x68),
            },
            ChartStyle::Ggplot => Theme {
                background: RGBColor(0xe5, 0xe5, 0xe5),
                text: RGBColor(0x55, 0x55, 0x55),
                grid: RGBColor(0xff, 0xff, 0xff),
                primary: RGBColor(0x34, 0x8a, 0xbd),
                node: RGBColor(0x98, 0x8e, 0xd5),
                mean: RGBColor(0xe2, 0x4a, 0x33),
                median: RGBColor(0x8e, 0xba, 0x42),
            },
            ChartStyle::DarkBackground => Theme {
                background: RGBColor(0x00, 0x00, 0x00),
                text: RGBColor(0xff, 0xff, 0xff),
                grid: RGBColor(0x44, 0x44, 0x44),
                primary: RGBColor(0x8d, 0xd3, 0xc7),
                node: RGBColor(0x80, 0xb1, 0xd3),
                mean: RGBColor(0xfa, 0x81, 0x74),
                median: RGBColor(0xb3, 0xde, 0x69),
            },
        }
    }
}

/// Linear blend between two colors, `t` clamped to `[0, 1]`
pub fn blend(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Sequential light-to-dark blue scale
pub fn blues(t: f64) -> RGBColor {
    blend(RGBColor(0xf7, 0xfb, 0xff), RGBColor(0x08, 0x30, 0x6b), t)
}

/// Diverging blue-white-red scale
pub fn coolwarm(t: f64) -> RGBColor {
    let cool = RGBColor(0x3b, 0x4c, 0xc0);
    let neutral = RGBColor(0xdd, 0xdd, 0xdd);
    let warm = RGBColor(0xb4, 0x04, 0x26);
    if t < 0.5 {
        blend(cool, neutral, t * 2.0)
    } else {
        blend(neutral, warm, (t - 0.5) * 2.0)
    }
}

/// Position of `value` inside `[lo, hi]`, 0.5 when the range is empty
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.5;
    }
    let span = hi - lo;
    if span.is_finite() {
        (value - lo) / span
    } else {
        // halved so extreme spans stay finite
        (value * 0.5 - lo * 0.5) / (hi * 0.5 - lo * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_endpoints() {
        let a = RGBColor(0, 0, 0);
        let b = RGBColor(200, 100, 50);
        assert_eq!(blend(a, b, 0.0), a);
        assert_eq!(blend(a, b, 1.0), b);
        assert_eq!(blend(a, b, 0.5), RGBColor(100, 50, 25));
        assert_eq!(blend(a, b, 7.0), b);
        assert_eq!(blend(a, b, f64::NAN), a);
    }

    #[test]
    fn test_coolwarm_midpoint_is_neutral() {
        assert_eq!(coolwarm(0.5), RGBColor(0xdd, 0xdd, 0xdd));
        assert_eq!(coolwarm(0.0), RGBColor(0x3b, 0x4c, 0xc0));
        assert_eq!(coolwarm(1.0), RGBColor(0xb4, 0x04, 0x26));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.5);
        assert_eq!(normalize(0.0, -1e308, 1e308), 0.5);
        assert_eq!(normalize(1e308, -1e308, 1e308), 1.0);
    }

    #[test]
    fn test_styles_differ() {
        let light = Theme::for_style(ChartStyle::Default);
        let dark = Theme::for_style(ChartStyle::DarkBackground);
        assert_ne!(light.background, dark.background);
        assert_ne!(light.text, dark.text);
    }
}
