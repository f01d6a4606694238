//! Per-call drawing context
//!
//! Each render owns a fresh RGB pixel buffer and a bitmap drawing area over
//! it. The drawing area is dropped before the buffer is encoded, on success
//! and on error alike, so no figure state outlives the call.

use std::error::Error;
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use super::ChartError;

/// Drawing area handed to the chart painters
pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Outcome of a painter; plotting errors are flattened into a message
pub type DrawResult = Result<(), Box<dyn Error>>;

/// Family name every painter asks for
pub const FONT_FAMILY: &str = "sans-serif";

static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONTS: OnceLock<Result<(), String>> = OnceLock::new();

/// Register the bundled font with the plotting library (once per process)
pub fn ensure_fonts() -> Result<(), ChartError> {
    FONTS
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, DEJAVU_SANS)
                .map_err(|_| "bundled font could not be parsed".to_string())
        })
        .clone()
        .map_err(ChartError::Render)
}

/// Paint onto a fresh `width`×`height` canvas and return PNG bytes
pub fn render_png<F>(width: u32, height: u32, paint: F) -> Result<Vec<u8>, ChartError>
where
    F: FnOnce(&Area<'_>) -> DrawResult,
{
    ensure_fonts()?;

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        paint(&root).map_err(|e| ChartError::Render(e.to_string()))?;
        root.present()
            .map_err(|e| ChartError::Render(e.to_string()))?;
    }

    encode_png(&pixels, width, height)
}

/// Encode a packed RGB buffer as PNG
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let encode_error = |e: png::EncodingError| ChartError::Render(format!("PNG encoding failed: {}", e));

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer.write_image_data(pixels).map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_encode_png_signature() {
        let pixels = vec![255u8; 4 * 3 * 3];
        let png = encode_png(&pixels, 4, 3).unwrap();
        assert_eq!(png[..8], PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let pixels = vec![0u8; 5];
        assert!(matches!(encode_png(&pixels, 4, 3), Err(ChartError::Render(_))));
    }

    #[test]
    fn test_render_blank_canvas() {
        let png = render_png(32, 24, |root| {
            root.fill(&WHITE)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(png[..8], PNG_SIGNATURE);
    }

    #[test]
    fn test_painter_error_is_reported() {
        let result = render_png(16, 16, |_root| Err("boom".into()));
        match result {
            Err(ChartError::Render(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_fonts_register_repeatedly() {
        assert!(ensure_fonts().is_ok());
        assert!(ensure_fonts().is_ok());
    }
}
