//! QR rendering for invitation URLs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use digicred_core::{DigiCredError, Result};
use qrcode::QrCode;
use qrcode::render::svg;

/// Encode `data` as an SVG QR code wrapped in a `data:` URL, ready for an
/// `<img src>`.
pub fn to_data_url(data: &str, min_dimension: u32) -> Result<String> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| DigiCredError::QrCode(e.to_string()))?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(min_dimension, min_dimension)
        .build();
    Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
}

/// An HTML image tag showing the QR data URL.
pub fn img_tag(data_url: &str) -> String {
    format!(r#"<img src="{data_url}" alt="QR Code" />"#)
}

/// Render `data` for a terminal with Unicode half-blocks, two modules per
/// character row.
pub fn render_terminal(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| DigiCredError::QrCode(e.to_string()))?;
    let quiet = 1;
    let width = code.width();
    let colors: Vec<bool> = code
        .into_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();
    let at = |x: i32, y: i32| -> bool {
        if x < 0 || y < 0 || x >= width as i32 || y >= width as i32 {
            false
        } else {
            colors[(y as usize) * width + (x as usize)]
        }
    };

    let total = width as i32 + quiet * 2;
    let mut out = String::new();
    let mut y = -quiet;
    while y < total - quiet {
        for x in -quiet..total - quiet {
            out.push(match (at(x, y), at(x, y + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
        y += 2;
    }
    Ok(out)
}
