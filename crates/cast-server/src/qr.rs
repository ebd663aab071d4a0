//! QR code rendering

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Smallest edge of a rendered code, in pixels
const MIN_SIZE: u32 = 256;

#[derive(Error, Debug)]
pub enum QrError {
    /// The payload does not fit in a QR code
    #[error("Failed to encode QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    /// PNG encoding failed
    #[error("Failed to encode PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Render `data` as a black-on-white PNG QR code
pub fn render_png(data: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .build();

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}
