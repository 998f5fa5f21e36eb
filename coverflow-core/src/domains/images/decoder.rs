use super::{ImageHandle, RasterImage};
use crate::error::ImageError;

/// Turns a raw payload into a drawable image. Runs on the blocking pool.
pub trait ImageDecoder: Send + Sync + 'static {
    fn decode(&self, payload: &[u8]) -> Result<ImageHandle, ImageError>;
}

impl<F> ImageDecoder for F
where
    F: Fn(&[u8]) -> Result<ImageHandle, ImageError> + Send + Sync + 'static,
{
    fn decode(&self, payload: &[u8]) -> Result<ImageHandle, ImageError> {
        self(payload)
    }
}

/// Decodes any format the `image` crate was built with into RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, payload: &[u8]) -> Result<ImageHandle, ImageError> {
        if payload.is_empty() {
            return Err(ImageError::Decode("empty payload".to_string()));
        }
        let rgba = image::load_from_memory(payload)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(RasterImage::new(width, height, rgba.into_raw()))
    }
}
