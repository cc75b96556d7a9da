use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;

use super::{DecodeError, FrameDecoder, LibraryLoader};

/// Pure-Rust QR decoder backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl FrameDecoder for RqrrDecoder {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn decode(&self, frame: &RgbaImage) -> Result<Option<String>, DecodeError> {
        let gray = image::imageops::grayscale(frame);
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let mut prepared =
            ::rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                gray.get_pixel(x as u32, y as u32).0[0]
            });

        let mut last_err = None;
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(Some(content)),
                Err(err) => last_err = Some(format!("{err:?}")),
            }
        }

        match last_err {
            Some(err) => Err(DecodeError::Transient(err)),
            None => Ok(None),
        }
    }
}

/// Loader for [`RqrrDecoder`]. Always succeeds since the decoder is linked in.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrLoader;

#[async_trait]
impl LibraryLoader for RqrrLoader {
    fn name(&self) -> &str {
        "rqrr"
    }

    async fn load(&self) -> Result<Arc<dyn FrameDecoder>, DecodeError> {
        Ok(Arc::new(RqrrDecoder))
    }
}

/// Renders `payload` as a black-on-white QR code, `scale` pixels per module
/// with a four-module quiet zone.
#[cfg(test)]
pub(crate) fn render_qr(payload: &str, scale: u32) -> RgbaImage {
    use image::Rgba;
    use qrcode::{Color, QrCode};

    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let side = (modules + 2 * quiet) * scale;

    RgbaImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / scale, y / scale);
        let inside = (quiet..quiet + modules).contains(&mx) && (quiet..quiet + modules).contains(&my);
        let dark = inside
            && colors[((my - quiet) * modules + (mx - quiet)) as usize] == Color::Dark;
        if dark {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn decodes_rendered_label_url() {
        let frame = render_qr("https://yard.example/truss/118/", 6);
        assert_eq!(
            RqrrDecoder.decode(&frame),
            Ok(Some("https://yard.example/truss/118/".to_string()))
        );
    }

    #[test]
    fn decodes_code_inside_larger_frame() {
        let code = render_qr("T-42", 4);
        let mut frame = RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255]));
        image::imageops::overlay(&mut frame, &code, 120, 60);
        assert_eq!(RqrrDecoder.decode(&frame), Ok(Some("T-42".to_string())));
    }

    #[test]
    fn blank_frame_has_no_code() {
        let frame = RgbaImage::from_pixel(120, 80, Rgba([255, 255, 255, 255]));
        assert_eq!(RqrrDecoder.decode(&frame), Ok(None));
    }

    #[test]
    fn empty_frame_is_not_an_error() {
        let frame = RgbaImage::new(0, 0);
        assert_eq!(RqrrDecoder.decode(&frame), Ok(None));
    }
}
