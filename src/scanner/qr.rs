use super::camera::{DecodeError, DetectionRegion, Frame, QrDecoder};

/// QR decoding of the detection square using `rqrr`.
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &Frame, region: DetectionRegion) -> Result<String, DecodeError> {
        let (x0, y0, w, h) = region.within(frame.width, frame.height);
        if w == 0 || h == 0 {
            return Err(DecodeError::NotFound);
        }

        let mut img = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            frame.pixel(x0 + x as u32, y0 + y as u32)
        });

        let grids = img.detect_grids();
        let grid = grids.first().ok_or(DecodeError::NotFound)?;

        let (_meta, content) = grid
            .decode()
            .map_err(|e| DecodeError::Unreadable(format!("{e:?}")))?;
        Ok(content)
    }
}
