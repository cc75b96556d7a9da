use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::models::Rect;

/// Sub-rectangle of a frame in native pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps the on-screen overlay onto the frame's native pixels.
///
/// `video` and `overlay` are display rects; `native` is the frame size the
/// camera delivers. Returns `None` (decode the full frame) when the mapping is
/// meaningless or the region would be thinner than `min_side` on either axis.
pub fn map_crop_region(
    video: Rect,
    overlay: Rect,
    native: (u32, u32),
    min_side: u32,
) -> Option<CropRegion> {
    let (native_w, native_h) = native;
    if video.is_degenerate() || overlay.is_degenerate() || native_w == 0 || native_h == 0 {
        return None;
    }

    let scale_x = native_w as f64 / video.width;
    let scale_y = native_h as f64 / video.height;

    let left = ((overlay.x - video.x) * scale_x).max(0.0);
    let top = ((overlay.y - video.y) * scale_y).max(0.0);
    let right = ((overlay.x + overlay.width - video.x) * scale_x).min(native_w as f64);
    let bottom = ((overlay.y + overlay.height - video.y) * scale_y).min(native_h as f64);

    if right <= left || bottom <= top {
        return None;
    }

    let x = left.round() as u32;
    let y = top.round() as u32;
    let width = (right.round() as u32).saturating_sub(x);
    let height = (bottom.round() as u32).saturating_sub(y);

    if width < min_side || height < min_side {
        return None;
    }

    Some(CropRegion {
        x,
        y,
        width,
        height,
    })
}

/// Copies `region` out of `frame`, or hands back the frame untouched.
pub fn crop_frame(frame: RgbaImage, region: Option<CropRegion>) -> RgbaImage {
    match region {
        Some(r) => imageops::crop_imm(&frame, r.x, r.y, r.width, r.height).to_image(),
        None => frame,
    }
}
