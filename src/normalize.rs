//! Turns a raw decoded frame into the canonical comparison image: a fixed
//! crop followed by a resize to fixed target dimensions. Everything here is
//! pure, the same frame always normalizes to the same canonical image.

use image::imageops::{self, crop_imm, FilterType};
use image::RgbImage;

use crate::utils::imgutils;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("crop rectangle is degenerate: top={top} bottom={bottom} left={left} right={right}")]
    BadCrop {
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
    },
    #[error("crop rectangle {crop:?} does not fit in a {width}x{height} frame")]
    CropOutOfBounds {
        crop: CropRect,
        width: u32,
        height: u32,
    },
    #[error("target height must not be zero")]
    ZeroHeight,
    #[error("crop {crop:?} scaled to height {out_height} leaves no width")]
    ZeroWidth { crop: CropRect, out_height: u32 },
}

/// The slide area within the source frame, in source pixel coordinates.
/// Rows `top..bottom` and columns `left..right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
}

impl CropRect {
    pub fn new(top: u32, bottom: u32, left: u32, right: u32) -> Result<Self, ConfigError> {
        if top >= bottom || left >= right {
            return Err(ConfigError::BadCrop {
                top,
                bottom,
                left,
                right,
            });
        }
        Ok(Self {
            top,
            bottom,
            left,
            right,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    fn fits_in(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }
}

/// Fixed output resolution for all canonical images of one job. Derived once
/// from the crop rectangle's aspect ratio and the configured output height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDims {
    pub width: u32,
    pub height: u32,
}

impl TargetDims {
    pub fn derive(crop: &CropRect, out_height: u32) -> Result<Self, ConfigError> {
        if out_height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        let width = imgutils::new_width_same_ratio(crop.width(), crop.height(), out_height);
        // floor division can eat the last pixel of a sliver-thin crop
        if width == 0 {
            return Err(ConfigError::ZeroWidth {
                crop: *crop,
                out_height,
            });
        }
        Ok(Self {
            width,
            height: out_height,
        })
    }
}

/// Crops the raw frame and resizes the cropped region to the target
/// dimensions with bilinear interpolation.
pub fn normalize(
    raw: &RgbImage,
    crop: &CropRect,
    dims: &TargetDims,
) -> Result<RgbImage, ConfigError> {
    if !crop.fits_in(raw.width(), raw.height()) {
        return Err(ConfigError::CropOutOfBounds {
            crop: *crop,
            width: raw.width(),
            height: raw.height(),
        });
    }

    let view = crop_imm(raw, crop.left, crop.top, crop.width(), crop.height());
    Ok(imageops::resize(
        &*view,
        dims.width,
        dims.height,
        FilterType::Triangle,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::imgutils::filled;

    #[test]
    fn degenerate_rectangles_are_rejected() {
        assert!(matches!(
            CropRect::new(100, 100, 0, 10),
            Err(ConfigError::BadCrop { .. })
        ));
        assert!(matches!(
            CropRect::new(100, 50, 0, 10),
            Err(ConfigError::BadCrop { .. })
        ));
        assert!(matches!(
            CropRect::new(0, 10, 7, 7),
            Err(ConfigError::BadCrop { .. })
        ));
    }

    #[test]
    fn dims_follow_the_crop_ratio() {
        let crop = CropRect::new(0, 100, 0, 200).unwrap();
        let dims = TargetDims::derive(&crop, 50).unwrap();
        assert_eq!(
            TargetDims {
                width: 100,
                height: 50
            },
            dims
        );
        assert!(matches!(
            TargetDims::derive(&crop, 0),
            Err(ConfigError::ZeroHeight)
        ));
    }

    #[test]
    fn a_sliver_crop_cannot_reach_zero_width() {
        // 1 source column over 100 rows scales to width 50*1/100 = 0
        let crop = CropRect::new(0, 100, 0, 1).unwrap();
        assert!(matches!(
            TargetDims::derive(&crop, 50),
            Err(ConfigError::ZeroWidth { .. })
        ));
        // at the crop's own height the width survives
        assert_eq!(
            TargetDims {
                width: 1,
                height: 100
            },
            TargetDims::derive(&crop, 100).unwrap()
        );
    }

    #[test]
    fn crop_larger_than_the_frame_is_fatal() {
        let crop = CropRect::new(0, 100, 0, 200).unwrap();
        let dims = TargetDims::derive(&crop, 50).unwrap();
        let small = filled(199, 100, 0, 0, 0);
        assert!(matches!(
            normalize(&small, &crop, &dims),
            Err(ConfigError::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn output_has_the_target_dimensions() {
        let crop = CropRect::new(10, 110, 20, 220).unwrap();
        let dims = TargetDims::derive(&crop, 50).unwrap();
        let frame = filled(640, 360, 90, 90, 90);
        let canon = normalize(&frame, &crop, &dims).unwrap();
        assert_eq!(dims.width, canon.width());
        assert_eq!(dims.height, canon.height());
    }

    #[test]
    fn normalize_is_deterministic() {
        let crop = CropRect::new(0, 36, 0, 64).unwrap();
        let dims = TargetDims::derive(&crop, 18).unwrap();
        let mut frame = filled(64, 36, 10, 20, 30);
        frame.put_pixel(5, 5, image::Rgb([200, 100, 0]));

        let a = normalize(&frame, &crop, &dims).unwrap();
        let b = normalize(&frame, &crop, &dims).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
