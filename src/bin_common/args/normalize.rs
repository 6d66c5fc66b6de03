use clap::Args;

use crate::normalize::{ConfigError, CropRect, TargetDims};

// Defaults match a 1280x720 screen capture where the slide area sits inside
// the player chrome.
pub const DEFAULT_CROP_TOP: u32 = 68;
pub const DEFAULT_CROP_BOTTOM: u32 = 681;
pub const DEFAULT_CROP_LEFT: u32 = 72;
pub const DEFAULT_CROP_RIGHT: u32 = 1223;
pub const DEFAULT_OUT_HEIGHT: u32 = 900;

#[derive(Args, Debug)]
pub struct NormalizeCli {
    /// First row of the slide area, in source pixels
    #[arg(long, default_value_t = DEFAULT_CROP_TOP)]
    crop_top: u32,

    /// One past the last row of the slide area
    #[arg(long, default_value_t = DEFAULT_CROP_BOTTOM)]
    crop_bottom: u32,

    /// First column of the slide area
    #[arg(long, default_value_t = DEFAULT_CROP_LEFT)]
    crop_left: u32,

    /// One past the last column of the slide area
    #[arg(long, default_value_t = DEFAULT_CROP_RIGHT)]
    crop_right: u32,

    /// Height of the canonical images and output pages, the width follows
    /// the crop's aspect ratio
    #[arg(long, default_value_t = DEFAULT_OUT_HEIGHT)]
    out_height: u32,
}

impl NormalizeCli {
    pub fn to_args(&self) -> Result<NormalizeArgs, ConfigError> {
        let crop = CropRect::new(
            self.crop_top,
            self.crop_bottom,
            self.crop_left,
            self.crop_right,
        )?;
        let dims = TargetDims::derive(&crop, self.out_height)?;
        Ok(NormalizeArgs { crop, dims })
    }
}

pub struct NormalizeArgs {
    crop: CropRect,
    dims: TargetDims,
}

impl NormalizeArgs {
    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn dims(&self) -> TargetDims {
        self.dims
    }
}
