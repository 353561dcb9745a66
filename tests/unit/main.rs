//! Unit tests mirroring the `src/` layout, one file per source file

mod accumulate;
mod artifact;

/// Fixture writers shared by the filesystem-backed tests
pub(crate) mod support {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::Path;

    /// Write a single-color PNG
    pub(crate) fn write_solid_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) {
        RgbImage::from_pixel(width, height, Rgb(color))
            .save_with_format(dir.join(name), ImageFormat::Png)
            .unwrap();
    }

    /// Write bytes no decoder accepts
    pub(crate) fn write_corrupt(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"definitely not an image").unwrap();
    }
}
