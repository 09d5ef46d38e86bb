//! Equirectangular to perspective reprojection.
//!
//! Each output pixel casts a ray through a pinhole camera looking along
//! `+z`, rotates it by pitch about the x axis and then by heading about the
//! y axis, and samples the panorama at the ray's longitude/latitude:
//!
//! ```text
//! theta = atan2(x, z)          longitude, -PI..PI
//! phi   = asin(y)              latitude,  -PI/2..PI/2
//! pano_x = (theta + PI) / 2PI * W
//! pano_y = (PI/2 - phi) / PI  * H
//! ```
//!
//! Heading 0 looks at the panorama's horizontal centre. Sampling is nearest
//! neighbour. Rows are independent and rendered in parallel.

use image::RgbImage;
use rayon::prelude::*;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::coord::Heading;

/// Default horizontal field of view in degrees.
pub const DEFAULT_FOV: f64 = 90.0;

/// Default camera pitch in degrees.
pub const DEFAULT_PITCH: f64 = 0.0;

/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 960;

/// Camera parameters for one perspective view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Heading in the panorama's own frame (already calibrated).
    pub heading: Heading,
    /// Pitch in degrees. Positive values tilt the camera toward the ground.
    pub pitch: f64,
    /// Field of view in degrees.
    pub fov: f64,
    pub width: u32,
    pub height: u32,
}

impl ViewParams {
    pub fn new(heading: Heading, width: u32, height: u32) -> Self {
        Self {
            heading,
            pitch: DEFAULT_PITCH,
            fov: DEFAULT_FOV,
            width,
            height,
        }
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = fov;
        self
    }
}

/// Precomputed per-view constants.
struct Camera {
    tan_half_fov: f64,
    aspect: f64,
    cos_pitch: f64,
    sin_pitch: f64,
    cos_heading: f64,
    sin_heading: f64,
}

impl Camera {
    fn new(view: &ViewParams) -> Self {
        let pitch = view.pitch.to_radians();
        let heading = view.heading.radians();
        Self {
            tan_half_fov: (view.fov.to_radians() / 2.0).tan(),
            aspect: f64::from(view.width) / f64::from(view.height),
            cos_pitch: pitch.cos(),
            sin_pitch: pitch.sin(),
            cos_heading: heading.cos(),
            sin_heading: heading.sin(),
        }
    }

    /// Spherical angles `(theta, phi)` of the ray through normalized view
    /// plane point `(nx, ny)`.
    fn ray_angles(&self, nx: f64, ny: f64) -> (f64, f64) {
        let x = nx * self.tan_half_fov * self.aspect;
        let y = ny * self.tan_half_fov;
        let z = 1.0;

        let len = (x * x + y * y + z * z).sqrt();
        let (vx, vy, vz) = (x / len, y / len, z / len);

        // Pitch about x.
        let vy2 = vy * self.cos_pitch - vz * self.sin_pitch;
        let vz2 = vy * self.sin_pitch + vz * self.cos_pitch;

        // Heading about y.
        let vx3 = vx * self.cos_heading + vz2 * self.sin_heading;
        let vz3 = -vx * self.sin_heading + vz2 * self.cos_heading;

        (vx3.atan2(vz3), vy2.clamp(-1.0, 1.0).asin())
    }
}

/// Stateless perspective projector.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerspectiveProjector;

impl PerspectiveProjector {
    pub fn new() -> Self {
        Self
    }

    /// Render the perspective view of `panorama` described by `view`.
    ///
    /// The output is always exactly `view.width` x `view.height` RGB.
    pub fn project(&self, panorama: &RgbImage, view: &ViewParams) -> RgbImage {
        let (out_w, out_h) = (view.width, view.height);
        let mut output = RgbImage::new(out_w, out_h);
        if out_w == 0 || out_h == 0 || panorama.width() == 0 || panorama.height() == 0 {
            return output;
        }

        let camera = Camera::new(view);
        let pano_w = f64::from(panorama.width());
        let pano_h = f64::from(panorama.height());
        let max_row = i64::from(panorama.height()) - 1;
        let row_len = out_w as usize * 3;

        output
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(out_y, row)| {
                let ny = 1.0 - 2.0 * out_y as f64 / f64::from(out_h);
                for (out_x, pixel) in row.chunks_exact_mut(3).enumerate() {
                    let nx = 2.0 * out_x as f64 / f64::from(out_w) - 1.0;
                    let (theta, phi) = camera.ray_angles(nx, ny);

                    let pano_x = (theta + PI) / (2.0 * PI) * pano_w;
                    let pano_y = (FRAC_PI_2 - phi) / PI * pano_h;

                    let src_x = (pano_x.floor() as i64).rem_euclid(i64::from(panorama.width()));
                    let src_y = (pano_y.floor() as i64).clamp(0, max_row);

                    let src = panorama.get_pixel(src_x as u32, src_y as u32);
                    pixel.copy_from_slice(&src.0);
                }
            });

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GREY: Rgb<u8> = Rgb([90, 90, 90]);

    /// 360x180 panorama, grey with a red vertical stripe at `column`.
    fn striped_panorama(column: u32) -> RgbImage {
        RgbImage::from_fn(360, 180, |x, _| {
            if x.abs_diff(column) <= 1 {
                RED
            } else {
                GREY
            }
        })
    }

    #[test]
    fn test_output_dimensions_match_request() {
        let pano = striped_panorama(180);
        let out =
            PerspectiveProjector::new().project(&pano, &ViewParams::new(Heading::NORTH, 64, 48));
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn test_heading_zero_centers_panorama_middle() {
        let pano = striped_panorama(180);
        let out =
            PerspectiveProjector::new().project(&pano, &ViewParams::new(Heading::NORTH, 64, 48));

        assert_eq!(*out.get_pixel(32, 24), RED);
        assert_eq!(*out.get_pixel(32, 0), RED);
        assert_eq!(*out.get_pixel(0, 24), GREY);
        assert_eq!(*out.get_pixel(63, 24), GREY);
    }

    #[test]
    fn test_heading_ninety_looks_three_quarters_across() {
        let pano = striped_panorama(270);
        let out = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::new(90.0), 64, 48));

        assert_eq!(*out.get_pixel(32, 24), RED);
        assert_eq!(*out.get_pixel(0, 24), GREY);
    }

    #[test]
    fn test_longitude_wraps_at_seam() {
        // Heading 180 looks at the left/right seam of the panorama.
        let pano = RgbImage::from_fn(360, 180, |x, _| if x < 2 || x >= 358 { RED } else { GREY });
        let out = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::new(180.0), 64, 48));

        assert_eq!(*out.get_pixel(32, 24), RED);
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn test_positive_pitch_looks_down() {
        let pano = RgbImage::from_fn(360, 180, |_, y| if y >= 120 { RED } else { GREY });
        let level = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::NORTH, 32, 32));
        let tilted = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::NORTH, 32, 32).with_pitch(60.0));

        assert_eq!(*level.get_pixel(16, 16), GREY);
        assert_eq!(*tilted.get_pixel(16, 16), RED);
    }

    #[test]
    fn test_narrow_fov_zooms_in() {
        let pano = striped_panorama(180);
        let wide = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::NORTH, 100, 50));
        let narrow = PerspectiveProjector::new()
            .project(&pano, &ViewParams::new(Heading::NORTH, 100, 50).with_fov(20.0));

        let red_columns =
            |img: &RgbImage| (0..100).filter(|&x| *img.get_pixel(x, 25) == RED).count();
        assert!(red_columns(&narrow) > red_columns(&wide));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let pano = RgbImage::from_fn(200, 100, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let view = ViewParams::new(Heading::new(33.0), 40, 30);
        let a = PerspectiveProjector::new().project(&pano, &view);
        let b = PerspectiveProjector::new().project(&pano, &view);
        assert_eq!(a, b);
    }
}
