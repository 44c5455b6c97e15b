//! Clear colour animation.

use glam::Vec4;

/// Frames per radian of the clear-colour flash.
pub const FLASH_PERIOD_FRAMES: f64 = 120.0;

/// Clear colour for `frame_number`: black with a blue channel pulsing as
/// `|sin(frame / 120)|`.
pub fn clear_color(frame_number: u64) -> Vec4 {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let flash = (frame_number as f64 / FLASH_PERIOD_FRAMES).sin().abs() as f32;
    Vec4::new(0.0, 0.0, flash, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_frame_is_black() {
        assert_eq!(clear_color(0), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn blue_follows_sine_of_frame() {
        for frame in [1_u64, 60, 120, 188, 377, 10_000] {
            let expected = (frame as f64 / 120.0).sin().abs() as f32;
            assert_relative_eq!(clear_color(frame).z, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn blue_peaks_near_quarter_period() {
        // sin reaches 1 at pi/2, i.e. frame 60 * pi ~= 188.5
        assert_relative_eq!(clear_color(188).z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn channels_stay_in_unit_range() {
        for frame in (0..5_000).step_by(7) {
            let color = clear_color(frame);
            assert!((0.0..=1.0).contains(&color.z));
            assert_eq!(color.x, 0.0);
            assert_eq!(color.y, 0.0);
            assert_eq!(color.w, 1.0);
        }
    }
}
