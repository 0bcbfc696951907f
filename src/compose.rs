//! CPU compositing of the comparison area
//!
//! Layers, bottom to top: reference, candidate clipped from the left edge,
//! diff image, divider. The frame always has the reference's dimensions;
//! candidate and diff pixels outside their own bounds are transparent.

use image::{Rgba, RgbaImage};

use crate::state::CurrentView;

/// Divider width in pixels
const DIVIDER_WIDTH: u32 = 2;
const DIVIDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Build the frame shown for the current candidate
pub fn compose(view: &CurrentView) -> RgbaImage {
    let mut frame = (*view.reference).clone();
    let (width, height) = frame.dimensions();
    let visual = view.visual;

    let clip_x = percent_to_column(visual.candidate_clip, width);
    if visual.candidate_opacity > 0.0 && clip_x > 0 {
        layer(&mut frame, &view.candidate, clip_x, visual.candidate_opacity);
    }

    if let Some(diff) = &view.diff {
        if visual.diff_opacity > 0.0 {
            layer(&mut frame, diff, width, visual.diff_opacity);
        }
    }

    if let Some(divider) = visual.divider {
        let center = percent_to_column(divider, width);
        let start = center.saturating_sub(DIVIDER_WIDTH / 2);
        let end = (start + DIVIDER_WIDTH).min(width);
        for x in start..end {
            for y in 0..height {
                frame.put_pixel(x, y, DIVIDER_COLOR);
            }
        }
    }

    frame
}

fn percent_to_column(percent: f32, width: u32) -> u32 {
    ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as u32
}

/// Blend `top` over `frame` for columns `0..clip_x` at `opacity`
fn layer(frame: &mut RgbaImage, top: &RgbaImage, clip_x: u32, opacity: f32) {
    let columns = clip_x.min(frame.width()).min(top.width());
    let rows = frame.height().min(top.height());

    for y in 0..rows {
        for x in 0..columns {
            let over = top.get_pixel(x, y);
            let under = frame.get_pixel_mut(x, y);
            *under = blend(*under, *over, opacity);
        }
    }
}

/// Source-over with an extra layer opacity
fn blend(under: Rgba<u8>, over: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let alpha = (over[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return under;
    }

    let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8;
    let under_alpha = under[3] as f32 / 255.0;
    let out_alpha = alpha + under_alpha * (1.0 - alpha);

    Rgba([
        mix(under[0], over[0]),
        mix(under[1], over[1]),
        mix(under[2], over[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::view::Visual;
    use crate::state::CandidateId;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn view(visual: Visual, diff: bool) -> CurrentView {
        CurrentView {
            id: CandidateId(1),
            name: "a.png".into(),
            reference: Arc::new(RgbaImage::from_pixel(10, 4, RED)),
            candidate: Arc::new(RgbaImage::from_pixel(10, 4, BLUE)),
            diff: diff.then(|| Arc::new(RgbaImage::from_pixel(10, 4, GREEN))),
            visual,
        }
    }

    #[test]
    fn test_slider_wipe_splits_frame() {
        let frame = compose(&view(
            Visual { candidate_clip: 40.0, candidate_opacity: 1.0, diff_opacity: 0.0, divider: Some(40.0) },
            true,
        ));

        assert_eq!(frame.get_pixel(0, 0), &BLUE);
        assert_eq!(frame.get_pixel(2, 3), &BLUE);
        assert_eq!(frame.get_pixel(3, 0), &DIVIDER_COLOR);
        assert_eq!(frame.get_pixel(4, 0), &DIVIDER_COLOR);
        assert_eq!(frame.get_pixel(5, 0), &RED);
        assert_eq!(frame.get_pixel(9, 0), &RED);
    }

    #[test]
    fn test_full_diff_covers_candidate() {
        let frame = compose(&view(
            Visual { candidate_clip: 100.0, candidate_opacity: 1.0, diff_opacity: 1.0, divider: None },
            true,
        ));
        assert!(frame.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn test_base_reveal_shows_reference_only() {
        let frame = compose(&view(
            Visual { candidate_clip: 100.0, candidate_opacity: 0.0, diff_opacity: 0.0, divider: None },
            true,
        ));
        assert!(frame.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_smaller_candidate_leaves_reference_visible() {
        let mut current = view(
            Visual { candidate_clip: 100.0, candidate_opacity: 1.0, diff_opacity: 0.0, divider: None },
            false,
        );
        current.candidate = Arc::new(RgbaImage::from_pixel(5, 2, BLUE));

        let frame = compose(&current);
        assert_eq!(frame.dimensions(), (10, 4));
        assert_eq!(frame.get_pixel(4, 1), &BLUE);
        assert_eq!(frame.get_pixel(5, 1), &RED);
        assert_eq!(frame.get_pixel(0, 2), &RED);
    }

    #[test]
    fn test_half_opacity_blends() {
        let mixed = blend(Rgba([0, 0, 0, 255]), Rgba([200, 100, 0, 255]), 0.5);
        assert_eq!(mixed, Rgba([100, 50, 0, 255]));
    }
}
