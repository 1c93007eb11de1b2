//! Persistent drawing surface.
//!
//! The canvas is never cleared between frames. Each frame first erases a
//! fraction of what is already there ("destination-out"), then adds new
//! strokes on top ("lighter"), which is what leaves fading trails behind
//! every spark.

use crate::color::Rgb;

/// Hairline strokes still light the pixel they pass through.
const MIN_RADIUS: f32 = 0.75;

/// Drawing operations the renderer needs from a surface.
pub trait Surface {
    fn size(&self) -> (usize, usize);

    fn resize(&mut self, width: usize, height: usize);

    /// Fade the whole surface toward transparent by `amount` in `[0, 1]`.
    fn fade(&mut self, amount: f32);

    /// Additively stroke a segment. `alpha` scales the colour's contribution.
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, alpha: f32, width: f32);
}

/// Software surface holding premultiplied RGBA in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<[f32; 4]>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; 4] {
        self.pixels[y * self.width + x]
    }

    pub fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    /// Source-over composite onto an opaque background colour.
    pub fn composite(&self, x: usize, y: usize, bg: Rgb) -> Rgb {
        let [r, g, b, a] = self.pixel(x, y);
        let under = 1.0 - a;
        let channel = |src: f32, bg: u8| ((src + bg as f32 / 255.0 * under).min(1.0) * 255.0).round() as u8;
        (channel(r, bg.0), channel(g, bg.1), channel(b, bg.2))
    }

    fn add(&mut self, x: usize, y: usize, color: [f32; 4]) {
        let px = &mut self.pixels[y * self.width + x];
        for (dst, src) in px.iter_mut().zip(color) {
            *dst = (*dst + src).min(1.0);
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 4]; width * height];
    }

    fn fade(&mut self, amount: f32) {
        let keep = 1.0 - amount.clamp(0.0, 1.0);
        for px in &mut self.pixels {
            for channel in px.iter_mut() {
                *channel *= keep;
            }
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, alpha: f32, width: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let radius = (width * 0.5).max(MIN_RADIUS);
        let src = [
            color.0 as f32 / 255.0 * alpha,
            color.1 as f32 / 255.0 * alpha,
            color.2 as f32 / 255.0 * alpha,
            alpha,
        ];

        let min_x = (from.0.min(to.0) - radius).floor().max(0.0);
        let min_y = (from.1.min(to.1) - radius).floor().max(0.0);
        let max_x = (from.0.max(to.0) + radius).ceil().min(self.width as f32 - 1.0);
        let max_y = (from.1.max(to.1) + radius).ceil().min(self.height as f32 - 1.0);
        if !(min_x <= max_x && min_y <= max_y) {
            return;
        }

        // Each covered pixel is touched once per stroke, so additive
        // blending never double counts a segment's own overlap.
        for y in min_y as usize..=max_y as usize {
            for x in min_x as usize..=max_x as usize {
                let centre = (x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(centre, from, to) <= radius {
                    self.add(x, y, src);
                }
            }
        }
    }
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + dx * t, a.1 + dy * t);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(canvas: &Canvas) -> usize {
        let (w, h) = canvas.size();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y)[3] > 0.0)
            .count()
    }

    #[test]
    fn horizontal_stroke_covers_its_row_once() {
        let mut canvas = Canvas::new(10, 5);
        canvas.stroke_line((1.5, 2.5), (7.5, 2.5), (255, 0, 0), 0.5, 1.0);
        assert_eq!(lit(&canvas), 7);
        assert_eq!(canvas.pixel(4, 2), [0.5, 0.0, 0.0, 0.5]);
        assert_eq!(canvas.pixel(4, 1), [0.0; 4]);
    }

    #[test]
    fn strokes_accumulate_toward_white() {
        let mut canvas = Canvas::new(4, 4);
        for color in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (255, 255, 255)] {
            canvas.stroke_line((1.5, 1.5), (1.5, 1.5), color, 1.0, 1.0);
        }
        assert_eq!(canvas.pixel(1, 1), [1.0; 4]);
    }

    #[test]
    fn fade_erases_a_fraction_each_frame() {
        let mut canvas = Canvas::new(3, 3);
        canvas.stroke_line((1.5, 1.5), (1.5, 1.5), (255, 255, 255), 1.0, 1.0);
        canvas.fade(0.1);
        let [r, _, _, a] = canvas.pixel(1, 1);
        assert!((r - 0.9).abs() < 1e-6 && (a - 0.9).abs() < 1e-6);
        for _ in 0..100 {
            canvas.fade(0.1);
        }
        assert!(canvas.pixel(1, 1)[3] < 1e-4);
    }

    #[test]
    fn wide_strokes_cover_more() {
        let mut thin = Canvas::new(20, 20);
        let mut wide = Canvas::new(20, 20);
        thin.stroke_line((5.0, 10.0), (15.0, 10.0), (255, 255, 255), 1.0, 1.0);
        wide.stroke_line((5.0, 10.0), (15.0, 10.0), (255, 255, 255), 1.0, 4.0);
        assert!(lit(&wide) > lit(&thin));
    }

    #[test]
    fn offscreen_strokes_are_ignored() {
        let mut canvas = Canvas::new(8, 8);
        canvas.stroke_line((-50.0, -50.0), (-40.0, -45.0), (255, 255, 255), 1.0, 2.0);
        canvas.stroke_line((100.0, 3.0), (120.0, 3.0), (255, 255, 255), 1.0, 2.0);
        assert_eq!(lit(&canvas), 0);
    }

    #[test]
    fn composite_blends_over_background() {
        let mut canvas = Canvas::new(2, 1);
        canvas.stroke_line((0.5, 0.5), (0.5, 0.5), (255, 0, 0), 0.5, 1.0);
        assert_eq!(canvas.composite(0, 0, (0, 0, 200)), (128, 0, 100));
        assert_eq!(canvas.composite(1, 0, (10, 20, 30)), (10, 20, 30));
    }

    #[test]
    fn resize_reallocates() {
        let mut canvas = Canvas::new(2, 2);
        canvas.resize(5, 3);
        assert_eq!(canvas.size(), (5, 3));
        assert_eq!(lit(&canvas), 0);
    }
}
