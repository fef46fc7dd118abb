use skittles_shared::math::clamp_pixel_ratio;

/// Canvas sizing state: CSS size plus the clamped device pixel ratio.
///
/// The drawing buffer is `floor(css * pixel_ratio)`, never smaller than 1x1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub css_width: u32,
    pub css_height: u32,
    pub pixel_ratio: f64,
    pub max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(css_width: u32, css_height: u32, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            css_width,
            css_height,
            pixel_ratio: 1.0,
            max_pixel_ratio,
        };
        viewport.set_pixel_ratio(device_pixel_ratio);
        viewport
    }

    pub fn set_size(&mut self, css_width: u32, css_height: u32) {
        self.css_width = css_width;
        self.css_height = css_height;
    }

    /// Store `min(device_pixel_ratio, max_pixel_ratio)`.
    pub fn set_pixel_ratio(&mut self, device_pixel_ratio: f64) {
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio, self.max_pixel_ratio);
    }

    /// Physical size of the drawing buffer in pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |css: u32| ((css as f64 * self.pixel_ratio).floor() as u32).max(1);
        (scale(self.css_width), scale(self.css_height))
    }
}
