//! Canvas sizing from a system's advertised aspect ratio.
//!
//! The game catalog stores one display ratio per system (`"4/3"`, `"16/9"`,
//! sometimes a bare float). The presenter sizes the video surface to the
//! largest rectangle with that ratio that fits its container.

/// A display aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
}

impl Default for AspectRatio {
    /// Most of the supported 8/16-bit systems output 4:3.
    fn default() -> Self {
        Self {
            width: 4.0,
            height: 3.0,
        }
    }
}

impl AspectRatio {
    /// Parse `"4/3"`, `"16:9"`, or a bare float like `"1.333"`.
    /// Returns `None` for anything non-positive or unparseable.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((w, h)) = s.split_once('/').or_else(|| s.split_once(':')) {
            let width: f64 = w.trim().parse().ok()?;
            let height: f64 = h.trim().parse().ok()?;
            if width > 0.0 && height > 0.0 {
                return Some(Self { width, height });
            }
            return None;
        }
        let ratio: f64 = s.parse().ok()?;
        if ratio > 0.0 {
            Some(Self {
                width: ratio,
                height: 1.0,
            })
        } else {
            None
        }
    }

    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Largest canvas with this ratio that fits inside the container.
    pub fn fit(&self, container_w: u32, container_h: u32) -> (u32, u32) {
        if container_w == 0 || container_h == 0 {
            return (0, 0);
        }
        let container_ratio = container_w as f64 / container_h as f64;
        if container_ratio > self.ratio() {
            // Height-bound: pillarbox.
            let w = (container_h as f64 * self.ratio()).round() as u32;
            (w.min(container_w), container_h)
        } else {
            // Width-bound: letterbox.
            let h = (container_w as f64 / self.ratio()).round() as u32;
            (container_w, h.min(container_h))
        }
    }
}
