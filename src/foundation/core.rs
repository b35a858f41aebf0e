pub use kurbo::{Affine, Point};

/// Pixel dimensions of a container, surface or source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either axis is zero, i.e. nothing can be drawn.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Integer pixel rectangle. The origin may be negative when a source overhangs its container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Intersect with `[0, bounds.width) x [0, bounds.height)`.
    pub fn clip_to(self, bounds: Size) -> Region {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + i64::from(self.width)).min(i64::from(bounds.width));
        let y1 = (self.y + i64::from(self.height)).min(i64::from(bounds.height));
        if x1 <= x0 || y1 <= y0 {
            let x = x0.min(i64::from(bounds.width));
            let y = y0.min(i64::from(bounds.height));
            return Region::new(x, y, 0, 0);
        }
        Region::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}

/// Host clock reading in milliseconds. Only differences are meaningful.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct HostTime(pub u64);

impl HostTime {
    pub fn after_ms(self, ms: u64) -> HostTime {
        HostTime(self.0.saturating_add(ms))
    }

    pub fn ms_since(self, earlier: HostTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_inner_region() {
        let r = Region::new(10, 20, 30, 40).clip_to(Size::new(100, 100));
        assert_eq!(r, Region::new(10, 20, 30, 40));
    }

    #[test]
    fn clip_trims_negative_origin_and_overhang() {
        let r = Region::new(-50, -25, 200, 100).clip_to(Size::new(100, 50));
        assert_eq!(r, Region::new(0, 0, 100, 50));
    }

    #[test]
    fn clip_outside_is_empty() {
        assert!(Region::new(200, 0, 10, 10).clip_to(Size::new(100, 100)).is_empty());
        assert!(Region::new(-20, 0, 10, 10).clip_to(Size::new(100, 100)).is_empty());
    }

    #[test]
    fn host_time_arithmetic_saturates() {
        let t = HostTime(100);
        assert_eq!(t.after_ms(250), HostTime(350));
        assert_eq!(HostTime(50).ms_since(t), 0);
        assert_eq!(t.ms_since(HostTime(40)), 60);
    }
}
