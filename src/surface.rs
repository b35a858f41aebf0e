use crate::foundation::core::{Region, Size};
use crate::foundation::error::{BackdropError, BackdropResult};

/// Straight-alpha RGBA8 pixel buffer, row-major, tightly packed.
///
/// `opacity` is a presentation hint for the host (the scheduler fades it during resizes); it
/// never affects the stored pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
    opacity: f32,
}

impl Surface {
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0u8; size.rgba_len()],
            opacity: 1.0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    /// Resize, discarding contents. Returns `true` when the size actually changed.
    pub fn resize(&mut self, size: Size) -> bool {
        if self.size() == size {
            return false;
        }
        self.width = size.width;
        self.height = size.height;
        self.data.clear();
        self.data.resize(size.rgba_len(), 0);
        true
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn clear_region(&mut self, region: Region) {
        let r = region.clip_to(self.size());
        if r.is_empty() {
            return;
        }
        let row_len = r.width as usize * 4;
        for y in 0..r.height as usize {
            let off = self.offset(r.x as usize, r.y as usize + y);
            self.data[off..off + row_len].fill(0);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = self.offset(x as usize, y as usize);
        let px = &self.data[off..off + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let row_len = self.width as usize * 4;
        let off = y as usize * row_len;
        &mut self.data[off..off + row_len]
    }

    /// Copy a region out as a tightly packed buffer. The region is clipped to the surface first;
    /// the returned region describes what was actually read.
    pub fn read_region(&self, region: Region) -> (Region, Vec<u8>) {
        let r = region.clip_to(self.size());
        let mut out = Vec::with_capacity(r.size().rgba_len());
        let row_len = r.width as usize * 4;
        for y in 0..r.height as usize {
            let off = self.offset(r.x as usize, r.y as usize + y);
            out.extend_from_slice(&self.data[off..off + row_len]);
        }
        (r, out)
    }

    /// Write a tightly packed `width x height` buffer at `(x, y)`, replacing pixels. Rows and
    /// columns falling outside the surface are dropped.
    pub fn put_region(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        src: &[u8],
    ) -> BackdropResult<()> {
        let expected = Size::new(width, height).rgba_len();
        if src.len() != expected {
            return Err(BackdropError::validation(format!(
                "put_region expects {expected} bytes for {width}x{height}, got {}",
                src.len()
            )));
        }
        let r = Region::new(x, y, width, height).clip_to(self.size());
        if r.is_empty() {
            return Ok(());
        }
        let src_stride = width as usize * 4;
        let skip_x = (r.x - x) as usize;
        let skip_y = (r.y - y) as usize;
        let row_len = r.width as usize * 4;
        for row in 0..r.height as usize {
            let s = (skip_y + row) * src_stride + skip_x * 4;
            let d = self.offset(r.x as usize, r.y as usize + row);
            self.data[d..d + row_len].copy_from_slice(&src[s..s + row_len]);
        }
        Ok(())
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * 4
    }
}
