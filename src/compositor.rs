use std::sync::Arc;

use crate::config::RenderConfig;
use crate::filter::FilterPipeline;
use crate::foundation::core::{Point, Region, Size};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::layout::Placement;
use crate::source::{FrameHandle, SourceAdapter, SourceKind};
use crate::surface::Surface;

/// What a render call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A new frame was composited and published.
    Drawn(Placement),
    /// The previously published static frame is still valid.
    Cached(Placement),
    /// Source not ready; nothing changed.
    Skipped,
}

/// Key of the last published frame, used to skip recomputation for unchanged static sources.
#[derive(Clone, Debug)]
struct Published {
    placement: Placement,
    config: Arc<RenderConfig>,
    frame: Arc<Vec<u8>>,
}

/// Owns the working and visible surfaces.
#[derive(Debug)]
pub struct Compositor {
    working: Surface,
    visible: Surface,
    last: Option<Published>,
    last_placement: Option<Placement>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(Size::ZERO)
    }
}

impl Compositor {
    pub fn new(size: Size) -> Self {
        Self {
            working: Surface::new(size),
            visible: Surface::new(size),
            last: None,
            last_placement: None,
        }
    }

    pub fn visible(&self) -> &Surface {
        &self.visible
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.visible.set_opacity(opacity);
    }

    /// Forget everything computed against the previous source or config.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Composite the current source frame into the visible surface.
    #[tracing::instrument(
        level = "trace",
        skip(self, source, config),
        fields(kind = ?source.kind())
    )]
    pub fn render(
        &mut self,
        source: &mut SourceAdapter,
        container: Size,
        config: &Arc<RenderConfig>,
    ) -> BackdropResult<RenderOutcome> {
        let mode = config.layout.resolve()?;

        if !source.is_ready() {
            match source.kind() {
                SourceKind::Static => {
                    tracing::info!("still image not decoded yet; waiting for the retry tick")
                }
                kind => tracing::debug!(?kind, "source not ready; skipping tick"),
            }
            return Ok(RenderOutcome::Skipped);
        }

        let frame = match source.frame() {
            Ok(f) => f,
            Err(BackdropError::SourceNotReady) => return Ok(RenderOutcome::Skipped),
            Err(e) => return Err(e),
        };
        if frame.size().is_empty() {
            tracing::debug!("source frame has zero size; skipping tick");
            return Ok(RenderOutcome::Skipped);
        }

        if self.visible.size() != container {
            self.working.resize(container);
            self.visible.resize(container);
            self.last = None;
            self.last_placement = None;
        }

        let placement = Placement::resolve(mode, container, source.size());

        if source.kind() == SourceKind::Static
            && let Some(last) = &self.last
            && last.placement == placement
            && Arc::ptr_eq(&last.config, config)
            && Arc::ptr_eq(&last.frame, &frame.rgba8)
        {
            return Ok(RenderOutcome::Cached(placement));
        }

        let dst = placement.dst();
        self.working.clear_region(dst);
        match placement {
            Placement::Blit { dst } => blit(&mut self.working, &frame, dst),
            Placement::Stretch { dst } => stretch(&mut self.working, &frame, dst),
            Placement::Tile { dst } => tile(&mut self.working, &frame, dst),
        }

        let (region, mut buf) = self.working.read_region(dst);
        FilterPipeline::from_config(&config.filters).apply_in_place(&mut buf)?;

        if self.last_placement != Some(placement) {
            self.visible.clear();
        }
        self.visible
            .put_region(region.x, region.y, region.width, region.height, &buf)?;

        self.last_placement = Some(placement);
        self.last = Some(Published {
            placement,
            config: Arc::clone(config),
            frame: Arc::clone(&frame.rgba8),
        });
        Ok(RenderOutcome::Drawn(placement))
    }
}

/// Natural-size copy. Frames whose width differs from the placement are drawn at the frame's
/// own size; the placement only fixes the origin.
fn blit(dst: &mut Surface, frame: &FrameHandle, at: Region) {
    let target = Region::new(at.x, at.y, frame.width, frame.height).clip_to(dst.size());
    for y in 0..target.height {
        let sy = (target.y - at.y) as u32 + y;
        let sx0 = (target.x - at.x) as usize;
        let src_off = ((sy as usize) * frame.width as usize + sx0) * 4;
        let len = target.width as usize * 4;
        let row = dst.row_mut(target.y as u32 + y);
        let d = target.x as usize * 4;
        row[d..d + len].copy_from_slice(&frame.rgba8[src_off..src_off + len]);
    }
}

/// Nearest-neighbour scaled copy of the whole frame into `at`.
fn stretch(dst: &mut Surface, frame: &FrameHandle, at: Region) {
    let inv = Placement::stretch_inverse(at, frame.size());
    let target = at.clip_to(dst.size());
    let max_x = frame.width.saturating_sub(1);
    let max_y = frame.height.saturating_sub(1);
    for y in 0..target.height {
        let dy = target.y as u32 + y;
        let row = dst.row_mut(dy);
        for x in 0..target.width {
            let dx = target.x as u32 + x;
            let p = inv * Point::new(f64::from(dx) + 0.5, f64::from(dy) + 0.5);
            let sx = (p.x.floor().max(0.0) as u32).min(max_x);
            let sy = (p.y.floor().max(0.0) as u32).min(max_y);
            let d = dx as usize * 4;
            row[d..d + 4].copy_from_slice(&frame.pixel(sx, sy));
        }
    }
}

/// Repeat the frame from the surface origin across `at`.
fn tile(dst: &mut Surface, frame: &FrameHandle, at: Region) {
    let target = at.clip_to(dst.size());
    for y in 0..target.height {
        let dy = target.y as u32 + y;
        let sy = dy % frame.height;
        let row = dst.row_mut(dy);
        for x in 0..target.width {
            let dx = target.x as u32 + x;
            let d = dx as usize * 4;
            row[d..d + 4].copy_from_slice(&frame.pixel(dx % frame.width, sy));
        }
    }
}
