use std::sync::Arc;

use crate::compositor::{Compositor, RenderOutcome};
use crate::config::{BackdropOpts, RenderConfig};
use crate::filter::FilterConfig;
use crate::foundation::core::{HostTime, Size};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::host::{BackdropHost, LifecycleEvent};
use crate::layout::LayoutFlags;
use crate::scheduler::{FrameScheduler, ScheduleState, TickPlan};
use crate::source::{SourceAdapter, SourceKind, SourceObject};
use crate::surface::Surface;

/// A backdrop attached to one host container.
///
/// The host drives it with [`Backdrop::tick`] on every natural frame and forwards geometry and
/// source signals; everything else happens inside.
pub struct Backdrop<H: BackdropHost> {
    host: H,
    config: Arc<RenderConfig>,
    scheduler: FrameScheduler,
    compositor: Compositor,
    source: Option<SourceAdapter>,
    container: Option<Size>,
    surface_attached: bool,
    loaded: bool,
}

impl<H: BackdropHost> Backdrop<H> {
    pub fn new(host: H, opts: BackdropOpts) -> BackdropResult<Self> {
        opts.scheduler.validate()?;
        let config = RenderConfig::validated(opts.render.layout, opts.render.filters)?;
        Ok(Self {
            host,
            config: Arc::new(config),
            scheduler: FrameScheduler::new(opts.scheduler),
            compositor: Compositor::default(),
            source: None,
            container: None,
            surface_attached: false,
            loaded: false,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> ScheduleState {
        self.scheduler.state()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn visible(&self) -> &Surface {
        self.compositor.visible()
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.source.as_ref().map(SourceAdapter::kind)
    }

    pub fn next_deadline(&self) -> Option<HostTime> {
        self.scheduler.next_deadline()
    }

    /// Attach a source, replacing the current one.
    ///
    /// Objects that are not images, videos or generated-frame sources are rejected before
    /// anything changes.
    pub fn render(&mut self, object: SourceObject, now: HostTime) -> BackdropResult<()> {
        if self.scheduler.state() == ScheduleState::Terminated {
            return Err(BackdropError::validation("backdrop has been torn down"));
        }
        let adapter = SourceAdapter::try_from(object)?;
        let live = adapter.is_live();
        tracing::info!(kind = ?adapter.kind(), "attaching backdrop source");

        self.compositor.invalidate();
        self.source = Some(adapter);
        if !self.surface_attached {
            self.host.attach_surface(self.compositor.visible());
            self.surface_attached = true;
        }
        let event = if self.loaded {
            LifecycleEvent::Changed
        } else {
            LifecycleEvent::Loaded
        };
        self.loaded = true;
        self.host.lifecycle(event);

        let plan = self.scheduler.attach(live, now);
        self.execute_surfacing(plan, now)
    }

    /// Re-measure and re-render right now, outside the normal cadence.
    pub fn force_refresh(&mut self, now: HostTime) -> BackdropResult<()> {
        let plan = self.scheduler.force_refresh(now);
        self.execute_surfacing(plan, now)
    }

    /// Swap in new layout and filter settings; they apply from the next render on.
    ///
    /// An ambiguous layout is rejected and the current settings stay in place. Filter values out
    /// of range are clamped.
    pub fn configure(&mut self, layout: LayoutFlags, filters: FilterConfig) -> BackdropResult<()> {
        let config = RenderConfig::validated(layout, filters)?;
        self.config = Arc::new(config);
        self.compositor.invalidate();
        Ok(())
    }

    /// Natural frame callback.
    pub fn tick(&mut self, now: HostTime) {
        let plan = self.scheduler.tick(now);
        self.execute_absorbing(plan, now);
    }

    /// The container may have been resized or re-laid out.
    pub fn geometry_changed(&mut self, now: HostTime) {
        let plan = self.scheduler.geometry_changed(now);
        self.execute_absorbing(plan, now);
    }

    /// The source changed on its own, e.g. a still image finished decoding.
    pub fn source_mutated(&mut self, now: HostTime) {
        let plan = self.scheduler.source_mutated(now);
        self.execute_absorbing(plan, now);
    }

    /// Release the source and remove the surface. Safe to call any number of times.
    pub fn teardown(&mut self) {
        if !self.scheduler.teardown() {
            return;
        }
        tracing::info!("tearing down backdrop");
        self.source = None;
        self.compositor.invalidate();
        if self.surface_attached {
            self.host.detach_surface();
            self.surface_attached = false;
        }
    }

    fn execute_surfacing(&mut self, plan: TickPlan, now: HostTime) -> BackdropResult<()> {
        match self.execute(plan, now) {
            Err(e) if e.is_hard_failure() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "render failed; keeping last frame");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn execute_absorbing(&mut self, plan: TickPlan, now: HostTime) {
        if let Err(e) = self.execute(plan, now) {
            tracing::warn!(error = %e, "scheduled render failed; keeping last frame");
        }
    }

    fn execute(&mut self, plan: TickPlan, now: HostTime) -> BackdropResult<()> {
        if plan.is_empty() {
            return Ok(());
        }
        let container = match self.container {
            Some(c) if !plan.remeasure => c,
            _ => {
                let c = self.host.measure_container();
                self.container = Some(c);
                c
            }
        };

        let mut dirty = false;
        if plan.notify_geometry
            && let Some(source) = self.source.as_mut()
        {
            source.notify_geometry_dependent(container);
        }
        if plan.render
            && let Some(source) = self.source.as_mut()
        {
            match self.compositor.render(source, container, &self.config)? {
                RenderOutcome::Drawn(placement) => {
                    tracing::trace!(?placement, "frame published");
                    dirty = true;
                }
                RenderOutcome::Cached(_) => self.host.lifecycle(LifecycleEvent::Cached),
                RenderOutcome::Skipped => {
                    if source.kind() == SourceKind::Static {
                        self.scheduler.render_skipped(now);
                    }
                }
            }
        }
        if let Some(opacity) = plan.opacity {
            self.compositor.set_opacity(opacity);
            dirty = true;
        }
        if dirty && self.surface_attached {
            self.host.present(self.compositor.visible());
        }
        Ok(())
    }
}
