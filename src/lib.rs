//! Backdrop renders a still image, live video or generated frame as a full-bleed background
//! behind a host container.
//!
//! - Attach a source through [`Backdrop::render`]
//! - Drive it with [`Backdrop::tick`] and forward geometry/source signals
//! - Read the composited pixels from the host's [`BackdropHost::present`] callback
#![forbid(unsafe_code)]

mod foundation;

pub mod backdrop;
pub mod compositor;
pub mod config;
pub mod filter;
pub mod host;
pub mod layout;
pub mod scheduler;
pub mod source;
pub mod surface;

pub use crate::foundation::core::{HostTime, Region, Size};
pub use crate::foundation::error::{BackdropError, BackdropResult};

pub use crate::backdrop::Backdrop;
pub use crate::compositor::{Compositor, RenderOutcome};
pub use crate::config::{BackdropOpts, RenderConfig, SchedulerOpts};
pub use crate::filter::{ChromaKey, FilterConfig, FilterPipeline, Levels};
pub use crate::host::{BackdropHost, LifecycleEvent, OffscreenHost, z_index_below};
pub use crate::layout::{AnchorGrid, Axis, HAnchor, LayoutFlags, LayoutMode, Placement, VAnchor};
pub use crate::scheduler::{FrameScheduler, ScheduleState, TickPlan};
pub use crate::source::{
    FrameGenerator, FrameHandle, SourceAdapter, SourceKind, SourceObject, StillImage, VideoFeed,
};
pub use crate::surface::Surface;
