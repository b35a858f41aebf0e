use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::filter::FilterConfig;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::layout::LayoutFlags;

/// Layout and filter settings for one render. Never mutated after construction; updates build a
/// new value and swap it in.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub layout: LayoutFlags,
    pub filters: FilterConfig,
}

impl RenderConfig {
    /// Check the layout resolves and clamp filter knobs.
    pub fn validated(layout: LayoutFlags, filters: FilterConfig) -> BackdropResult<Self> {
        layout.resolve()?;
        Ok(Self {
            layout,
            filters: filters.sanitized(),
        })
    }
}

/// Timing knobs for the frame scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerOpts {
    /// Delay before a still image is drawn again to pick up a late decode.
    pub static_grace_ms: u64,
    /// Quiet period after the last geometry change before re-rendering.
    pub resize_debounce_ms: u64,
    /// Render cap for live sources.
    pub target_fps: u32,
    /// Rate at which the host delivers frame ticks.
    pub natural_fps: u32,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            static_grace_ms: 3000,
            resize_debounce_ms: 250,
            target_fps: 60,
            natural_fps: 60,
        }
    }
}

impl SchedulerOpts {
    pub fn validate(&self) -> BackdropResult<()> {
        if self.target_fps == 0 {
            return Err(BackdropError::validation("target_fps must be > 0"));
        }
        if self.natural_fps == 0 {
            return Err(BackdropError::validation("natural_fps must be > 0"));
        }
        Ok(())
    }

    /// Minimum spacing between renders, or `None` when every natural tick renders.
    pub fn min_render_interval_ms(&self) -> Option<u64> {
        if self.target_fps == self.natural_fps {
            None
        } else {
            Some(1000 / u64::from(self.target_fps.max(1)))
        }
    }
}

/// Everything a backdrop needs, as read from a JSON file.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackdropOpts {
    pub render: RenderConfig,
    pub scheduler: SchedulerOpts,
}

impl BackdropOpts {
    pub fn from_json_str(s: &str) -> BackdropResult<Self> {
        let opts: Self = serde_json::from_str(s).context("parse backdrop options JSON")?;
        opts.validated()
    }

    pub fn from_json_file(path: &Path) -> BackdropResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open backdrop options '{}'", path.display()))?;
        let opts: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse backdrop options '{}'", path.display()))?;
        opts.validated()
    }

    fn validated(self) -> BackdropResult<Self> {
        self.scheduler.validate()?;
        Ok(Self {
            render: RenderConfig::validated(self.render.layout, self.render.filters)?,
            scheduler: self.scheduler,
        })
    }
}
