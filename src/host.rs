use crate::foundation::core::Size;
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// First successful attach.
    Loaded,
    /// Source swapped.
    Changed,
    /// A previously prepared frame was reused without recomputation.
    Cached,
}

/// The environment a backdrop lives in: container measurement, render-tree placement and event
/// dispatch. The backdrop never reaches past this trait.
pub trait BackdropHost {
    /// Current content-box size of the container.
    fn measure_container(&self) -> Size;

    /// Place the visible surface into the render tree behind the container's children.
    fn attach_surface(&mut self, surface: &Surface);

    /// Remove the visible surface again.
    fn detach_surface(&mut self);

    /// The visible surface has new pixels or a new opacity.
    fn present(&mut self, _surface: &Surface) {}

    fn lifecycle(&mut self, _event: LifecycleEvent) {}
}

/// Stacking index that puts the backdrop one below the lowest numeric z-index among the
/// container's children. Children without a numeric z-index are ignored; with none left the
/// backdrop goes to `-1`.
pub fn z_index_below<I>(children: I) -> i32
where
    I: IntoIterator<Item = Option<i32>>,
{
    children
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(0)
        .saturating_sub(1)
}

/// Headless host with a fixed-size container. Keeps the last presented pixels and a log of
/// lifecycle events; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct OffscreenHost {
    container: Size,
    attached: bool,
    presented: Option<Surface>,
    presents: u64,
    events: Vec<LifecycleEvent>,
}

impl OffscreenHost {
    pub fn new(container: Size) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn presented(&self) -> Option<&Surface> {
        self.presented.as_ref()
    }

    /// Number of `present` calls so far.
    pub fn present_count(&self) -> u64 {
        self.presents
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }
}

impl BackdropHost for OffscreenHost {
    fn measure_container(&self) -> Size {
        self.container
    }

    fn attach_surface(&mut self, surface: &Surface) {
        self.attached = true;
        self.presented = Some(surface.clone());
    }

    fn detach_surface(&mut self) {
        self.attached = false;
        self.presented = None;
    }

    fn present(&mut self, surface: &Surface) {
        self.presents += 1;
        if self.attached {
            self.presented = Some(surface.clone());
        }
    }

    fn lifecycle(&mut self, event: LifecycleEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_index_sits_below_lowest_child() {
        assert_eq!(z_index_below([Some(3), None, Some(-2), Some(10)]), -3);
        assert_eq!(z_index_below([None, None]), -1);
        assert_eq!(z_index_below(std::iter::empty()), -1);
        assert_eq!(z_index_below([Some(i32::MIN)]), i32::MIN);
    }

    #[test]
    fn offscreen_host_only_keeps_frames_while_attached() {
        let mut host = OffscreenHost::new(Size::new(2, 2));
        let s = Surface::new(Size::new(2, 2));
        host.present(&s);
        assert!(host.presented().is_none());
        host.attach_surface(&s);
        host.present(&s);
        assert!(host.presented().is_some());
        assert_eq!(host.present_count(), 2);
        host.detach_surface();
        assert!(!host.is_attached());
        assert!(host.presented().is_none());
    }
}
