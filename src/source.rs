use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::Size;
use crate::foundation::error::{BackdropError, BackdropResult};

/// A decoded frame: straight RGBA8, row-major, tightly packed.
///
/// Only built through the constructors below, so the buffer length always matches the size.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameHandle {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8: Arc<Vec<u8>>,
}

impl FrameHandle {
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> BackdropResult<Self> {
        let expected = Size::new(width, height).rgba_len();
        if rgba8.len() != expected {
            return Err(BackdropError::validation(format!(
                "frame of {width}x{height} expects {expected} bytes, got {}",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Solid-color frame, handy for generators and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            rgba8: Arc::new(rgba.repeat((width as usize) * (height as usize))),
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
        &self.rgba8
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let off = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = &self.rgba8[off..off + 4];
        [px[0], px[1], px[2], px[3]]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Static,
    Video,
    Generated,
}

/// Host-side still image. Cloning shares the underlying decode state, so the host can keep a
/// handle and call [`StillImage::finish_decode`] after attaching it.
#[derive(Clone, Debug, Default)]
pub struct StillImage {
    decoded: Rc<RefCell<Option<FrameHandle>>>,
}

impl StillImage {
    /// An image whose decode has not completed yet.
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn from_frame(frame: FrameHandle) -> Self {
        Self {
            decoded: Rc::new(RefCell::new(Some(frame))),
        }
    }

    pub fn from_rgba(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_frame(FrameHandle {
            width,
            height,
            rgba8: Arc::new(img.into_raw()),
        })
    }

    pub fn decode(bytes: &[u8]) -> BackdropResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        Ok(Self::from_rgba(dyn_img.to_rgba8()))
    }

    pub fn open(path: &Path) -> BackdropResult<Self> {
        let dyn_img =
            image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Ok(Self::from_rgba(dyn_img.to_rgba8()))
    }

    pub fn finish_decode(&self, frame: FrameHandle) {
        *self.decoded.borrow_mut() = Some(frame);
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.borrow().is_some()
    }

    fn natural_size(&self) -> Size {
        self.decoded
            .borrow()
            .as_ref()
            .map(FrameHandle::size)
            .unwrap_or(Size::ZERO)
    }

    fn current(&self) -> Option<FrameHandle> {
        self.decoded.borrow().clone()
    }
}

#[derive(Debug, Default)]
struct VideoState {
    playing: bool,
    frame: Option<FrameHandle>,
    display: Size,
}

/// Host-side live video. The host pushes decoded frames and toggles playback; the backdrop only
/// ever reads the latest frame.
#[derive(Clone, Debug, Default)]
pub struct VideoFeed {
    state: Rc<RefCell<VideoState>>,
}

impl VideoFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&self, frame: FrameHandle) {
        self.state.borrow_mut().frame = Some(frame);
    }

    pub fn set_playing(&self, playing: bool) {
        self.state.borrow_mut().playing = playing;
    }

    /// Explicit element size. A zero axis falls back to the native frame size on that axis.
    pub fn set_display_size(&self, size: Size) {
        self.state.borrow_mut().display = size;
    }

    fn size(&self) -> Size {
        let st = self.state.borrow();
        let native = st.frame.as_ref().map(FrameHandle::size).unwrap_or(Size::ZERO);
        Size::new(
            if st.display.width != 0 {
                st.display.width
            } else {
                native.width
            },
            if st.display.height != 0 {
                st.display.height
            } else {
                native.height
            },
        )
    }

    fn is_ready(&self) -> bool {
        let st = self.state.borrow();
        st.playing && st.frame.is_some()
    }

    fn current(&self) -> Option<FrameHandle> {
        self.state.borrow().frame.clone()
    }
}

/// Provider of procedurally generated frames (an external render target).
pub trait FrameGenerator {
    fn target_size(&self) -> Size;

    /// Produce the frame for this tick.
    fn render_frame(&mut self) -> FrameHandle;

    /// Called after the container settles on a new size.
    fn geometry_changed(&mut self, _container: Size) {}
}

pub struct GeneratedFrames {
    generator: Box<dyn FrameGenerator>,
}

impl fmt::Debug for GeneratedFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedFrames")
            .field("target_size", &self.generator.target_size())
            .finish()
    }
}

/// Whatever the host passes to `render`. Only the first three kinds can be drawn.
pub enum SourceObject {
    Image(StillImage),
    Video(VideoFeed),
    Generated(Box<dyn FrameGenerator>),
    /// Any other host object, described by its type name.
    Opaque(String),
}

impl fmt::Debug for SourceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(img) => f.debug_tuple("Image").field(img).finish(),
            Self::Video(v) => f.debug_tuple("Video").field(v).finish(),
            Self::Generated(g) => f
                .debug_tuple("Generated")
                .field(&g.target_size())
                .finish(),
            Self::Opaque(name) => f.debug_tuple("Opaque").field(name).finish(),
        }
    }
}

/// The closed set of drawable sources, chosen once at attach time.
#[derive(Debug)]
pub enum SourceAdapter {
    Static(StillImage),
    Video(VideoFeed),
    Generated(GeneratedFrames),
}

impl TryFrom<SourceObject> for SourceAdapter {
    type Error = BackdropError;

    fn try_from(obj: SourceObject) -> BackdropResult<Self> {
        match obj {
            SourceObject::Image(img) => Ok(Self::Static(img)),
            SourceObject::Video(v) => Ok(Self::Video(v)),
            SourceObject::Generated(generator) => {
                Ok(Self::Generated(GeneratedFrames { generator }))
            }
            SourceObject::Opaque(name) => Err(BackdropError::unsupported(format!(
                "'{name}' is not an image, video or generated-frame source"
            ))),
        }
    }
}

impl SourceAdapter {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Static(_) => SourceKind::Static,
            Self::Video(_) => SourceKind::Video,
            Self::Generated(_) => SourceKind::Generated,
        }
    }

    /// Live sources change content every tick and need continuous rendering.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Static(_))
    }

    pub fn size(&self) -> Size {
        match self {
            Self::Static(img) => img.natural_size(),
            Self::Video(v) => v.size(),
            Self::Generated(g) => g.generator.target_size(),
        }
    }

    pub fn width(&self) -> u32 {
        self.size().width
    }

    pub fn height(&self) -> u32 {
        self.size().height
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Self::Static(img) => img.is_decoded(),
            Self::Video(v) => v.is_ready(),
            Self::Generated(_) => true,
        }
    }

    /// Current frame. Fails with [`BackdropError::SourceNotReady`] until the source is ready.
    pub fn frame(&mut self) -> BackdropResult<FrameHandle> {
        if !self.is_ready() {
            return Err(BackdropError::SourceNotReady);
        }
        let frame = match self {
            Self::Static(img) => img.current(),
            Self::Video(v) => v.current(),
            Self::Generated(g) => Some(g.generator.render_frame()),
        };
        frame.ok_or(BackdropError::SourceNotReady)
    }

    pub fn notify_geometry_dependent(&mut self, container: Size) {
        if let Self::Generated(g) = self {
            g.generator.geometry_changed(container);
        }
    }
}
