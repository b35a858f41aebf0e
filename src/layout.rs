use crate::foundation::core::{Affine, Region, Size};
use crate::foundation::error::{BackdropError, BackdropResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAnchor {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAnchor {
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Both,
}

impl Axis {
    fn covers_x(self) -> bool {
        matches!(self, Axis::X | Axis::Both)
    }

    fn covers_y(self) -> bool {
        matches!(self, Axis::Y | Axis::Both)
    }
}

/// How the source is laid out for one render. Exactly one is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LayoutMode {
    Position { h: HAnchor, v: VAnchor },
    Tile { axis: Axis },
    Stretch { axis: Axis },
}

/// Raw layout switches as the host configures them.
///
/// Anchors are lists so that conflicting selections (two horizontal anchors at once) stay
/// representable and can be rejected. Every switch left out of a deserialized value is off, so a
/// missing anchor list is an empty one rather than the `Default` anchor.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayoutFlags {
    #[serde(default)]
    pub tile_x: bool,
    #[serde(default)]
    pub tile_y: bool,
    #[serde(default)]
    pub stretch_x: bool,
    #[serde(default)]
    pub stretch_y: bool,
    #[serde(default)]
    pub stretch_xy: bool,
    #[serde(default)]
    pub anchor_h: Vec<HAnchor>,
    #[serde(default)]
    pub anchor_v: Vec<VAnchor>,
}

impl Default for LayoutFlags {
    fn default() -> Self {
        Self::anchored(HAnchor::Left, VAnchor::Top)
    }
}

impl LayoutFlags {
    /// No tiling or stretching, one anchor per axis.
    pub fn anchored(h: HAnchor, v: VAnchor) -> Self {
        Self {
            tile_x: false,
            tile_y: false,
            stretch_x: false,
            stretch_y: false,
            stretch_xy: false,
            anchor_h: vec![h],
            anchor_v: vec![v],
        }
    }

    /// Tile rules outrank stretch rules, which outrank anchors.
    pub fn resolve(&self) -> BackdropResult<LayoutMode> {
        match (self.tile_x, self.tile_y) {
            (true, false) => return Ok(LayoutMode::Tile { axis: Axis::X }),
            (false, true) => return Ok(LayoutMode::Tile { axis: Axis::Y }),
            (true, true) => return Ok(LayoutMode::Tile { axis: Axis::Both }),
            (false, false) => {}
        }
        if self.stretch_x {
            return Ok(LayoutMode::Stretch { axis: Axis::X });
        }
        if self.stretch_y {
            return Ok(LayoutMode::Stretch { axis: Axis::Y });
        }
        if self.stretch_xy {
            return Ok(LayoutMode::Stretch { axis: Axis::Both });
        }

        match (self.anchor_h.as_slice(), self.anchor_v.as_slice()) {
            ([h], [v]) => Ok(LayoutMode::Position { h: *h, v: *v }),
            (hs, vs) => Err(BackdropError::ambiguous(format!(
                "expected exactly one horizontal and one vertical anchor, got {} and {}",
                hs.len(),
                vs.len()
            ))),
        }
    }
}

/// Offsets for every anchor on both axes, computed against one container/source pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorGrid {
    pub left: i64,
    pub center_x: i64,
    pub right: i64,
    pub top: i64,
    pub center_y: i64,
    pub bottom: i64,
}

impl AnchorGrid {
    pub fn compute(container: Size, source: Size) -> Self {
        let dw = i64::from(container.width) - i64::from(source.width);
        let dh = i64::from(container.height) - i64::from(source.height);
        Self {
            left: 0,
            center_x: dw.div_euclid(2),
            right: dw,
            top: 0,
            center_y: dh.div_euclid(2),
            bottom: dh,
        }
    }

    pub fn offset(&self, h: HAnchor, v: VAnchor) -> (i64, i64) {
        let x = match h {
            HAnchor::Left => self.left,
            HAnchor::Center => self.center_x,
            HAnchor::Right => self.right,
        };
        let y = match v {
            VAnchor::Top => self.top,
            VAnchor::Center => self.center_y,
            VAnchor::Bottom => self.bottom,
        };
        (x, y)
    }
}

/// Where and how the source lands in the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Placement {
    /// Natural-size copy at `dst.x, dst.y`.
    Blit { dst: Region },
    /// Scale the whole source into `dst`, which always starts at the origin.
    Stretch { dst: Region },
    /// Repeat the natural-size source from the origin across `dst`.
    Tile { dst: Region },
}

impl Placement {
    pub fn resolve(mode: LayoutMode, container: Size, source: Size) -> Self {
        match mode {
            LayoutMode::Position { h, v } => {
                let (x, y) = AnchorGrid::compute(container, source).offset(h, v);
                Placement::Blit {
                    dst: Region::new(x, y, source.width, source.height),
                }
            }
            LayoutMode::Stretch { axis } => {
                let w = if axis.covers_x() {
                    container.width
                } else {
                    source.width
                };
                let h = if axis.covers_y() {
                    container.height
                } else {
                    source.height
                };
                Placement::Stretch {
                    dst: Region::new(0, 0, w, h),
                }
            }
            LayoutMode::Tile { axis } => {
                let w = if axis.covers_x() {
                    container.width
                } else {
                    source.width
                };
                let h = if axis.covers_y() {
                    container.height
                } else {
                    source.height
                };
                Placement::Tile {
                    dst: Region::new(0, 0, w, h),
                }
            }
        }
    }

    pub fn dst(&self) -> Region {
        match *self {
            Placement::Blit { dst } | Placement::Stretch { dst } | Placement::Tile { dst } => dst,
        }
    }

    /// Maps destination pixel space back into source pixel space for scaled blits.
    pub fn stretch_inverse(dst: Region, source: Size) -> Affine {
        if dst.is_empty() || source.is_empty() {
            return Affine::IDENTITY;
        }
        let sx = f64::from(source.width) / f64::from(dst.width);
        let sy = f64::from(source.height) / f64::from(dst.height);
        Affine::scale_non_uniform(sx, sy) * Affine::translate((-(dst.x as f64), -(dst.y as f64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> LayoutFlags {
        LayoutFlags::anchored(HAnchor::Left, VAnchor::Top)
    }

    #[test]
    fn anchor_formulas_match_the_grid() {
        let g = AnchorGrid::compute(Size::new(400, 300), Size::new(100, 50));
        assert_eq!(g.offset(HAnchor::Left, VAnchor::Top), (0, 0));
        assert_eq!(g.offset(HAnchor::Center, VAnchor::Center), (150, 125));
        assert_eq!(g.offset(HAnchor::Right, VAnchor::Bottom), (300, 250));
    }

    #[test]
    fn center_floors_towards_negative_infinity() {
        let g = AnchorGrid::compute(Size::new(5, 1), Size::new(2, 4));
        assert_eq!(g.center_x, 1);
        // floor((1 - 4) / 2) = floor(-1.5) = -2
        assert_eq!(g.center_y, -2);
        assert_eq!(g.bottom, -3);
    }

    #[test]
    fn missing_horizontal_anchor_is_ambiguous() {
        let mut f = flags();
        f.anchor_h.clear();
        assert!(matches!(f.resolve(), Err(BackdropError::AmbiguousLayout(_))));
    }

    #[test]
    fn two_horizontal_anchors_are_ambiguous() {
        let mut f = flags();
        f.anchor_h = vec![HAnchor::Left, HAnchor::Right];
        assert!(matches!(f.resolve(), Err(BackdropError::AmbiguousLayout(_))));
    }

    #[test]
    fn tile_outranks_stretch() {
        let mut f = flags();
        f.tile_x = true;
        f.stretch_xy = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Tile { axis: Axis::X });
    }

    #[test]
    fn resolution_order_follows_precedence() {
        let mut f = flags();
        f.tile_y = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Tile { axis: Axis::Y });
        f.tile_x = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Tile { axis: Axis::Both });

        let mut f = flags();
        f.stretch_y = true;
        f.stretch_xy = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Stretch { axis: Axis::Y });
        f.stretch_x = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Stretch { axis: Axis::X });
    }

    #[test]
    fn stretch_and_tile_ignore_anchors() {
        let mut f = flags();
        f.anchor_h.clear();
        f.anchor_v.clear();
        f.stretch_xy = true;
        assert_eq!(f.resolve().unwrap(), LayoutMode::Stretch { axis: Axis::Both });
    }

    #[test]
    fn placements_per_mode() {
        let c = Size::new(400, 300);
        let s = Size::new(100, 50);
        assert_eq!(
            Placement::resolve(LayoutMode::Stretch { axis: Axis::X }, c, s).dst(),
            Region::new(0, 0, 400, 50)
        );
        assert_eq!(
            Placement::resolve(LayoutMode::Stretch { axis: Axis::Y }, c, s).dst(),
            Region::new(0, 0, 100, 300)
        );
        assert_eq!(
            Placement::resolve(LayoutMode::Tile { axis: Axis::X }, c, s).dst(),
            Region::new(0, 0, 400, 50)
        );
        assert_eq!(
            Placement::resolve(LayoutMode::Tile { axis: Axis::Both }, c, s).dst(),
            Region::new(0, 0, 400, 300)
        );
        assert_eq!(
            Placement::resolve(
                LayoutMode::Position {
                    h: HAnchor::Right,
                    v: VAnchor::Center
                },
                c,
                s
            ),
            Placement::Blit {
                dst: Region::new(300, 125, 100, 50)
            }
        );
    }

    #[test]
    fn stretch_inverse_maps_corners() {
        let inv = Placement::stretch_inverse(Region::new(0, 0, 400, 100), Size::new(100, 50));
        let p = inv * kurbo::Point::new(400.0, 100.0);
        assert_eq!((p.x, p.y), (100.0, 50.0));
    }

    #[test]
    fn flags_deserialize_with_switches_off() {
        let f: LayoutFlags =
            serde_json::from_str(r#"{ "anchor_h": ["center"], "anchor_v": ["bottom"] }"#).unwrap();
        assert_eq!(
            f.resolve().unwrap(),
            LayoutMode::Position {
                h: HAnchor::Center,
                v: VAnchor::Bottom
            }
        );
        let f: LayoutFlags = serde_json::from_str("{}").unwrap();
        assert!(f.anchor_h.is_empty() && f.anchor_v.is_empty());
        assert!(matches!(f.resolve(), Err(BackdropError::AmbiguousLayout(_))));

        let f: LayoutFlags = serde_json::from_str(r#"{ "anchor_v": ["bottom"] }"#).unwrap();
        assert!(matches!(f.resolve(), Err(BackdropError::AmbiguousLayout(_))));
    }
}
