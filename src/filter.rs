use crate::foundation::error::{BackdropError, BackdropResult};

pub const LEVEL_MIN: f32 = 0.0;
pub const LEVEL_MAX: f32 = 2.0;

/// Key color and tolerance. `variance` is compared against the Manhattan RGB distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChromaKey {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub variance: u32,
}

impl Default for ChromaKey {
    fn default() -> Self {
        Self {
            r: 58,
            g: 228,
            b: 31,
            variance: 300,
        }
    }
}

/// Per-channel multiplicative factors in `[0, 2]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Levels {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for Levels {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Levels {
    pub const IDENTITY: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Filter selection plus parameters. Selection is by flag only; parameter values never switch a
/// filter on or off.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub chroma_key: bool,
    pub levels: bool,
    pub key: ChromaKey,
    pub factors: Levels,
}

impl FilterConfig {
    /// Clamp out-of-domain knobs instead of rejecting them.
    pub fn sanitized(mut self) -> Self {
        for (name, f) in [
            ("r", &mut self.factors.r),
            ("g", &mut self.factors.g),
            ("b", &mut self.factors.b),
        ] {
            let clamped = if f.is_finite() {
                f.clamp(LEVEL_MIN, LEVEL_MAX)
            } else {
                1.0
            };
            if clamped != *f {
                tracing::warn!(channel = name, value = *f, clamped, "levels factor out of range");
                *f = clamped;
            }
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterPass {
    ChromaKey(ChromaKey),
    Levels(Levels),
}

/// The single per-pixel pass a config boils down to.
///
/// Chroma key wins when both filters are selected: levels is never reached for that pixel. This
/// is inherited behavior and kept as-is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterPipeline {
    pass: Option<FilterPass>,
}

impl FilterPipeline {
    pub fn from_config(cfg: &FilterConfig) -> Self {
        let pass = if cfg.chroma_key {
            Some(FilterPass::ChromaKey(cfg.key))
        } else if cfg.levels && !cfg.factors.is_identity() {
            Some(FilterPass::Levels(cfg.factors))
        } else {
            None
        };
        Self { pass }
    }

    pub fn pass(&self) -> Option<FilterPass> {
        self.pass
    }

    pub fn is_noop(&self) -> bool {
        self.pass.is_none()
    }

    pub fn apply_in_place(&self, rgba: &mut [u8]) -> BackdropResult<()> {
        if !rgba.len().is_multiple_of(4) {
            return Err(BackdropError::validation(
                "filter pass expects an rgba8 buffer",
            ));
        }
        match self.pass {
            None => {}
            Some(FilterPass::ChromaKey(key)) => {
                for px in rgba.chunks_exact_mut(4) {
                    chroma_key_px(px, key);
                }
            }
            Some(FilterPass::Levels(levels)) => {
                for px in rgba.chunks_exact_mut(4) {
                    levels_px(px, levels);
                }
            }
        }
        Ok(())
    }
}

/// Manhattan distance between a pixel's RGB and the key color.
pub fn key_distance(px: &[u8], key: ChromaKey) -> u32 {
    u32::from(px[0].abs_diff(key.r))
        + u32::from(px[1].abs_diff(key.g))
        + u32::from(px[2].abs_diff(key.b))
}

/// Alpha for a pixel at distance `z` from the key, or `None` when it keeps its own alpha.
pub fn keyed_alpha(z: u32, variance: u32) -> Option<u8> {
    if z >= variance {
        return None;
    }
    // z < variance, so variance > 0 here.
    Some(((z * z) / variance).min(255) as u8)
}

fn chroma_key_px(px: &mut [u8], key: ChromaKey) {
    // Pure black is always transparent, whatever the key.
    if px[0] == 0 && px[1] == 0 && px[2] == 0 {
        px[3] = 0;
        return;
    }
    if let Some(a) = keyed_alpha(key_distance(px, key), key.variance) {
        px[3] = a;
    }
}

fn levels_px(px: &mut [u8], levels: Levels) {
    for (c, factor) in [levels.r, levels.g, levels.b].into_iter().enumerate() {
        if factor != 1.0 {
            px[c] = (f32::from(px[c]) * factor)
                .round_ties_even()
                .clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chroma(key: ChromaKey) -> FilterPipeline {
        FilterPipeline::from_config(&FilterConfig {
            chroma_key: true,
            key,
            ..FilterConfig::default()
        })
    }

    fn levels(factors: Levels) -> FilterPipeline {
        FilterPipeline::from_config(&FilterConfig {
            levels: true,
            factors,
            ..FilterConfig::default()
        })
    }

    #[test]
    fn empty_selection_is_noop() {
        let p = FilterPipeline::from_config(&FilterConfig::default());
        assert!(p.is_noop());
        let mut buf = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn keyed_alpha_is_monotonic_below_variance() {
        let variance = 300;
        let mut prev = 0u8;
        for z in 0..variance {
            let a = keyed_alpha(z, variance).unwrap();
            assert!(a >= prev, "alpha dropped at z={z}");
            prev = a;
        }
        assert_eq!(keyed_alpha(variance, variance), None);
        assert_eq!(keyed_alpha(765, variance), None);
    }

    #[test]
    fn far_pixels_keep_full_alpha() {
        let p = chroma(ChromaKey::default());
        let mut buf = vec![255u8, 0, 255, 255];
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(buf[3], 255);
    }

    #[test]
    fn key_color_becomes_transparent() {
        let key = ChromaKey::default();
        let p = chroma(key);
        let mut buf = vec![key.r, key.g, key.b, 255];
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(buf, vec![key.r, key.g, key.b, 0]);
    }

    #[test]
    fn near_key_gets_parabolic_alpha() {
        let key = ChromaKey {
            r: 100,
            g: 100,
            b: 100,
            variance: 100,
        };
        let p = chroma(key);
        // z = 30 -> 900 / 100 = 9
        let mut buf = vec![110u8, 90, 110, 255];
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(buf[3], 9);
    }

    #[test]
    fn pure_black_is_always_transparent() {
        for key in [
            ChromaKey::default(),
            ChromaKey {
                r: 255,
                g: 255,
                b: 255,
                variance: 0,
            },
        ] {
            let mut buf = vec![0u8, 0, 0, 255];
            chroma(key).apply_in_place(&mut buf).unwrap();
            assert_eq!(buf[3], 0);
        }
    }

    #[test]
    fn levels_identity_is_byte_exact() {
        let src: Vec<u8> = (0..=255u8).collect();
        let mut buf = src.clone();
        let p = FilterPipeline::from_config(&FilterConfig {
            levels: true,
            ..FilterConfig::default()
        });
        assert!(p.is_noop());
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(buf, src);

        // Mixed factors leave the factor-1 channels alone too.
        let mut buf = src.clone();
        levels(Levels {
            r: 0.5,
            g: 1.0,
            b: 1.0,
        })
        .apply_in_place(&mut buf)
        .unwrap();
        for (i, (out, inp)) in buf.iter().zip(src.iter()).enumerate() {
            if i % 4 != 0 {
                assert_eq!(out, inp);
            }
        }
    }

    #[test]
    fn levels_clamp_and_leave_alpha() {
        let mut buf = vec![200u8, 100, 10, 77];
        levels(Levels {
            r: 2.0,
            g: 0.0,
            b: 1.5,
        })
        .apply_in_place(&mut buf)
        .unwrap();
        assert_eq!(buf, vec![255, 0, 15, 77]);
    }

    #[test]
    fn levels_round_halves_to_even() {
        // 3 * 1.5 = 4.5 and 5 * 1.5 = 7.5
        let mut buf = vec![3u8, 5, 1, 255];
        levels(Levels {
            r: 1.5,
            g: 1.5,
            b: 0.5,
        })
        .apply_in_place(&mut buf)
        .unwrap();
        assert_eq!(buf, vec![4, 8, 0, 255]);
    }

    #[test]
    fn chroma_key_shadows_levels() {
        let p = FilterPipeline::from_config(&FilterConfig {
            chroma_key: true,
            levels: true,
            factors: Levels {
                r: 2.0,
                g: 2.0,
                b: 2.0,
            },
            ..FilterConfig::default()
        });
        assert!(matches!(p.pass(), Some(FilterPass::ChromaKey(_))));
        let mut buf = vec![100u8, 20, 200, 255];
        p.apply_in_place(&mut buf).unwrap();
        assert_eq!(&buf[..3], &[100, 20, 200]);
    }

    #[test]
    fn sanitize_clamps_factors() {
        let cfg = FilterConfig {
            levels: true,
            factors: Levels {
                r: 5.0,
                g: -1.0,
                b: f32::NAN,
            },
            ..FilterConfig::default()
        }
        .sanitized();
        assert_eq!(
            cfg.factors,
            Levels {
                r: 2.0,
                g: 0.0,
                b: 1.0
            }
        );
    }

    #[test]
    fn rejects_ragged_buffers() {
        assert!(chroma(ChromaKey::default()).apply_in_place(&mut [0u8; 5]).is_err());
    }
}
