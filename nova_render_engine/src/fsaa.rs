//! FSAA negotiation - choosing a multisample mode for a requested level
//!
//! The preference ordering between CSAA/EQAA and plain MSAA modes is a
//! vendor heuristic, not a normative rule, so it lives behind the
//! [`FsaaPolicy`] trait; [`DefaultFsaaPolicy`] preserves the established
//! ordering.

/// A concrete multisample mode
///
/// `max(count, quality)` is the effective FSAA level; `count >= 8 &&
/// quality != 0` marks a quality (CSAA xQ / EQAA) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDescription {
    /// Samples per pixel
    pub count: u32,
    /// Driver quality level
    pub quality: u32,
}

impl SampleDescription {
    /// No multisampling
    pub const NONE: SampleDescription = SampleDescription {
        count: 1,
        quality: 0,
    };

    /// Effective FSAA level of this mode
    pub fn fsaa_level(&self) -> u32 {
        self.count.max(self.quality)
    }

    /// True for quality (coverage-sampled) modes
    pub fn is_quality_mode(&self) -> bool {
        self.count >= 8 && self.quality != 0
    }
}

/// Pluggable FSAA mode selection policy
///
/// `quality_levels` reports the driver quality-level count for a sample
/// count (0 when unsupported), exactly as the device exposes it.
pub trait FsaaPolicy: Send {
    /// Choose a supported mode for a requested FSAA level and hint string
    fn choose(
        &self,
        requested: u32,
        hint: &str,
        quality_levels: &dyn Fn(u32) -> u32,
    ) -> SampleDescription;
}

/// Default policy: prefer CSAA/EQAA over plain MSAA at the same level
///
/// Modes are sorted from high quality to low; the "Quality" hint at 8+
/// samples unlocks the xQ modes at the requested level.
pub struct DefaultFsaaPolicy;

/// Preset modes, high quality first; CSAA aka EQAA modes are listed before
/// plain MSAA at the same effective level
const PRESETS: [SampleDescription; 11] = [
    SampleDescription {
        count: 8,
        quality: 16,
    }, // CSAA 16xQ, EQAA 8f16x
    SampleDescription {
        count: 4,
        quality: 16,
    }, // CSAA 16x,  EQAA 4f16x
    SampleDescription {
        count: 16,
        quality: 0,
    }, // MSAA 16x
    SampleDescription {
        count: 12,
        quality: 0,
    }, // MSAA 12x
    SampleDescription { count: 8, quality: 8 }, // CSAA 8xQ
    SampleDescription { count: 4, quality: 8 }, // CSAA 8x, EQAA 4f8x
    SampleDescription { count: 8, quality: 0 }, // MSAA 8x
    SampleDescription { count: 6, quality: 0 }, // MSAA 6x
    SampleDescription { count: 4, quality: 0 }, // MSAA 4x
    SampleDescription { count: 2, quality: 0 }, // MSAA 2x
    SampleDescription { count: 1, quality: 0 }, // MSAA 1x
];

impl FsaaPolicy for DefaultFsaaPolicy {
    fn choose(
        &self,
        requested: u32,
        hint: &str,
        quality_levels: &dyn Fn(u32) -> u32,
    ) -> SampleDescription {
        let quality_hint = requested >= 8 && hint.contains("Quality");

        // Skip modes above the requested level, and quality modes at the
        // requested level unless the hint asks for them
        let mut start = PRESETS.len();
        for (i, mode) in PRESETS.iter().enumerate() {
            let too_hq = mode.fsaa_level() > requested
                || (mode.fsaa_level() == requested && mode.is_quality_mode() && !quality_hint);
            if !too_hq {
                start = i;
                break;
            }
        }

        // Use the first supported mode
        for mode in &PRESETS[start..] {
            if quality_levels(mode.count) > mode.quality {
                return *mode;
            }
        }

        SampleDescription::NONE
    }
}

#[cfg(test)]
#[path = "fsaa_tests.rs"]
mod tests;
