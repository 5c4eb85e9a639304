//! Per-standard raster timing.

use serde::{Deserialize, Serialize};

use crate::config::Region;

pub const DOTS_PER_LINE: u16 = 341;
pub const VISIBLE_DOTS: u16 = 256;
pub const VISIBLE_LINES: u16 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFormat {
    pub region: Region,
    pub lines_per_frame: u16,
    pub post_render_line: u16,
    pub vblank_line: u16,
    pub pre_render_line: u16,
    /// Odd frames drop the last idle dot of the pre-render line while
    /// rendering is enabled.
    pub skips_odd_dot: bool,
    /// PPU dots per CPU cycle.
    pub dots_per_cpu_cycle: u32,
}

/// Role of a scanline inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Visible,
    PostRender,
    VBlankStart,
    VBlank,
    PreRender,
}

/// Work done at a dot of a visible or pre-render line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotPhase {
    Idle,
    Render,
    SpriteFetch,
    TilePrefetch,
    UnusedFetch,
}

impl DotPhase {
    pub fn of(dot: u16) -> DotPhase {
        match dot {
            1..=256 => DotPhase::Render,
            257..=320 => DotPhase::SpriteFetch,
            321..=336 => DotPhase::TilePrefetch,
            337..=340 => DotPhase::UnusedFetch,
            _ => DotPhase::Idle,
        }
    }
}

impl FrameFormat {
    pub const NTSC: FrameFormat = FrameFormat {
        region: Region::Ntsc,
        lines_per_frame: 262,
        post_render_line: 240,
        vblank_line: 241,
        pre_render_line: 261,
        skips_odd_dot: true,
        dots_per_cpu_cycle: 3,
    };

    // The real ratio is 3.2; rounded down to the nearest whole dot.
    pub const PAL: FrameFormat = FrameFormat {
        region: Region::Pal,
        lines_per_frame: 312,
        post_render_line: 240,
        vblank_line: 241,
        pre_render_line: 311,
        skips_odd_dot: false,
        dots_per_cpu_cycle: 3,
    };

    // Dendy keeps NTSC's ratio but starts vblank 50 lines late.
    pub const DENDY: FrameFormat = FrameFormat {
        region: Region::Dendy,
        lines_per_frame: 312,
        post_render_line: 240,
        vblank_line: 291,
        pre_render_line: 311,
        skips_odd_dot: false,
        dots_per_cpu_cycle: 3,
    };

    pub fn for_region(region: Region) -> FrameFormat {
        match region {
            Region::Ntsc => FrameFormat::NTSC,
            Region::Pal => FrameFormat::PAL,
            Region::Dendy => FrameFormat::DENDY,
        }
    }

    pub fn line_kind(&self, line: u16) -> LineKind {
        if line < VISIBLE_LINES {
            LineKind::Visible
        } else if line == self.pre_render_line {
            LineKind::PreRender
        } else if line == self.vblank_line {
            LineKind::VBlankStart
        } else if line < self.vblank_line {
            LineKind::PostRender
        } else {
            LineKind::VBlank
        }
    }

    /// Dots in a frame without the odd-frame skip.
    pub fn dots_per_frame(&self) -> u32 {
        self.lines_per_frame as u32 * DOTS_PER_LINE as u32
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat::NTSC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntsc_line_roles() {
        let f = FrameFormat::NTSC;
        assert_eq!(f.line_kind(0), LineKind::Visible);
        assert_eq!(f.line_kind(239), LineKind::Visible);
        assert_eq!(f.line_kind(240), LineKind::PostRender);
        assert_eq!(f.line_kind(241), LineKind::VBlankStart);
        assert_eq!(f.line_kind(260), LineKind::VBlank);
        assert_eq!(f.line_kind(261), LineKind::PreRender);
        assert_eq!(f.dots_per_frame(), 89342);
    }

    #[test]
    fn test_dendy_has_long_post_render() {
        let f = FrameFormat::for_region(Region::Dendy);
        assert_eq!(f.line_kind(290), LineKind::PostRender);
        assert_eq!(f.line_kind(291), LineKind::VBlankStart);
        assert_eq!(f.line_kind(311), LineKind::PreRender);
        assert!(!f.skips_odd_dot);
    }

    #[test]
    fn test_dot_phases() {
        assert_eq!(DotPhase::of(0), DotPhase::Idle);
        assert_eq!(DotPhase::of(1), DotPhase::Render);
        assert_eq!(DotPhase::of(256), DotPhase::Render);
        assert_eq!(DotPhase::of(257), DotPhase::SpriteFetch);
        assert_eq!(DotPhase::of(321), DotPhase::TilePrefetch);
        assert_eq!(DotPhase::of(340), DotPhase::UnusedFetch);
    }
}
