//! Status indicator colour sequencer.
//!
//! Called once per indicator period.  While connected it walks a
//! 15-colour palette; while disconnected it alternates red and black.
//! Each palette keeps its own position, so a reconnect resumes the
//! connected cycle where it left off.

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const RED: Rgb = (255, 0, 0);
pub const BLACK: Rgb = (0, 0, 0);
pub const ORANGE: Rgb = (255, 40, 0);
pub const YELLOW: Rgb = (255, 150, 0);
pub const GREEN: Rgb = (0, 255, 0);
pub const BLUE: Rgb = (0, 0, 255);
pub const PURPLE: Rgb = (180, 0, 255);
pub const MAGENTA: Rgb = (255, 0, 20);
pub const TEAL: Rgb = (0, 255, 120);
pub const CYAN: Rgb = (0, 255, 255);
pub const WHITE: Rgb = (255, 255, 255);
pub const GOLD: Rgb = (255, 222, 30);
pub const PINK: Rgb = (242, 90, 255);
pub const AQUA: Rgb = (50, 255, 255);
pub const JADE: Rgb = (0, 255, 40);
pub const AMBER: Rgb = (255, 100, 0);
pub const OLD_LACE: Rgb = (253, 245, 230);

pub const CONNECTED_PALETTE: [Rgb; 15] = [
    ORANGE, YELLOW, GREEN, BLUE, PURPLE, MAGENTA, TEAL, CYAN, WHITE, GOLD, PINK, AQUA, JADE,
    AMBER, OLD_LACE,
];

pub const DISCONNECTED_PALETTE: [Rgb; 2] = [RED, BLACK];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorCycle {
    connected_idx: usize,
    disconnected_idx: usize,
}

impl IndicatorCycle {
    pub const fn new() -> Self {
        Self {
            connected_idx: 0,
            disconnected_idx: 0,
        }
    }

    /// Next colour for the current link state.
    pub fn advance(&mut self, connected: bool) -> Rgb {
        let (palette, idx): (&[Rgb], &mut usize) = if connected {
            (&CONNECTED_PALETTE, &mut self.connected_idx)
        } else {
            (&DISCONNECTED_PALETTE, &mut self.disconnected_idx)
        };
        let colour = palette[*idx];
        *idx = (*idx + 1) % palette.len();
        colour
    }
}
