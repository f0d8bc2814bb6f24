//! Container colouring by carrier and status.
//!
//! Known carriers get their livery color; unknown labels get a stable hue
//! derived from the label, so the same carrier always looks the same.

use super::instancing::{pack_rgba, unpack_rgba};
use crate::world::ContainerStatus;

/// Alarm color for flagged containers.
pub const ALARM_COLOR: u32 = 0xE02020FF;
/// Selection highlight color.
pub const HIGHLIGHT_COLOR: u32 = 0xFFE040FF;
/// Lightness added to the base color for pending containers.
pub const PENDING_LIGHTNESS_SHIFT: f32 = 0.22;
/// Alpha for pending containers.
pub const PENDING_ALPHA: u8 = 0xD0;

const CARRIER_COLORS: &[(&str, u32)] = &[
    ("MAERSK", 0x42B0D5FF),
    ("MSC", 0xE8C547FF),
    ("CMA CGM", 0x1D3C8FFF),
    ("HAPAG-LLOYD", 0xE86A10FF),
    ("EVERGREEN", 0x2E8B57FF),
    ("COSCO", 0x3060A8FF),
    ("ONE", 0xC5197DFF),
    ("ZIM", 0x9AA0A6FF),
];

/// FNV-1a over the bytes of `s`. Stable across runs and platforms.
pub fn stable_hash(s: &str) -> u32 {
    let mut hash: u32 = 0x811C9DC5;
    for byte in s.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

/// Base livery color for a carrier label (case-insensitive).
pub fn carrier_color(carrier: &str) -> u32 {
    let key = carrier.trim().to_ascii_uppercase();
    if let Some((_, color)) = CARRIER_COLORS.iter().find(|(name, _)| *name == key) {
        return *color;
    }
    let hue = (stable_hash(&key) % 360) as f32;
    let (r, g, b) = hsl_to_rgb(hue, 0.55, 0.45);
    pack_rgba(r, g, b, 0xFF)
}

/// Final tint for a container: alarm for flagged, lighter for pending.
pub fn status_color(carrier: &str, status: ContainerStatus) -> u32 {
    match status {
        ContainerStatus::Normal => carrier_color(carrier),
        ContainerStatus::Flagged => ALARM_COLOR,
        ContainerStatus::Pending => {
            let lighter = shift_lightness(carrier_color(carrier), PENDING_LIGHTNESS_SHIFT);
            (lighter & 0xFFFF_FF00) | PENDING_ALPHA as u32
        }
    }
}

/// Add `delta` to the HSL lightness of a packed color, keeping alpha.
pub fn shift_lightness(packed: u32, delta: f32) -> u32 {
    let (r, g, b, a) = unpack_rgba(packed);
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let (r, g, b) = hsl_to_rgb(h, s, (l + delta).clamp(0.0, 1.0));
    pack_rgba(r, g, b, a)
}

/// Hue in degrees, saturation and lightness in 0..1.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) * 0.5;
    let d = max - min;
    if d < 1e-6 {
        return (0.0, 0.0, l);
    }
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0, s, l)
}

pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c * 0.5;
    let to_u8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}
