//! Tray and window icon artwork, drawn into RGBA buffers at runtime.

/// Icon edge length in pixels.
pub const ICON_SIZE: u32 = 32;

type Rgb = (u8, u8, u8);

const LIVE_BADGE: Rgb = (46, 125, 50);
const MUTED_BADGE: Rgb = (198, 40, 40);
const GLYPH: Rgb = (255, 255, 255);

/// A square RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub size: u32,
    pub rgba: Vec<u8>,
}

impl IconImage {
    fn blank(size: u32) -> Self {
        Self {
            size,
            rgba: vec![0; (size * size * 4) as usize],
        }
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.size + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    /// Pixels in the BGRA order GDI bitmaps use.
    pub fn bgra(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect()
    }

    fn put(&mut self, x: usize, y: usize, (r, g, b): Rgb, alpha: u8) {
        let size = self.size as usize;
        if x >= size || y >= size {
            return;
        }
        let i = (y * size + x) * 4;
        self.rgba[i..i + 4].copy_from_slice(&[r, g, b, alpha]);
    }
}

/// Microphone glyph on a round badge; green when live, red and struck
/// through when muted.
pub fn microphone_icon(muted: bool) -> IconImage {
    let mut image = IconImage::blank(ICON_SIZE);
    let badge = if muted { MUTED_BADGE } else { LIVE_BADGE };

    draw_badge(&mut image, badge);
    draw_microphone(&mut image);
    if muted {
        draw_slash(&mut image);
    }

    image
}

fn draw_badge(image: &mut IconImage, color: Rgb) {
    let size = image.size as usize;
    let center = size as f32 / 2.0 - 0.5;
    let radius = size as f32 / 2.0 - 1.0;

    for y in 0..size {
        for x in 0..size {
            let dist = (x as f32 - center).hypot(y as f32 - center);
            if dist <= radius - 1.0 {
                image.put(x, y, color, 255);
            } else if dist < radius {
                // One-pixel soft edge.
                image.put(x, y, color, ((radius - dist) * 255.0) as u8);
            }
        }
    }
}

fn draw_microphone(image: &mut IconImage) {
    let size = image.size as usize;
    let mid = size / 2;

    // Capsule.
    let half_width = size / 10;
    for y in size / 5..size / 2 + 2 {
        for x in mid - half_width..mid + half_width {
            image.put(x, y, GLYPH, 255);
        }
    }

    // Cradle: a U under the capsule.
    let cradle_top = size / 2 - 1;
    let cradle_bottom = size / 2 + 5;
    for y in cradle_top..cradle_bottom {
        image.put(mid - half_width - 3, y, GLYPH, 255);
        image.put(mid + half_width + 2, y, GLYPH, 255);
    }
    for x in mid - half_width - 3..=mid + half_width + 2 {
        image.put(x, cradle_bottom, GLYPH, 255);
    }

    // Stand and base.
    for y in cradle_bottom..cradle_bottom + 4 {
        image.put(mid - 1, y, GLYPH, 255);
        image.put(mid, y, GLYPH, 255);
    }
    for x in mid - 4..mid + 4 {
        image.put(x, cradle_bottom + 4, GLYPH, 255);
    }
}

fn draw_slash(image: &mut IconImage) {
    let size = image.size as usize;
    for i in 5..size - 5 {
        for t in 0..3 {
            image.put(i + t, i, GLYPH, 255);
        }
    }
}

#[cfg(windows)]
impl TryFrom<IconImage> for tray_icon::Icon {
    type Error = tray_icon::BadIcon;

    fn try_from(image: IconImage) -> Result<Self, Self::Error> {
        tray_icon::Icon::from_rgba(image.rgba, image.size, image.size)
    }
}

#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{CreateIcon, HICON};

#[cfg(windows)]
impl IconImage {
    /// A 32-bit alpha icon for `WM_SETICON`. The caller owns the handle and
    /// releases it with `DestroyIcon`.
    pub fn to_hicon(&self) -> windows::core::Result<HICON> {

        let side = self.size as i32;
        // Alpha carries transparency, so the AND mask stays empty.
        let and_mask = vec![0u8; (self.size.div_ceil(16) * 2 * self.size) as usize];
        let xor_bits = self.bgra();
        unsafe { CreateIcon(None, side, side, 1, 32, and_mask.as_ptr(), xor_bits.as_ptr()) }
    }
}
