//! RGB888 → RGB565 pixel codec
//!
//! Packs each pixel as `(r5 << 11) | (g6 << 5) | b5`, little-endian, row
//! major, no header. Optional 8×8 ordered (Bayer) dithering changes only the
//! rounding of each channel; output layout is identical.

use byteorder::{ByteOrder, LittleEndian};
use image::RgbImage;

/// Bytes per packed pixel
pub const BYTES_PER_PIXEL: usize = 2;

/// 8×8 Bayer threshold matrix, values 0..64
const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// RGB565 color (16-bit: 5 red, 6 green, 5 blue)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Self = Self(0x0000);
    pub const WHITE: Self = Self(0xFFFF);

    /// Truncating conversion from RGB888
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::pack((r >> 3) as u16, (g >> 2) as u16, (b >> 3) as u16)
    }

    /// Same as [`from_rgb`](Self::from_rgb) but with blue and red swapped,
    /// for panels wired BGR
    pub const fn from_bgr(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(b, g, r)
    }

    const fn pack(r5: u16, g6: u16, b5: u16) -> Self {
        Self(((r5 & 0x1F) << 11) | ((g6 & 0x3F) << 5) | (b5 & 0x1F))
    }

    /// Expand back to RGB888 by left-shifting each channel.
    ///
    /// Recovers the input within 7 on red/blue and 3 on green.
    pub const fn to_rgb(self) -> [u8; 3] {
        let r5 = (self.0 >> 11) & 0x1F;
        let g6 = (self.0 >> 5) & 0x3F;
        let b5 = self.0 & 0x1F;
        [(r5 << 3) as u8, (g6 << 2) as u8, (b5 << 3) as u8]
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

/// Quantize one channel to `levels` steps with Bayer threshold `t` (0..64).
///
/// Equivalent to `floor(v * levels / 256 + t / 64 - 1/2)` clamped to the
/// channel range, in integer arithmetic so results never vary.
fn dither_channel(v: u8, levels: i32, t: u8) -> u16 {
    let scaled = v as i32 * levels + 4 * t as i32 - 128;
    scaled.div_euclid(256).clamp(0, levels - 1) as u16
}

/// Encode one pixel at `(x, y)`; position only matters when dithering
pub fn encode_pixel(rgb: [u8; 3], x: u32, y: u32, dither: bool) -> Rgb565 {
    let [r, g, b] = rgb;
    if !dither {
        return Rgb565::from_rgb(r, g, b);
    }
    let t = BAYER8[(y & 7) as usize][(x & 7) as usize];
    Rgb565::pack(
        dither_channel(r, 32, t),
        dither_channel(g, 64, t),
        dither_channel(b, 32, t),
    )
}

/// Encode a whole image to the packed little-endian byte stream.
///
/// Output length is always `width * height * 2`.
pub fn encode(image: &RgbImage, dither: bool) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let mut out = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = (y as usize * width as usize + x as usize) * BYTES_PER_PIXEL;
        let word = encode_pixel(pixel.0, x, y, dither);
        LittleEndian::write_u16(&mut out[idx..idx + BYTES_PER_PIXEL], word.0);
    }
    out
}

/// A solid frame of one color, used by `fill`
pub fn solid(color: Rgb565, width: u32, height: u32) -> Vec<u8> {
    color
        .to_le_bytes()
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * BYTES_PER_PIXEL)
        .collect()
}

/// Decode a packed stream back to an image (debugging aid)
///
/// Returns `None` when the length does not match the dimensions.
pub fn decode(bytes: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    if bytes.len() != width as usize * height as usize * BYTES_PER_PIXEL {
        return None;
    }
    let mut image = RgbImage::new(width, height);
    for (i, chunk) in bytes.chunks_exact(BYTES_PER_PIXEL).enumerate() {
        let word = Rgb565(LittleEndian::read_u16(chunk));
        let x = i as u32 % width;
        let y = i as u32 / width;
        image.put_pixel(x, y, image::Rgb(word.to_rgb()));
    }
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) * 3 % 256) as u8])
        })
    }

    #[test]
    fn test_primary_colors() {
        assert_eq!(Rgb565::from_rgb(255, 0, 0), Rgb565(0xF800));
        assert_eq!(Rgb565::from_rgb(0, 255, 0), Rgb565(0x07E0));
        assert_eq!(Rgb565::from_rgb(0, 0, 255), Rgb565(0x001F));
        assert_eq!(Rgb565::from_rgb(255, 255, 255), Rgb565::WHITE);
        assert_eq!(Rgb565::from_bgr(255, 0, 0), Rgb565(0x001F));
    }

    #[test]
    fn test_little_endian_layout() {
        let image = RgbImage::from_pixel(2, 1, Rgb([255, 0, 0]));
        assert_eq!(encode(&image, false), vec![0x00, 0xF8, 0x00, 0xF8]);
    }

    #[test]
    fn test_decode_within_truncation_error() {
        // Sparse sweep of the RGB cube, every value on each axis at least once
        for r in 0..=255u8 {
            for g in (0..=255u8).step_by(17) {
                for b in (0..=255u8).rev().step_by(15) {
                    let [dr, dg, db] = Rgb565::from_rgb(r, g, b).to_rgb();
                    assert!(r - dr <= 7, "red {} -> {}", r, dr);
                    assert!(g - dg <= 3, "green {} -> {}", g, dg);
                    assert!(b - db <= 7, "blue {} -> {}", b, db);
                }
            }
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = gradient(37, 19);
        assert_eq!(encode(&image, false), encode(&image, false));
        assert_eq!(encode(&image, true), encode(&image, true));
        assert_eq!(encode(&image, true).len(), 37 * 19 * 2);
    }

    #[test]
    fn test_dither_keeps_extremes() {
        for dither in [false, true] {
            assert_eq!(encode_pixel([0, 0, 0], 3, 5, dither), Rgb565::BLACK);
            assert_eq!(encode_pixel([255, 255, 255], 3, 5, dither), Rgb565::WHITE);
        }
    }

    #[test]
    fn test_dither_mixes_neighbouring_levels() {
        // 104 lands halfway between red levels 12 (96) and 13 (104)
        let image = RgbImage::from_pixel(8, 8, Rgb([104, 0, 0]));
        let decoded = decode(&encode(&image, true), 8, 8).unwrap();
        let mut reds: Vec<u8> = decoded.pixels().map(|p| p.0[0]).collect();
        reds.sort_unstable();
        reds.dedup();
        assert_eq!(reds, vec![96, 104]);
    }

    #[test]
    fn test_solid_frame() {
        let frame = solid(Rgb565(0x07E0), 3, 2);
        assert_eq!(frame.len(), 12);
        assert!(frame.chunks(2).all(|c| c == [0xE0, 0x07]));
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert!(decode(&[0u8; 5], 2, 1).is_none());
    }
}
