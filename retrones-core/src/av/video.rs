use crate::emu::{Frame, Rgb};

/// Pixels hidden per side on an axis whose overscan is not shown.
pub const OVERSCAN_MARGIN: usize = 8;

/// Pixel aspect ratio of the NES PPU output.
const NES_PIXEL_ASPECT: f64 = 8.0 / 7.0;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AspectMode {
    /// Square pixels scaled by the NES pixel aspect ratio.
    #[default]
    Par,
    FourThree,
}

/// Which borders are shown.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Overscan {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Overscan {
    pub const fn new(horizontal: bool, vertical: bool) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    fn crop_x(&self) -> usize {
        if self.horizontal { 0 } else { OVERSCAN_MARGIN }
    }

    fn crop_y(&self) -> usize {
        if self.vertical { 0 } else { OVERSCAN_MARGIN }
    }

    /// Output size for a native picture of `width` x `height`.
    pub fn cropped_size(&self, width: usize, height: usize) -> (usize, usize) {
        (
            width.saturating_sub(2 * self.crop_x()),
            height.saturating_sub(2 * self.crop_y()),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
}

/// Geometry is a pure function of the native size, the overscan flags and the aspect mode.
pub fn compute_geometry(
    native_width: usize,
    native_height: usize,
    overscan: Overscan,
    aspect: AspectMode,
) -> Geometry {
    let (width, height) = overscan.cropped_size(native_width, native_height);
    let aspect_ratio = match aspect {
        AspectMode::FourThree => 4.0 / 3.0,
        AspectMode::Par if height != 0 => width as f64 * NES_PIXEL_ASPECT / height as f64,
        AspectMode::Par => 0.0,
    };

    Geometry {
        base_width: width as u32,
        base_height: height as u32,
        max_width: width as u32,
        max_height: height as u32,
        aspect_ratio: aspect_ratio as f32,
    }
}

/// RGB888 -> RGB565, keeping the high bits of each channel.
#[inline]
pub fn pack_rgb565(rgb: Rgb) -> u16 {
    ((rgb.red as u16 & 0xf8) << 8) | ((rgb.green as u16 & 0xfc) << 3) | (rgb.blue as u16 >> 3)
}

/// A converted frame, borrowed from the converter until the next `convert`.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub pixels: &'a [u16],
    pub width: usize,
    pub height: usize,
    pub pitch_bytes: usize,
}

/// Converts the core's indexed frames into RGB565.
///
/// The output buffer is allocated once for the native size; overscan crops are views into it,
/// so the buffer address and stride never change between frames.
#[derive(Debug)]
pub struct FrameConverter {
    width: usize,
    height: usize,
    buffer: Vec<u16>,
    lut: [u16; 256],
}

impl FrameConverter {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width * height],
            lut: [0; 256],
        }
    }

    fn rebuild_lut(&mut self, frame: &Frame<'_>) {
        for (entry, &color) in self.lut.iter_mut().zip(frame.palette.iter()) {
            *entry = frame
                .colors
                .get(color as usize)
                .copied()
                .map(pack_rgb565)
                .unwrap_or(0);
        }
    }

    pub fn convert(&mut self, frame: &Frame<'_>, overscan: Overscan) -> FrameView<'_> {
        // Palette can change every frame.
        self.rebuild_lut(frame);

        let width = self.width;
        let pitch = frame.pitch.max(width);
        for (y, out_row) in self.buffer.chunks_exact_mut(width).enumerate() {
            let start = y * pitch;
            match frame.pixels.get(start..start + width) {
                Some(in_row) => {
                    for (dst, &index) in out_row.iter_mut().zip(in_row) {
                        *dst = self.lut[index as usize];
                    }
                }
                None => out_row.fill(0),
            }
        }

        let (out_width, out_height) = overscan.cropped_size(self.width, self.height);
        let offset = overscan.crop_y() * width + overscan.crop_x();
        let end = match out_height {
            0 => offset,
            h => offset + (h - 1) * width + out_width,
        };

        FrameView {
            pixels: &self.buffer[offset..end],
            width: out_width,
            height: out_height,
            pitch_bytes: width * std::mem::size_of::<u16>(),
        }
    }
}
