//! Platform Capabilities
//!
//! The board support code (pin mux, clocks, the LCD bus driver with its
//! DMA-done signal, the accelerometer driver) lives outside this crate.
//! The simulation only needs two things from it, expressed as traits here,
//! plus host-side stand-ins for running without hardware.

use crate::sim::input::AccelCounts;

/// Source of raw accelerometer readings.
pub trait AccelSource {
    /// Latest reading, or `None` if the sensor had nothing this frame.
    fn read_counts(&mut self) -> Option<AccelCounts>;
}

/// Pixel-region blit target (RGB565).
pub trait PixelSink {
    /// Display size in pixels.
    fn size(&self) -> (u16, u16);

    /// Write `pixels` row-major into the inclusive rectangle
    /// `[x0, x1] x [y0, y1]` and block until the transfer completes.
    fn write_region(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, pixels: &[u16]);
}

// =============================================================================
// HOST STAND-INS
// =============================================================================

/// Deterministic tilt pattern: triangle sweeps on X and Y with different periods.
#[derive(Clone, Debug)]
pub struct ScriptedAccel {
    frame: u32,
    amplitude: i16,
    period_x: u32,
    period_y: u32,
}

impl ScriptedAccel {
    /// Sweep ±`amplitude` counts with the given periods (frames).
    pub fn new(amplitude: i16, period_x: u32, period_y: u32) -> Self {
        Self {
            frame: 0,
            amplitude,
            period_x: period_x.max(2),
            period_y: period_y.max(2),
        }
    }

    fn triangle(&self, period: u32) -> i16 {
        let phase = (self.frame % period) as i64;
        let half = (period / 2) as i64;
        let amp = self.amplitude as i64;
        // -amp .. +amp .. -amp over one period
        let rising = if phase < half { phase } else { period as i64 - phase };
        (-amp + 2 * amp * rising / half.max(1)) as i16
    }
}

impl Default for ScriptedAccel {
    fn default() -> Self {
        Self::new(384, 240, 180)
    }
}

impl AccelSource for ScriptedAccel {
    fn read_counts(&mut self) -> Option<AccelCounts> {
        let counts = AccelCounts::new(
            self.triangle(self.period_x),
            self.triangle(self.period_y),
            512,
        );
        self.frame = self.frame.wrapping_add(1);
        Some(counts)
    }
}

/// In-memory RGB565 frame buffer.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
    /// Number of completed region writes
    pub writes: u64,
}

impl FrameBuffer {
    /// Create a buffer filled with `color`.
    pub fn new(width: u16, height: u16, color: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
            writes: 0,
        }
    }

    /// Pixel at (x, y), if on screen.
    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }
}

impl PixelSink for FrameBuffer {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn write_region(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, pixels: &[u16]) {
        self.writes += 1;
        if x1 < x0 || y1 < y0 {
            return;
        }
        let row_len = (x1 - x0) as usize + 1;
        for (row, chunk) in pixels.chunks(row_len).enumerate() {
            let y = y0 as usize + row;
            if y > y1 as usize || y >= self.height as usize {
                break;
            }
            for (col, &color) in chunk.iter().enumerate() {
                let x = x0 as usize + col;
                if x < self.width as usize {
                    self.pixels[y * self.width as usize + x] = color;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_accel_sweeps() {
        let mut accel = ScriptedAccel::new(100, 4, 8);
        let xs: Vec<i16> = (0..4).map(|_| accel.read_counts().unwrap().x).collect();
        assert_eq!(xs, vec![-100, 0, 100, 0]);
        assert_eq!(accel.read_counts().unwrap().x, -100);
    }

    #[test]
    fn test_scripted_accel_repeatable() {
        let mut a = ScriptedAccel::default();
        let mut b = ScriptedAccel::default();
        for _ in 0..500 {
            assert_eq!(a.read_counts(), b.read_counts());
        }
    }

    #[test]
    fn test_frame_buffer_region_write() {
        let mut fb = FrameBuffer::new(8, 4, 0);
        fb.write_region(2, 1, 4, 2, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(fb.pixel(2, 1), Some(1));
        assert_eq!(fb.pixel(4, 1), Some(3));
        assert_eq!(fb.pixel(2, 2), Some(4));
        assert_eq!(fb.pixel(4, 2), Some(6));
        assert_eq!(fb.pixel(5, 1), Some(0));
        assert_eq!(fb.writes, 1);
    }

    #[test]
    fn test_frame_buffer_clips() {
        let mut fb = FrameBuffer::new(4, 4, 0);
        fb.write_region(2, 3, 5, 3, &[7, 7, 7, 7]);
        assert_eq!(fb.pixel(3, 3), Some(7));
        assert_eq!(fb.pixel(4, 3), None);
    }
}
