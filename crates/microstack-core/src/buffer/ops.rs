use ndarray::{Array2, Axis, Zip};

use crate::error::Result;

use super::ImageBuffer;

/// Binary threshold flavours, applied per element with `value > thresh`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdKind {
    /// `max_value` above the threshold, zero elsewhere.
    Binary,
    /// Zero above the threshold, `max_value` elsewhere.
    BinaryInv,
    /// Clamp values above the threshold down to it.
    Trunc,
    /// Keep values above the threshold, zero elsewhere.
    ToZero,
}

impl ImageBuffer {
    pub fn threshold(&self, thresh: f32, max_value: f32, kind: ThresholdKind) -> ImageBuffer {
        let data = self.data().mapv(|v| {
            let above = v > thresh;
            match kind {
                ThresholdKind::Binary => {
                    if above {
                        max_value
                    } else {
                        0.0
                    }
                }
                ThresholdKind::BinaryInv => {
                    if above {
                        0.0
                    } else {
                        max_value
                    }
                }
                ThresholdKind::Trunc => {
                    if above {
                        thresh
                    } else {
                        v
                    }
                }
                ThresholdKind::ToZero => {
                    if above {
                        v
                    } else {
                        0.0
                    }
                }
            }
        });
        ImageBuffer::from_array(data, self.depth())
    }

    /// Element-wise `self - other`, saturated to this buffer's depth
    /// (8-bit differences never go negative).
    pub fn subtract(&self, other: &ImageBuffer) -> Result<ImageBuffer> {
        self.check_same_size(other)?;
        other.check_channels(self.channels())?;
        let data = self.data() - other.data();
        Ok(ImageBuffer::from_array(data, self.depth()))
    }

    /// Subtract a per-channel scalar, saturated to this buffer's depth.
    pub fn subtract_scalars(&self, values: &[f64]) -> ImageBuffer {
        let mut data = self.data().clone();
        for (c, mut plane) in data.axis_iter_mut(Axis(0)).enumerate() {
            let v = values.get(c).or(values.last()).copied().unwrap_or(0.0) as f32;
            plane.mapv_inplace(|p| p - v);
        }
        ImageBuffer::from_array(data, self.depth())
    }

    /// Per-channel mean and standard deviation, optionally restricted to
    /// pixels where `mask` is set. An empty selection yields `(0, 0)`.
    pub fn mean_stddev(&self, mask: Option<&Array2<bool>>) -> Vec<(f64, f64)> {
        (0..self.channels())
            .map(|c| {
                let plane = self.plane(c);
                let mut n = 0usize;
                let mut sum = 0.0f64;
                let mut sum_sq = 0.0f64;
                match mask {
                    Some(mask) => {
                        Zip::from(&plane).and(mask).for_each(|&v, &m| {
                            if m {
                                n += 1;
                                sum += v as f64;
                                sum_sq += (v as f64) * (v as f64);
                            }
                        });
                    }
                    None => {
                        for &v in plane.iter() {
                            n += 1;
                            sum += v as f64;
                            sum_sq += (v as f64) * (v as f64);
                        }
                    }
                }
                if n == 0 {
                    return (0.0, 0.0);
                }
                let mean = sum / n as f64;
                let var = (sum_sq / n as f64 - mean * mean).max(0.0);
                (mean, var.sqrt())
            })
            .collect()
    }

    /// Set every channel to `value` wherever `mask` is set.
    pub fn fill_where(&mut self, mask: &Array2<bool>, value: f32) {
        let value = self.depth().saturate(value);
        for mut plane in self.data_mut().axis_iter_mut(Axis(0)) {
            Zip::from(&mut plane).and(mask).for_each(|p, &m| {
                if m {
                    *p = value;
                }
            });
        }
    }

    /// Copy `src` pixels into this buffer wherever `mask` is set.
    pub fn copy_from_where(&mut self, src: &ImageBuffer, mask: &Array2<bool>) -> Result<()> {
        self.check_same_size(src)?;
        src.check_channels(self.channels())?;
        let depth = self.depth();
        for (mut dst, from) in self
            .data_mut()
            .axis_iter_mut(Axis(0))
            .zip(src.data().axis_iter(Axis(0)))
        {
            Zip::from(&mut dst).and(&from).and(mask).for_each(|d, &s, &m| {
                if m {
                    *d = depth.saturate(s);
                }
            });
        }
        Ok(())
    }

    /// Minimum and maximum over all channels.
    pub fn min_max(&self) -> (f32, f32) {
        self.data()
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}
