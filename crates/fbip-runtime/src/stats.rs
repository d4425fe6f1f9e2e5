//! Performance monitor
//!
//! Fixed-capacity sample windows plus running totals. Means are computed
//! when `stats()` is called; recording is O(1).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use fbip_codec::Format;
use serde::Serialize;

/// Samples kept per window unless configured otherwise
pub const DEFAULT_HISTORY: usize = 1000;

/// Direction of a measured call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

/// One measured codec call
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub operation: Operation,
    pub latency: Duration,
    /// Packet size in bytes, produced or consumed; ignored for failed calls
    pub size: usize,
    /// compressed / original, when the payload was deflated or inflated
    pub compression_ratio: Option<f64>,
    pub format: Option<Format>,
    pub success: bool,
}

impl Sample {
    pub fn success(operation: Operation, latency: Duration, size: usize) -> Self {
        Sample {
            operation,
            latency,
            size,
            compression_ratio: None,
            format: None,
            success: true,
        }
    }

    pub fn failure(operation: Operation, latency: Duration) -> Self {
        Sample {
            success: false,
            ..Sample::success(operation, latency, 0)
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_compression_ratio(mut self, ratio: Option<f64>) -> Self {
        self.compression_ratio = ratio;
        self
    }
}

/// Bounded FIFO of recent values
#[derive(Clone, Debug)]
struct Window<T> {
    capacity: usize,
    values: VecDeque<T>,
}

impl<T: Copy + Into<f64>> Window<T> {
    fn new(capacity: usize) -> Self {
        Window {
            capacity,
            values: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY)),
        }
    }

    fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn sum(&self) -> f64 {
        self.values.iter().map(|&v| v.into()).sum()
    }

    fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum() / self.values.len() as f64)
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Snapshot of the monitor
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    /// Mean over encode and decode samples, milliseconds
    pub mean_latency_ms: f64,
    pub mean_encode_latency_ms: f64,
    pub mean_decode_latency_ms: f64,
    /// Mean packet size over encode and decode samples, bytes
    pub mean_size: f64,
    /// 1.0 when nothing was compressed
    pub mean_compression_ratio: f64,
    /// errors / total_calls
    pub error_rate: f64,
    pub total_calls: u64,
    pub errors: u64,
    /// Enum fallbacks applied while decoding
    pub warnings: u64,
    /// Successful calls per format name
    pub format_usage: BTreeMap<String, u64>,
}

/// Rolling performance monitor
#[derive(Clone, Debug)]
pub struct PerformanceMonitor {
    encode_latency: Window<f64>,
    decode_latency: Window<f64>,
    sizes: Window<u32>,
    compression_ratios: Window<f64>,
    format_usage: HashMap<Format, u64>,
    total_calls: u64,
    errors: u64,
    warnings: u64,
}

impl PerformanceMonitor {
    /// Monitor keeping the last `capacity` samples per window
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PerformanceMonitor {
            encode_latency: Window::new(capacity),
            decode_latency: Window::new(capacity),
            sizes: Window::new(capacity),
            compression_ratios: Window::new(capacity),
            format_usage: HashMap::new(),
            total_calls: 0,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn record(&mut self, sample: Sample) {
        self.total_calls += 1;
        if !sample.success {
            self.errors += 1;
            return;
        }

        let millis = sample.latency.as_secs_f64() * 1000.0;
        match sample.operation {
            Operation::Encode => self.encode_latency.push(millis),
            Operation::Decode => self.decode_latency.push(millis),
        }
        self.sizes.push(sample.size.min(u32::MAX as usize) as u32);
        if let Some(ratio) = sample.compression_ratio {
            self.compression_ratios.push(ratio);
        }
        if let Some(format) = sample.format {
            *self.format_usage.entry(format).or_insert(0) += 1;
        }
    }

    pub fn record_warnings(&mut self, count: u32) {
        self.warnings += u64::from(count);
    }

    pub fn stats(&self) -> PerformanceStats {
        let latency_samples = self.encode_latency.len() + self.decode_latency.len();
        let mean_latency_ms = if latency_samples == 0 {
            0.0
        } else {
            (self.encode_latency.sum() + self.decode_latency.sum()) / latency_samples as f64
        };

        PerformanceStats {
            mean_latency_ms,
            mean_encode_latency_ms: self.encode_latency.mean().unwrap_or(0.0),
            mean_decode_latency_ms: self.decode_latency.mean().unwrap_or(0.0),
            mean_size: self.sizes.mean().unwrap_or(0.0),
            mean_compression_ratio: self.compression_ratios.mean().unwrap_or(1.0),
            error_rate: if self.total_calls == 0 {
                0.0
            } else {
                self.errors as f64 / self.total_calls as f64
            },
            total_calls: self.total_calls,
            errors: self.errors,
            warnings: self.warnings,
            format_usage: self
                .format_usage
                .iter()
                .map(|(format, n)| (format.name().to_string(), *n))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        self.encode_latency.clear();
        self.decode_latency.clear();
        self.sizes.clear();
        self.compression_ratios.clear();
        self.format_usage.clear();
        self.total_calls = 0;
        self.errors = 0;
        self.warnings = 0;
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
