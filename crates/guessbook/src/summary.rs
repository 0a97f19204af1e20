//! Summary statistics and histograms over a cell's samples

/// Default number of histogram buckets
pub const DEFAULT_BUCKETS: usize = 20;

/// Descriptive statistics of one sample vector
///
/// `low` and `high` bound the central 90% of the samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub low: f64,
    pub high: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub stdev: f64,
}

impl Summary {
    /// Summarize `samples`; `None` when empty
    ///
    /// Quantiles are read straight off the sorted samples at
    /// `floor(n * q)` without interpolation.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let at = |q: f64| sorted[((n as f64 * q).floor() as usize).min(n - 1)];

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        Some(Self {
            mean,
            median: sorted[n / 2],
            low: at(0.05),
            high: at(0.95),
            min: sorted[0],
            max: sorted[n - 1],
            stdev: variance.sqrt(),
        })
    }
}

/// Equal-width bucket counts over `[min, max]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Lower and upper edge of bucket `index`
    pub fn bounds(&self, index: usize) -> (f64, f64) {
        let lower = self.min + index as f64 * self.width;
        (lower, lower + self.width)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Bucket `samples` into `buckets` equal-width bins
///
/// The maximum lands in the last bin. When every sample is equal the
/// width is zero and all samples land in the first bin. Returns `None`
/// for empty samples or zero buckets.
///
/// # Example
/// ```rust
/// use guessbook::summary::histogram;
///
/// let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2).unwrap();
/// assert_eq!(h.counts, vec![2, 3]);
/// ```
pub fn histogram(samples: &[f64], buckets: usize) -> Option<Histogram> {
    if samples.is_empty() || buckets == 0 {
        return None;
    }

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / buckets as f64;

    let mut counts = vec![0; buckets];
    for &v in samples {
        let index = if width > 0.0 {
            (((v - min) / width).floor() as usize).min(buckets - 1)
        } else {
            0
        };
        counts[index] += 1;
    }

    Some(Histogram {
        min,
        max,
        width,
        counts,
    })
}
