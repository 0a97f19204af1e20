//! Sensitivity analysis
//!
//! Ordinary least squares of a target cell's samples against each other
//! cell's samples, paired by iteration, ranked by standardized effect size.

/// Number of variables kept when ranking
pub const DEFAULT_MAX_SENSITIVITIES: usize = 5;

/// Values of r² above this count as a strong relationship
pub const STRONG_R_SQUARED: f64 = 0.5;

/// Regression of a target against one variable
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SensitivityRecord {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Slope scaled by the ratio of sample standard deviations
    pub beta: f64,
}

impl SensitivityRecord {
    /// Whether the variable explains more than half the target's variance
    pub fn is_strong(&self) -> bool {
        self.r_squared > STRONG_R_SQUARED
    }
}

/// One ranked entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Sensitivity {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub record: SensitivityRecord,
}

/// Ranked sensitivities, largest `|beta|` first
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Sensitivities {
    entries: Vec<Sensitivity>,
}

impl Sensitivities {
    /// Record for a variable, if it made the ranking
    pub fn get(&self, name: &str) -> Option<&SensitivityRecord> {
        self.entries
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.record)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sensitivity> {
        self.entries.iter()
    }

    /// Variable names in rank order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sensitivities {
    type Item = &'a Sensitivity;
    type IntoIter = std::slice::Iter<'a, Sensitivity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Regress `target` (y) on `variable` (x)
///
/// Returns `None` when the regression is undefined: mismatched lengths, a
/// constant variable (`ssxx == 0`), or any statistic that comes out
/// non-finite (for example a constant target).
///
/// # Example
/// ```rust
/// use guessbook::sensitivity::analyze;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [3.0, 5.0, 7.0, 9.0];
/// let record = analyze(&y, &x).unwrap();
/// assert_eq!(record.slope, 2.0);
/// assert_eq!(record.intercept, 1.0);
/// assert_eq!(record.r_squared, 1.0);
/// ```
pub fn analyze(target: &[f64], variable: &[f64]) -> Option<SensitivityRecord> {
    if target.len() != variable.len() || target.is_empty() {
        return None;
    }

    let n = target.len() as f64;
    let mean_x = variable.iter().sum::<f64>() / n;
    let mean_y = target.iter().sum::<f64>() / n;

    let (mut ssxx, mut ssyy, mut ssxy) = (0.0, 0.0, 0.0);
    for (&x, &y) in variable.iter().zip(target) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        ssxx += dx * dx;
        ssyy += dy * dy;
        ssxy += dx * dy;
    }

    if ssxx == 0.0 {
        return None;
    }

    let slope = ssxy / ssxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = (ssxy * ssxy) / (ssxx * ssyy);

    let std_dev_x = (ssxx / (n - 1.0)).sqrt();
    let std_dev_y = (ssyy / (n - 1.0)).sqrt();
    let beta = slope * (std_dev_x / std_dev_y);

    let record = SensitivityRecord {
        slope,
        intercept,
        r_squared,
        beta,
    };
    [slope, intercept, r_squared, beta]
        .iter()
        .all(|v| v.is_finite())
        .then_some(record)
}

/// Analyze every variable against `target` and keep the `limit` largest
/// by `|beta|`
///
/// Variables whose regression is undefined are left out. Ties keep the
/// order in which variables were given.
pub fn rank<'a, I>(target: &[f64], variables: I, limit: usize) -> Sensitivities
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    let mut entries: Vec<Sensitivity> = variables
        .into_iter()
        .filter_map(|(name, samples)| {
            let record = analyze(target, samples);
            if record.is_none() {
                tracing::debug!("Skipping sensitivity for {name}: regression undefined");
            }
            record.map(|record| Sensitivity {
                name: name.to_string(),
                record,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.record.beta.abs().total_cmp(&a.record.beta.abs()));
    entries.truncate(limit);

    Sensitivities { entries }
}
