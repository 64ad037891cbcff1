use std::fmt;
use std::str::FromStr;

/// Trailing moving-average windows that can be overlaid on the series.
///
/// Both are plain day counts; `Monthly` approximates a month as 30 days and
/// does not follow calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RollingWindow {
    Weekly,
    Monthly,
}

impl RollingWindow {
    pub fn days(&self) -> usize {
        match self {
            RollingWindow::Weekly => 7,
            RollingWindow::Monthly => 30,
        }
    }

    /// Column name used when the series is exported as a DataFrame.
    pub fn column_name(&self) -> &'static str {
        match self {
            RollingWindow::Weekly => "w_rolling_avg",
            RollingWindow::Monthly => "m_rolling_avg",
        }
    }
}

impl fmt::Display for RollingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollingWindow::Weekly => write!(f, "weekly"),
            RollingWindow::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for RollingWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" | "w" => Ok(RollingWindow::Weekly),
            "monthly" | "m" => Ok(RollingWindow::Monthly),
            other => Err(format!("unknown rolling window '{}'", other)),
        }
    }
}

/// Trailing simple moving average over `window` days.
///
/// The value at `i` is the mean of `values[i + 1 - window..=i]`. It is `None`
/// while fewer than `window` days are available, and for every window that
/// contains a missing day.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|sum| sum / window as f64)
        })
        .collect()
}
