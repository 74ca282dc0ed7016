use std::fmt;

use ndarray::ArrayViewD;

use crate::error::SelectionError;

/// Counts of valid observations in a mask of shape `[n_view, ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidViewsStats {
    /// Number of entries equal to 1, per view.
    pub per_view: Vec<usize>,
    /// `per_pair_histogram[n]` is the number of correspondences seen by exactly `n` valid views.
    ///
    /// Correspondences excluded by a NaN are not counted here.
    pub per_pair_histogram: Vec<usize>,
    /// Correspondences excluded by a NaN in any view.
    pub ignored_pairs: usize,
    /// Total number of correspondences.
    pub n_pair: usize,
}

/// Count the valid observations of a mask.
///
/// # Arguments
///
/// * `mask` - Validity mask in shape `[n_view, ...]`.
///
/// # Example
///
/// ```
/// use mvpose_select::valid_views_stats;
/// use ndarray::{ArrayD, IxDyn};
///
/// let mut mask = ArrayD::<f64>::ones(IxDyn(&[3, 4]));
/// mask[[0, 1]] = 0.0;
/// mask[[2, 3]] = f64::NAN;
/// let stats = valid_views_stats(mask.view()).unwrap();
/// assert_eq!(stats.per_view, vec![3, 4, 3]);
/// assert_eq!(stats.per_pair_histogram, vec![0, 0, 1, 2]);
/// assert_eq!(stats.ignored_pairs, 1);
/// ```
pub fn valid_views_stats(mask: ArrayViewD<'_, f64>) -> Result<ValidViewsStats, SelectionError> {
    let shape = mask.shape();
    if shape.is_empty() {
        return Err(SelectionError::InvalidPointsRank(0));
    }
    let n_view = shape[0];
    let n_pair: usize = shape[1..].iter().product();
    let mask: Vec<f64> = mask.iter().copied().collect();

    let per_view = (0..n_view)
        .map(|view| {
            mask[view * n_pair..(view + 1) * n_pair]
                .iter()
                .filter(|&&m| m == 1.0)
                .count()
        })
        .collect();

    let mut per_pair_histogram = vec![0usize; n_view + 1];
    let mut ignored_pairs = 0usize;
    for pair in 0..n_pair {
        let column = (0..n_view).map(|view| mask[view * n_pair + pair]);
        if column.clone().any(f64::is_nan) {
            ignored_pairs += 1;
            continue;
        }
        per_pair_histogram[column.filter(|&m| m == 1.0).count()] += 1;
    }

    Ok(ValidViewsStats {
        per_view,
        per_pair_histogram,
        ignored_pairs,
        n_pair,
    })
}

impl fmt::Display for ValidViewsStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6} | {:>18}", "view", "valid observations")?;
        writeln!(f, "{:-<6}-+-{:-<18}", "", "")?;
        for (view, count) in self.per_view.iter().enumerate() {
            writeln!(f, "{view:>6} | {count:>18}")?;
        }
        writeln!(f)?;
        writeln!(f, "{:>11} | {:>15}", "valid views", "correspondences")?;
        writeln!(f, "{:-<11}-+-{:-<15}", "", "")?;
        for (n, count) in self.per_pair_histogram.iter().enumerate() {
            writeln!(f, "{n:>11} | {count:>15}")?;
        }
        write!(
            f,
            "{} of {} correspondences ignored",
            self.ignored_pairs, self.n_pair
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_stats_multi_axis() -> Result<(), SelectionError> {
        let mut mask = ArrayD::<f64>::ones(IxDyn(&[2, 2, 3]));
        mask[[0, 0, 0]] = 0.0;
        mask[[1, 0, 0]] = 0.0;
        mask[[1, 1, 2]] = 0.0;
        let stats = valid_views_stats(mask.view())?;
        assert_eq!(stats.n_pair, 6);
        assert_eq!(stats.per_view, vec![5, 4]);
        assert_eq!(stats.per_pair_histogram, vec![1, 1, 4]);
        assert_eq!(stats.ignored_pairs, 0);
        Ok(())
    }

    #[test]
    fn test_stats_table() -> Result<(), SelectionError> {
        let mut mask = ArrayD::<f64>::ones(IxDyn(&[2, 3]));
        mask[[1, 2]] = f64::NAN;
        let table = valid_views_stats(mask.view())?.to_string();
        assert!(table.contains("valid observations"));
        assert!(table.contains("1 of 3 correspondences ignored"));
        assert_eq!(table.lines().filter(|l| l.contains(" | ")).count(), 2 + 2 + 3);
        Ok(())
    }
}
