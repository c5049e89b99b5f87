/// Regression error summary over a held-out partition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Returns zeroed metrics for empty input.
    pub fn evaluate(predictions: &[f64], actuals: &[f64]) -> Self {
        let n = predictions.len().min(actuals.len());
        if n == 0 {
            return Self::default();
        }

        let sq_err: f64 = predictions
            .iter()
            .zip(actuals.iter())
            .map(|(p, t)| (p - t).powi(2))
            .sum();
        let abs_err: f64 = predictions
            .iter()
            .zip(actuals.iter())
            .map(|(p, t)| (p - t).abs())
            .sum();

        let mean_y = actuals[..n].iter().sum::<f64>() / n as f64;
        let var_y = actuals[..n].iter().map(|t| (t - mean_y).powi(2)).sum::<f64>() / n as f64;
        let mse = sq_err / n as f64;

        Self {
            rmse: mse.sqrt(),
            mae: abs_err / n as f64,
            r2: if var_y > 0.0 { 1.0 - mse / var_y } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let m = RegressionMetrics::evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert!((m.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_errors() {
        let m = RegressionMetrics::evaluate(&[2.0, 2.0], &[0.0, 4.0]);
        assert!((m.rmse - 2.0).abs() < 1e-12);
        assert!((m.mae - 2.0).abs() < 1e-12);
        assert!((m.r2 - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(RegressionMetrics::evaluate(&[], &[]), RegressionMetrics::default());
    }
}
