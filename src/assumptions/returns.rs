//! Capital-market model used to sample annual returns
//!
//! Means come from the scenario's real return fields. This model supplies the
//! volatility of each asset class, the cross-asset correlation matrix and the
//! distribution shape.
//!
//! Defaults (annual, real terms):
//!
//! | class       | volatility |
//! |-------------|-----------:|
//! | equity      | 16%        |
//! | bond        | 6%         |
//! | cash        | 1%         |
//! | alternative | 16%        |
//!
//! Correlations (equity, bond, cash, alternative):
//!
//! ```text
//!              equity  bond  cash  alt
//! equity        1.00   0.10  0.00  0.70
//! bond          0.10   1.00  0.20  0.10
//! cash          0.00   0.20  1.00  0.00
//! alternative   0.70   0.10  0.00  1.00
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::scenario::AssetClass;

/// Lowest return a sampled year can produce (total loss)
pub const MIN_ANNUAL_RETURN: f64 = -1.0;

pub const DEFAULT_VOLATILITIES: [f64; 4] = [0.16, 0.06, 0.01, 0.16];

pub const DEFAULT_CORRELATIONS: [[f64; 4]; 4] = [
    [1.00, 0.10, 0.00, 0.70],
    [0.10, 1.00, 0.20, 0.10],
    [0.00, 0.20, 1.00, 0.00],
    [0.70, 0.10, 0.00, 1.00],
];

/// Shape of the annual return distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDistribution {
    /// r = mean + vol * z, floored at -100%
    #[default]
    Normal,
    /// 1 + r lognormal with the same mean and standard deviation as the normal
    LogNormal,
}

impl ReturnDistribution {
    /// Map a (correlated) standard normal draw to an annual return
    pub fn transform(self, mean: f64, volatility: f64, z: f64) -> f64 {
        if volatility == 0.0 {
            return mean;
        }
        match self {
            ReturnDistribution::Normal => (mean + volatility * z).max(MIN_ANNUAL_RETURN),
            ReturnDistribution::LogNormal => {
                let gross = 1.0 + mean;
                let sigma_sq = (1.0 + (volatility * volatility) / (gross * gross)).ln();
                let mu = gross.ln() - sigma_sq / 2.0;
                (mu + sigma_sq.sqrt() * z).exp() - 1.0
            }
        }
    }
}

/// Volatility, correlation and distribution assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnModel {
    /// Annual volatility by asset class, in `AssetClass::ALL` order
    pub volatilities: [f64; 4],

    /// Correlation matrix, in `AssetClass::ALL` order
    pub correlations: [[f64; 4]; 4],

    pub distribution: ReturnDistribution,
}

impl Default for ReturnModel {
    fn default() -> Self {
        Self::default_capital_market()
    }
}

impl ReturnModel {
    pub fn default_capital_market() -> Self {
        Self {
            volatilities: DEFAULT_VOLATILITIES,
            correlations: DEFAULT_CORRELATIONS,
            distribution: ReturnDistribution::Normal,
        }
    }

    /// Degenerate model: every sampled year equals the mean
    pub fn zero_volatility() -> Self {
        Self {
            volatilities: [0.0; 4],
            ..Self::default_capital_market()
        }
    }

    pub fn volatility(&self, class: AssetClass) -> f64 {
        self.volatilities[class.index()]
    }

    pub fn with_distribution(mut self, distribution: ReturnDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// Check the model and return the lower-triangular Cholesky factor of the
    /// correlation matrix
    pub fn cholesky(&self) -> Result<[[f64; 4]; 4]> {
        for (i, vol) in self.volatilities.iter().enumerate() {
            if !vol.is_finite() || *vol < 0.0 {
                return Err(EngineError::InvalidAssumptions(format!(
                    "{} volatility must be finite and non-negative, got {}",
                    AssetClass::ALL[i].name(),
                    vol
                )));
            }
        }

        let c = &self.correlations;
        for i in 0..4 {
            if (c[i][i] - 1.0).abs() > 1e-9 {
                return Err(EngineError::InvalidAssumptions(format!(
                    "correlation diagonal for {} must be 1, got {}",
                    AssetClass::ALL[i].name(),
                    c[i][i]
                )));
            }
            for j in 0..i {
                if !c[i][j].is_finite() || c[i][j].abs() > 1.0 {
                    return Err(EngineError::InvalidAssumptions(format!(
                        "correlation {}-{} must be in [-1, 1], got {}",
                        AssetClass::ALL[i].name(),
                        AssetClass::ALL[j].name(),
                        c[i][j]
                    )));
                }
                if (c[i][j] - c[j][i]).abs() > 1e-9 {
                    return Err(EngineError::InvalidAssumptions(format!(
                        "correlation matrix is not symmetric at {}-{}",
                        AssetClass::ALL[i].name(),
                        AssetClass::ALL[j].name()
                    )));
                }
            }
        }

        let mut l = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..=i {
                let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
                if i == j {
                    let diag = c[i][i] - sum;
                    if diag <= 0.0 {
                        return Err(EngineError::InvalidAssumptions(
                            "correlation matrix is not positive definite".to_string(),
                        ));
                    }
                    l[i][j] = diag.sqrt();
                } else {
                    l[i][j] = (c[i][j] - sum) / l[j][j];
                }
            }
        }

        Ok(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_cholesky_reproduces_correlations() {
        let model = ReturnModel::default_capital_market();
        let l = model.cholesky().unwrap();

        for i in 0..4 {
            for j in 0..4 {
                let product: f64 = (0..4).map(|k| l[i][k] * l[j][k]).sum();
                assert_abs_diff_eq!(product, model.correlations[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_volatility_ordering() {
        let model = ReturnModel::default_capital_market();
        assert!(model.volatility(AssetClass::Equity) > model.volatility(AssetClass::Bond));
        assert!(model.volatility(AssetClass::Bond) > model.volatility(AssetClass::Cash));
        assert_eq!(
            model.volatility(AssetClass::Alternative),
            model.volatility(AssetClass::Equity)
        );
    }

    #[test]
    fn test_not_positive_definite_rejected() {
        let mut model = ReturnModel::default_capital_market();
        // equity ~ alt ~ bond strongly, but equity-bond strongly negative
        model.correlations[0][3] = 0.95;
        model.correlations[3][0] = 0.95;
        model.correlations[1][3] = 0.95;
        model.correlations[3][1] = 0.95;
        model.correlations[0][1] = -0.95;
        model.correlations[1][0] = -0.95;

        assert!(matches!(model.cholesky(), Err(EngineError::InvalidAssumptions(_))));
    }

    #[test]
    fn test_asymmetric_rejected() {
        let mut model = ReturnModel::default_capital_market();
        model.correlations[0][1] = 0.3;
        assert!(model.cholesky().is_err());
    }

    #[test]
    fn test_zero_volatility_returns_mean_exactly() {
        for dist in [ReturnDistribution::Normal, ReturnDistribution::LogNormal] {
            assert_eq!(dist.transform(0.05, 0.0, 2.5), 0.05);
        }
    }

    #[test]
    fn test_normal_floor() {
        let r = ReturnDistribution::Normal.transform(0.05, 0.16, -20.0);
        assert_eq!(r, MIN_ANNUAL_RETURN);
    }

    #[test]
    fn test_lognormal_median_below_mean() {
        let median = ReturnDistribution::LogNormal.transform(0.05, 0.16, 0.0);
        assert!(median < 0.05);
        assert!(median > -1.0);
    }
}
