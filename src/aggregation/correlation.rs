use crate::filtering::FilteredView;
use crate::Variable;
use polars::prelude::PolarsResult;
use serde::{Deserialize, Serialize};

/// Pearson correlation matrix over a list of variables.
///
/// `values[i][j]` is the correlation between `variables[i]` and `variables[j]`.
/// An entry is `None` when either variable is constant over the view, where the
/// coefficient is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<Variable>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// A correlation matrix prepared for display: entries below the threshold are hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedCorrelation {
    pub threshold: f64,
    pub variables: Vec<Variable>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Computes the full six-variable matrix over the view.
    ///
    /// Returns `None` for views with fewer than two rows.
    pub fn compute(view: &FilteredView) -> PolarsResult<Option<Self>> {
        if view.len() < 2 {
            return Ok(None);
        }
        let columns = Variable::ALL
            .iter()
            .map(|v| view.values(*v))
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(Some(Self::from_columns(Variable::ALL.to_vec(), &columns)))
    }

    pub(crate) fn from_columns(variables: Vec<Variable>, columns: &[Vec<f64>]) -> Self {
        let n = variables.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self { variables, values }
    }

    /// Correlation between two variables, if both are part of the matrix.
    pub fn get(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        self.values[i][j]
    }

    fn position(&self, variable: Variable) -> Option<usize> {
        self.variables.iter().position(|v| *v == variable)
    }

    /// Restricts the matrix to `selection`, in the order given. Values are copied
    /// unchanged; unknown and repeated variables are skipped.
    pub fn select(&self, selection: &[Variable]) -> CorrelationMatrix {
        let mut variables: Vec<Variable> = Vec::with_capacity(selection.len());
        for v in selection {
            if self.position(*v).is_some() && !variables.contains(v) {
                variables.push(*v);
            }
        }
        let values = variables
            .iter()
            .map(|row| {
                variables
                    .iter()
                    .map(|column| self.get(*row, *column))
                    .collect()
            })
            .collect();
        CorrelationMatrix { variables, values }
    }

    /// Hides every entry whose absolute value is below `threshold`.
    /// The matrix itself is left untouched.
    pub fn mask(&self, threshold: f64) -> MaskedCorrelation {
        let cells = self
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|r| r.filter(|r| r.abs() >= threshold))
                    .collect()
            })
            .collect();
        MaskedCorrelation {
            threshold,
            variables: self.variables.clone(),
            cells,
        }
    }

    /// The variable (other than PM2.5) with the largest absolute correlation to PM2.5.
    /// Ties go to the variable listed first.
    pub fn strongest_pm25_relation(&self) -> Option<(Variable, f64)> {
        self.variables
            .iter()
            .filter(|v| **v != Variable::Pm25)
            .filter_map(|v| self.get(Variable::Pm25, *v).map(|r| (*v, r)))
            .fold(None, |best: Option<(Variable, f64)>, (v, r)| match best {
                Some((_, b)) if r.abs() <= b.abs() => best,
                _ => Some((v, r)),
            })
    }
}

/// Pearson correlation coefficient. `None` if either series has zero variance
/// or the lengths differ.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
