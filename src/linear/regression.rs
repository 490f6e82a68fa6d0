//! Ordinary least-squares regression of price on a transformed input.
//!
//! With the offset held fixed, `a + b·ln(x + c)` is linear in `a` and `b`, so an OLS fit on the
//! regressor `ln(x + c)` lands on (or very near) the least-squares optimum. It is used to seed
//! the nonlinear solver.

use linregress::fit_low_level_regression_model;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};
use tracing::debug;

use crate::benchmark::BenchmarkPoint;
use crate::linear::Matrix;

/// Number of columns in the design matrix: the response, the intercept and the log regressor.
const DESIGN_COLS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    /// `[a, b]`: the intercept and the coefficient of `ln(x + c)`.
    pub coefficients: [f64; 2],
    pub std_errors: [f64; 2],
    pub p_values: [f64; 2],
    pub r_squared: f64,
    pub r_squared_adj: f64,
}
impl RegressionModel {
    /// Fits `price ~ 1 + ln(input + offset)`. Requires more observations than coefficients; the
    /// caller is responsible for ensuring that every `input + offset` is positive.
    pub fn fit(points: &[BenchmarkPoint], offset: f64) -> Result<Self, linregress::Error> {
        let mut data = Matrix::allocate(points.len(), DESIGN_COLS);
        for (row, point) in points.iter().enumerate() {
            data.row_slice_mut(row)
                .copy_from_slice(&[point.price, 1.0, (point.input + offset).ln()]);
        }

        let model = fit_low_level_regression_model(data.flatten(), data.rows(), data.cols())?;
        let (params, std_errors, p_values) = (model.parameters(), model.se(), model.p_values());
        let regression = RegressionModel {
            coefficients: [params[0], params[1]],
            std_errors: [std_errors[0], std_errors[1]],
            p_values: [p_values[0], p_values[1]],
            r_squared: model.rsquared(),
            r_squared_adj: model.rsquared_adj(),
        };
        debug!("regression seed: {regression:?}");
        Ok(regression)
    }

    pub fn tabulate(&self) -> Table {
        let mut table = Table::default()
            .with_cols(vec![
                Col::new(Styles::default().with(MinWidth(12))),
                Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(12)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            ])
            .with_row(Row::new(
                Styles::default().with(Header(true)),
                vec![
                    "Regressor".into(),
                    "Coefficient".into(),
                    "Std. error".into(),
                    "P-value".into(),
                ],
            ));
        for (index, regressor) in ["Intercept", "ln(x + c)"].into_iter().enumerate() {
            table.push_row(Row::new(
                Styles::default(),
                vec![
                    regressor.into(),
                    format!("{:.4}", self.coefficients[index]).into(),
                    format!("{:.4}", self.std_errors[index]).into(),
                    format!("{:.6}", self.p_values[index]).into(),
                ],
            ));
        }
        table.push_row(Row::new(
            Styles::default(),
            vec![
                "R²".into(),
                format!("{:.6}", self.r_squared).into(),
                "".into(),
                "".into(),
            ],
        ));
        table
    }
}
