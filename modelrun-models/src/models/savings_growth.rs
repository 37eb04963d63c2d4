//! Savings account balance with yearly deposits
//!
//! Interest earned over year $t$ is paid on the balance at the end of year $t-1$:
//!
//! $$ interest_t = balance_{t-1} \cdot ((1 + rate_t / n)^n - 1) $$
//! $$ balance_t = balance_{t-1} + interest_t + deposit_t $$
//!
//! Where $n$ is the number of compounding periods per year. The first balance is the
//! opening balance supplied with the data.

use modelrun_core::attribute::{AttributeDefinition, AttributeStore};
use modelrun_core::errors::{ModelRunError, ModelRunResult};
use modelrun_core::model::Model;
use modelrun_core::register_model;
use modelrun_core::timeseries::{FloatValue, Series};
use serde::{Deserialize, Serialize};

const VAR_DEPOSIT: &str = "deposit";
const VAR_RATE: &str = "rate";
const VAR_BALANCE: &str = "balance";
const VAR_INTEREST: &str = "interest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGrowthParameters {
    /// Compounding periods per year
    pub periods_per_year: u32,
}

impl Default for SavingsGrowthParameters {
    fn default() -> Self {
        Self {
            periods_per_year: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingsGrowth {
    parameters: SavingsGrowthParameters,
}

impl SavingsGrowth {
    pub fn from_parameters(parameters: SavingsGrowthParameters) -> Self {
        Self { parameters }
    }

    /// Effective yearly rate for a nominal yearly rate
    pub fn effective_rate(&self, rate: FloatValue) -> FloatValue {
        let n = self.parameters.periods_per_year as FloatValue;
        (1.0 + rate / n).powf(n) - 1.0
    }
}

impl Model for SavingsGrowth {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::horizon(),
            AttributeDefinition::series_input(VAR_DEPOSIT),
            AttributeDefinition::series_input(VAR_RATE),
            AttributeDefinition::series_state(VAR_BALANCE),
            AttributeDefinition::series_output(VAR_INTEREST),
        ]
    }

    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
        if self.parameters.periods_per_year == 0 {
            return Err(ModelRunError::ModelExecution {
                model: "SavingsGrowth".to_string(),
                cause: "periods_per_year must be at least 1".to_string(),
            });
        }

        let deposit = attributes.input(VAR_DEPOSIT)?;
        let rate = attributes.input(VAR_RATE)?;
        let mut balance = attributes.input(VAR_BALANCE)?.clone();
        let mut interest = Series::zeros(balance.len());

        for t in 1..balance.len() {
            interest[t] = balance[t - 1] * self.effective_rate(rate[t]);
            balance[t] = balance[t - 1] + interest[t] + deposit[t];
        }

        attributes.set_series(VAR_BALANCE, balance)?;
        attributes.set_series(VAR_INTEREST, interest)
    }
}

register_model!(
    SavingsGrowth,
    name = "SavingsGrowth",
    description = "Savings balance compounding at a yearly rate with yearly deposits"
);

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use modelrun_core::handle::ModelHandle;
    use ndarray::array;

    fn run(model: SavingsGrowth) -> ModelHandle {
        let mut handle = ModelHandle::from_model("models.SavingsGrowth", Box::new(model)).unwrap();
        handle.set_horizon(3);
        handle.set_attribute(VAR_DEPOSIT, array![0.0, 100.0, 100.0]).unwrap();
        handle.set_attribute(VAR_RATE, array![0.1, 0.1, 0.1]).unwrap();
        handle.set_attribute(VAR_BALANCE, array![1000.0, 0.0, 0.0]).unwrap();
        handle.run().unwrap();
        handle
    }

    #[test]
    fn test_effective_rate() {
        let yearly = SavingsGrowth::default();
        assert!(is_close!(yearly.effective_rate(0.1), 0.1));

        let monthly = SavingsGrowth::from_parameters(SavingsGrowthParameters {
            periods_per_year: 12,
        });
        assert!(monthly.effective_rate(0.1) > 0.1);
    }

    #[test]
    fn test_yearly_compounding() {
        let handle = run(SavingsGrowth::default());

        let balance = handle.get_attribute(VAR_BALANCE).unwrap().as_series().unwrap();
        assert!(is_close!(balance[0], 1000.0));
        assert!(is_close!(balance[1], 1200.0));
        assert!(is_close!(balance[2], 1420.0));

        let interest = handle.get_attribute(VAR_INTEREST).unwrap().as_series().unwrap();
        assert!(is_close!(interest[0], 0.0));
        assert!(is_close!(interest[1], 100.0));
        assert!(is_close!(interest[2], 120.0));
    }

    #[test]
    fn test_zero_periods() {
        let model = SavingsGrowth::from_parameters(SavingsGrowthParameters {
            periods_per_year: 0,
        });
        let mut handle = ModelHandle::from_model("models.SavingsGrowth", Box::new(model)).unwrap();
        assert!(handle.run().is_err());
    }
}
