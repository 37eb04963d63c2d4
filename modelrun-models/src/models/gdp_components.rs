//! Expenditure decomposition of GDP
//!
//! Each component starts from its base year value and is carried forward by a growth index
//! (`twKI = 1.03` means 3% growth over the previous year). GDP is the sum of the domestic
//! components plus exports, less imports:
//!
//! $$ PKB = KI + KS + INW + EKS - IMP $$
//!
//! Where:
//! - $KI$ is individual consumption
//! - $KS$ is public consumption
//! - $INW$ is investment
//! - $EKS$ is exports
//! - $IMP$ is imports

use modelrun_core::attribute::{AttributeDefinition, AttributeStore};
use modelrun_core::errors::ModelRunResult;
use modelrun_core::model::Model;
use modelrun_core::register_model;
use modelrun_core::timeseries::Series;
use serde::{Deserialize, Serialize};
use tracing::debug;

const VAR_PKB: &str = "PKB";
const VAR_IMP: &str = "IMP";

/// Components and the growth index that drives each of them
const COMPONENTS: [(&str, &str); 5] = [
    ("KI", "twKI"),
    ("KS", "twKS"),
    ("INW", "twINW"),
    ("EKS", "twEKS"),
    (VAR_IMP, "twIMP"),
];

/// Carry `base[0]` forward by the growth index: `out[t] = out[t - 1] * index[t]`.
///
/// Only the first value of `base` is used.
pub fn grow(base: &Series, index: &Series) -> Series {
    let mut out = Series::zeros(base.len());
    for t in 0..base.len() {
        out[t] = if t == 0 { base[0] } else { out[t - 1] * index[t] };
    }
    out
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdpComponents;

impl Model for GdpComponents {
    fn definitions(&self) -> Vec<AttributeDefinition> {
        let mut definitions = vec![AttributeDefinition::horizon()];
        definitions.extend(
            COMPONENTS
                .iter()
                .map(|(_, index)| AttributeDefinition::series_input(index)),
        );
        definitions.extend(
            COMPONENTS
                .iter()
                .map(|(name, _)| AttributeDefinition::series_state(name)),
        );
        definitions.push(AttributeDefinition::series_output(VAR_PKB));
        definitions
    }

    fn run(&self, attributes: &mut AttributeStore) -> ModelRunResult<()> {
        let mut pkb = Series::zeros(attributes.horizon());

        for (name, index) in COMPONENTS {
            let values = grow(attributes.input(name)?, attributes.input(index)?);
            debug!(
                "{} grows from {:?} to {:?}",
                name,
                values.first(),
                values.last()
            );
            if name == VAR_IMP {
                pkb -= &values;
            } else {
                pkb += &values;
            }
            attributes.set_series(name, values)?;
        }

        attributes.set_series(VAR_PKB, pkb)
    }
}

register_model!(
    GdpComponents,
    name = "GdpComponents",
    description = "GDP by expenditure: PKB = KI + KS + INW + EKS - IMP, each driven by a tw* growth index"
);

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use modelrun_core::handle::ModelHandle;
    use ndarray::array;

    #[test]
    fn test_grow() {
        let out = grow(&array![100.0, 0.0, 0.0], &array![9.0, 1.1, 1.1]);
        assert!(is_close!(out[0], 100.0));
        assert!(is_close!(out[1], 110.0));
        assert!(is_close!(out[2], 121.0));
    }

    #[test]
    fn test_grow_empty() {
        assert_eq!(grow(&Series::zeros(0), &Series::zeros(0)).len(), 0);
    }

    #[test]
    fn test_definitions() {
        let names: Vec<String> = GdpComponents
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "LL", "twKI", "twKS", "twINW", "twEKS", "twIMP", "KI", "KS", "INW", "EKS", "IMP",
                "PKB"
            ]
        );
    }

    #[test]
    fn test_run() {
        let mut handle =
            ModelHandle::from_model("models.GdpComponents", Box::new(GdpComponents)).unwrap();
        handle.set_horizon(2);
        for (name, index) in COMPONENTS {
            handle.set_attribute(index, array![1.0, 1.5]).unwrap();
            handle.set_attribute(name, array![10.0, 10.0]).unwrap();
        }
        handle.set_attribute("IMP", array![20.0, 20.0]).unwrap();
        handle.run().unwrap();

        let pkb = handle.get_attribute(VAR_PKB).unwrap().as_series().unwrap();
        assert!(is_close!(pkb[0], 20.0));
        assert!(is_close!(pkb[1], 30.0));
        let ki = handle.get_attribute("KI").unwrap().as_series().unwrap();
        assert!(is_close!(ki[1], 15.0));
    }

    #[test]
    fn test_missing_component() {
        let mut handle =
            ModelHandle::from_model("models.GdpComponents", Box::new(GdpComponents)).unwrap();
        handle.set_horizon(1);
        let err = handle.run().unwrap_err();
        assert!(err.to_string().contains("input 'KI' is not bound"));
    }
}
