mod doubler;
mod gdp_components;
mod savings_growth;

pub use doubler::{Doubler, DoublerParameters};
pub use gdp_components::{grow, GdpComponents};
pub use savings_growth::{SavingsGrowth, SavingsGrowthParameters};
