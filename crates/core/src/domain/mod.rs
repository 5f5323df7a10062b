pub mod contract;
pub mod price;
