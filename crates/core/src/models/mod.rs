pub mod analysis;
pub mod market;
pub mod series;
pub mod table;
