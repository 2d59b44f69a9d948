pub mod analyzer;
pub mod chart;
pub mod export;
