pub mod aggregation;
pub mod boxplots;
pub mod pdf_export;
pub mod statistics;
