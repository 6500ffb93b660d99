pub mod analytics;
pub mod chart;
pub mod portfolio;
pub mod price;
pub mod series;
pub mod settings;
