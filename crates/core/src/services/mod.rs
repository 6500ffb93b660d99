pub mod analytics_service;
pub mod chart_service;
pub mod price_service;
pub mod returns_service;
pub mod weight_service;
