pub mod csv_provider;
pub mod price_provider;
