pub mod communication;
pub mod configuration;
pub mod formatting;
pub mod plugins;
