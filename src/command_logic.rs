pub mod browse;
pub mod list;
