pub mod daily_weather;
pub mod params;
