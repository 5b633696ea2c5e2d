mod f1live;
mod jolpica;
mod newsapi;
mod openf1;
mod openweather;
mod timezonedb;
mod wikipedia;
mod youtube;

pub use f1live::F1LiveAdapter;
pub use jolpica::JolpicaAdapter;
pub use newsapi::NewsApiAdapter;
pub use openf1::{session_label, OpenF1Adapter};
pub use openweather::{nearest_forecast_index, OpenWeatherAdapter};
pub use timezonedb::{zone_name_or_utc, TimeZoneDbAdapter, TIMEZONE_CACHE_CAPACITY};
pub use wikipedia::{title_from_url, WikipediaAdapter, IMAGE_CACHE_CAPACITY};
pub use youtube::YouTubeAdapter;
