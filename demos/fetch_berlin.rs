use chrono::Utc;
use std::sync::Arc;
use weather_archive::{ArchiveClient, ArchiveError, FetchParams};

#[tokio::main]
async fn main() -> Result<(), ArchiveError> {
    let client = Arc::new(ArchiveClient::with_default_cache_folder().await?);
    let params = FetchParams::new("52.52", "13.41", "2024-01-01", "2024-01-14");

    if let Err(e) = params.check(Utc::now().date_naive()) {
        eprintln!("{e}");
        return Ok(());
    }

    // Both calls share one request.
    let (a, b) = tokio::join!(client.fetch(&params), client.fetch(&params));
    let weather = a?;
    assert_eq!(Some(&weather), b.as_ref().ok());

    println!("{:<12} {:>7} {:>7} {:>7}", "date", "max", "min", "mean");
    for page in 1..=weather.page_count(5) {
        for day in weather.page(page, 5) {
            println!(
                "{:<12} {:>7} {:>7} {:>7}",
                day.date.to_string(),
                fmt_temp(day.temp_max),
                fmt_temp(day.temp_min),
                fmt_temp(day.temp_mean)
            );
        }
    }

    Ok(())
}

fn fmt_temp(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}
