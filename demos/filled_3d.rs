use chrono::{Duration, NaiveDate};
use figkit::prelude::*;

fn main() -> figkit::Result<()> {
    let mut rng = xorshift(42);

    let n_time = 10;
    let n_cat = 3;
    let data: Vec<Vec<f32>> = (0..n_time)
        .map(|_| (0..n_cat).map(|_| rng() * 100.0).collect())
        .collect();

    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let time = TimeVector::Dates((0..n_time).map(|i| start + Duration::days(i)).collect());

    let options = Filled3dOptions::new()
        .colors(ColorSpec::gradient("#D9FF88", "#FFFFFF"))
        .categories(["Category A", "Category B", "Category C"])
        .title("三维填充折线图测试");

    filled_3d_line(&data, &time, &options)?.show();
    Ok(())
}

fn xorshift(mut seed: u64) -> impl FnMut() -> f32 {
    move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed as f32 / u64::MAX as f32
    }
}
