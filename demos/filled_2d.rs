use figkit::prelude::*;

const LINES: usize = 10;
const MIN_POINTS: usize = 500;
const MAX_POINTS: usize = 1000;
const X_MAX: f32 = 200.0;

fn main() -> figkit::Result<()> {
    let mut rng = xorshift(44);

    // bell-shaped lines starting and ending on the x axis, zero-padded
    let data: Vec<Vec<[f32; 2]>> = (0..LINES)
        .map(|_| {
            let m = MIN_POINTS + (rng() * (MAX_POINTS - MIN_POINTS + 1) as f32) as usize;
            let m = m.min(MAX_POINTS);
            let x_start = rng() * (X_MAX - 50.0);
            let x_end = (x_start + rng() * (X_MAX - x_start)).min(X_MAX);
            let x_mid = (x_start + x_end) * 0.5;
            let sigma = (x_end - x_start) / 6.0;
            let amplitude = rng() * 20.0;

            let mut line: Vec<[f32; 2]> = (0..m)
                .map(|j| {
                    let x = x_start + (x_end - x_start) * j as f32 / (m - 1) as f32;
                    let y = amplitude * (-(x - x_mid).powi(2) / (2.0 * sigma * sigma)).exp();
                    [x, y]
                })
                .collect();
            line.resize(MAX_POINTS, [0.0, 0.0]);
            line
        })
        .collect();

    let hue_wheel = Filled2dOptions::new().title("Default colors: hue wheel from red to violet");
    let gradient = Filled2dOptions::new()
        .colors(ColorSpec::gradient("#ff6e7f", "#bfe9ff"))
        .title("Two-color gradient mapped to x");

    dash()
        .add(filled_2d_line(&data, &hue_wheel)?)
        .add(filled_2d_line(&data, &gradient)?)
        .run_local();
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
