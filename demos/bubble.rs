use figkit::color::hsv_to_rgb;
use figkit::prelude::*;

fn main() -> figkit::Result<()> {
    let mut rng = xorshift(42);

    let n = 200;
    let points: Vec<Vec<f32>> = (0..n)
        .map(|_| vec![rng() * 100.0, rng() * 100.0])
        .collect();

    // |N(0, 1)| weights, rescaled to [0, 1]
    let raw: Vec<f32> = (0..n)
        .map(|_| {
            let (u1, u2) = (rng().max(1e-7), rng());
            ((-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()).abs()
        })
        .collect();
    let (lo, hi) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let values: Vec<f32> = raw.iter().map(|v| (v - lo) / (hi - lo)).collect();

    let random_colors: Vec<[f32; 3]> = (0..n).map(|_| [rng(), rng(), rng()]).collect();
    let rainbow: Vec<Vec<f32>> = (0..n)
        .map(|i| hsv_to_rgb(i as f32 / (n - 1) as f32, 1.0, 1.0).to_array().to_vec())
        .collect();
    let blue_red = ColorSpec::gradient("#009FFF", "#EC2F4B");

    let base = BubbleOptions::new().radius(5.0).alpha(0.6);
    let cases = [
        base.clone().title("Default colors"),
        base.clone()
            .colors(blue_red.clone())
            .title("Blue to red gradient along x"),
        base.clone()
            .colors(ColorSpec::per_item(random_colors))
            .title("Random color per point"),
        base.clone()
            .colors(ColorSpec::matrix(rainbow))
            .title("Rainbow"),
        base.colors(blue_red)
            .radius(8.0)
            .alpha(0.3)
            .title("Larger radius, lower opacity"),
    ];

    let mut board = dash().columns(3);
    for options in &cases {
        board = board.add(bubble_plot(&points, &values, options)?);
    }
    board.run_local();
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
