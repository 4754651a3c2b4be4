use figkit::prelude::*;

fn main() -> figkit::Result<()> {
    // a 2 x 2 matrix is read as a row of xs and a row of ys: centres (1, 3) and (2, 4)
    let centers = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    let data = vec![
        vec![[5.0, 6.0], [7.0, 8.0]],
        vec![[9.0, 10.0], [11.0, 12.0]],
    ];
    let options = DivergingOptions::new()
        .colors(ColorSpec::gradient("#ff6e7f", "#bfe9ff"))
        .center_visible(true);

    diverging_scatter(&centers, &data, &options)?.show();
    Ok(())
}
