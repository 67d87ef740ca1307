use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::policy::MarketObservation;

/// Outputs of both firm types and the market price over time.
pub fn plot_market(filename: &Path, path: &[MarketObservation]) -> crate::error::Result<()> {
    draw_market(filename, path).map_err(|e| crate::error::Error::Plot(e.to_string()))
}

fn draw_market(filename: &Path, path: &[MarketObservation]) -> Result<(), Box<dyn Error>> {
    let last_period = path.last().map_or(1, |o| o.period.max(1)) as f64;
    let (low, high) = path
        .iter()
        .flat_map(|o| [o.leader_output, o.fringe_output, o.price])
        .fold((0.0f64, 1.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let margin = 0.05 * (high - low);

    let root = BitMapBackend::new(filename, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption("Dominant firm and fringe", ("sans-serif", 40))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..last_period, (low - margin)..(high + margin))?;

    chart.configure_mesh().x_desc("period").draw()?;

    let series: [(&str, RGBColor, fn(&MarketObservation) -> f64); 3] = [
        ("leader output", RED, |o| o.leader_output),
        ("fringe output", BLUE, |o| o.fringe_output),
        ("price", BLACK, |o| o.price),
    ];
    for (label, color, value) in series {
        chart
            .draw_series(LineSeries::new(
                path.iter().map(|o| (o.period as f64, value(o))),
                &color,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
