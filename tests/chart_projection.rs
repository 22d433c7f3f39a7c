// tests/chart_projection.rs
use shorts_channel_analyzer::chart::format_thousands;
use shorts_channel_analyzer::{format_compact, project, ChartLayout, ViewsHistoryPoint};

fn growth() -> Vec<ViewsHistoryPoint> {
    vec![
        ViewsHistoryPoint::new(10, 50_000, Some("2021-12-01".into())),
        ViewsHistoryPoint::new(50, 750_000, Some("2022-06-15".into())),
        ViewsHistoryPoint::new(120, 2_500_000, Some("2023-08-15".into())),
    ]
}

#[test]
fn growth_curve_reaches_top_right_corner() {
    let layout = ChartLayout::default();
    let series = layout.project(&growth()).expect("three samples are plottable");

    let xs: Vec<f64> = series.points.iter().map(|p| p.x).collect();
    assert!(xs.windows(2).all(|w| w[0] < w[1]), "x not increasing: {xs:?}");

    // 1.0 x plot width horizontally, full height upward (y grows downward)
    let top = &series.points[2];
    assert_eq!(top.x, layout.plot_width());
    assert_eq!(top.y, 0.0);
    assert_eq!(layout.plot_height() - top.y, layout.plot_height());

    // views climb, so y falls
    let ys: Vec<f64> = series.points.iter().map(|p| p.y).collect();
    assert!(ys.windows(2).all(|w| w[0] > w[1]), "y not rising: {ys:?}");
}

#[test]
fn single_sample_declines() {
    assert!(project(&growth()[..1]).is_none());
}

#[test]
fn custom_layout_scales_to_its_plot_area() {
    let mut layout = ChartLayout::default();
    layout.width = 1_000.0;
    layout.height = 500.0;
    layout.y_ticks = 4;
    let series = layout.project(&growth()).unwrap();
    assert_eq!(series.plot_width, 930.0);
    assert_eq!(series.plot_height, 430.0);
    assert_eq!(series.y_ticks.len(), 5);
    assert_eq!(series.y_ticks.last().unwrap().label, "2.5M");
}

#[test]
fn labels_for_axis_and_tooltips() {
    assert_eq!(format_compact(2_500_000.0), "2.5M");
    assert_eq!(format_compact(750_000.0), "750.0K");
    assert_eq!(format_compact(500.0), "500");

    let series = project(&growth()).unwrap();
    assert_eq!(series.x_ticks.len(), 2);
    assert_eq!(series.x_ticks[1].label, "120 videos");
    assert_eq!(
        series.points[2].tooltip,
        format!("120 videos, {} views (2023-08-15)", format_thousands(2_500_000))
    );
}

#[test]
fn path_visits_every_point_in_order() {
    let series = project(&growth()).unwrap();
    let path = series.path();
    assert!(path.starts_with("M "));
    assert_eq!(path.matches(" L ").count(), series.points.len() - 1);
}
