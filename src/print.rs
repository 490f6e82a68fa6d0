use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::benchmark::BenchmarkTable;
use crate::curve::PricingModel;
use crate::display::DisplayPrice;
use crate::resolve::Resolution;

/// Benchmarks alongside the fitted curve and the price actually quoted at each.
pub fn tabulate_benchmarks(benchmarks: &BenchmarkTable, model: &PricingModel) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(14)).with(HAlign::Right)),
            Col::new(
                Styles::default()
                    .with(Separator(true))
                    .with(MinWidth(14))
                    .with(HAlign::Right),
            ),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "# of apps".into(),
                "Benchmark".into(),
                "Fitted".into(),
                "Residual".into(),
                "Quoted".into(),
            ],
        ));

    for point in benchmarks.iter() {
        let fitted = model.params().evaluate(point.input);
        let quoted = model.price_at(point.input);
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", point.input).into(),
                format!("{}", DisplayPrice(point.price)).into(),
                fitted
                    .map(|fitted| format!("{}", DisplayPrice(fitted)))
                    .unwrap_or_else(|err| err.to_string())
                    .into(),
                fitted
                    .map(|fitted| format!("{}", DisplayPrice(fitted - point.price)))
                    .unwrap_or_default()
                    .into(),
                quoted
                    .map(|quoted| format!("{}", DisplayPrice(quoted)))
                    .unwrap_or_default()
                    .into(),
            ],
        ));
    }
    table
}

pub fn tabulate_resolution(resolution: &Resolution, currency: &str) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(18))),
            Col::new(Styles::default().with(MinWidth(16)).with(HAlign::Right)),
        ]);

    let mut push = |label: &str, value: String| {
        table.push_row(Row::new(Styles::default(), vec![label.into(), value.into()]));
    };
    push("Requested # of apps", format!("{}", resolution.query));
    push("Adjusted # of apps", format!("{}", resolution.adjusted));
    push("Pricing", format!("{currency} {}", DisplayPrice(resolution.price)));
    if let Some(estimated) = resolution.estimated {
        push("Estimated", format!("{currency} {}", DisplayPrice(estimated)));
    }
    table
}
