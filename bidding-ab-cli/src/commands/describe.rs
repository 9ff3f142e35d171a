//! Per-group exploration

use anyhow::{Context as _, Result};
use bidding_ab_stats::{describe_table, GroupOverview};
use comfy_table::Cell;

use super::InputArgs;
use crate::context::Context;
use crate::output::{
    format_value, print_field, print_optional_field, print_section, styled_table, TableDisplay,
};

pub fn execute(ctx: &Context, args: InputArgs) -> Result<()> {
    let config = ctx.settings(|config| args.apply(config))?;
    let table = ctx.load_table(&args.file, &config.data)?;

    let mut overviews =
        describe_table(&table, &config.outliers).context("Failed to describe the groups")?;
    if let Some(metric) = args.metric {
        for overview in &mut overviews {
            overview.metrics.retain(|m| m.metric == metric);
        }
    }

    ctx.output.write_each(&overviews)
}

impl TableDisplay for GroupOverview {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.group),
            Cell::new(self.rows),
            Cell::new(self.rows_dropped),
            Cell::new(self.missing.total()),
            Cell::new(self.totals.purchase),
            Cell::new(self.totals.earning),
        ]
    }

    fn display_single(&self) {
        print_section(&format!(
            "{} group ({})",
            self.group,
            self.group.bidding_method()
        ));
        print_optional_field("Source", self.origin.as_deref());
        print_field("Rows", &self.rows.to_string());
        print_field("Dropped rows", &self.rows_dropped.to_string());
        print_field(
            "Missing values",
            &format!(
                "Impression {}, Click {}, Purchase {}, Earning {}",
                self.missing.impression,
                self.missing.click,
                self.missing.purchase,
                self.missing.earning
            ),
        );
        print_field(
            "Totals",
            &format!(
                "Impression {:.2}, Click {:.2}, Purchase {:.2}, Earning {}",
                self.totals.impression, self.totals.click, self.totals.purchase, self.totals.earning
            ),
        );

        let mut summary = styled_table(&[
            "Metric", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max", "Outliers",
        ]);
        for m in &self.metrics {
            let s = &m.summary;
            summary.add_row(vec![
                Cell::new(m.metric),
                Cell::new(s.count),
                Cell::new(format_value(s.mean)),
                Cell::new(format_value(s.std)),
                Cell::new(format_value(s.min)),
                Cell::new(format_value(s.q25)),
                Cell::new(format_value(s.median)),
                Cell::new(format_value(s.q75)),
                Cell::new(format_value(s.max)),
                Cell::new(m.outliers),
            ]);
        }
        println!("{summary}");

        let mut headers = vec!["Metric".to_string()];
        if let Some(first) = self.metrics.first() {
            headers.extend(
                first
                    .quantiles
                    .iter()
                    .map(|q| format!("{:.0}%", q.quantile * 100.0)),
            );
        }
        headers.push("Low".to_string());
        headers.push("Up".to_string());
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

        let mut quantiles = styled_table(&header_refs);
        for m in &self.metrics {
            let mut row = vec![Cell::new(m.metric)];
            row.extend(m.quantiles.iter().map(|q| Cell::new(format_value(q.value))));
            row.push(Cell::new(format_value(m.thresholds.low)));
            row.push(Cell::new(format_value(m.thresholds.up)));
            quantiles.add_row(row);
        }
        println!("{quantiles}");
    }

    fn display_compact(&self) {
        println!(
            "{}\trows={}\tdropped={}\tmissing={}",
            self.group,
            self.rows,
            self.rows_dropped,
            self.missing.total()
        );
    }
}
