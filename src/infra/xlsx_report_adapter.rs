use crate::app::ports::ReportSink;
use crate::domain::{RunContext, SentimentLabel};
use crate::pipeline::processing::report::AnalysisReport;
use anyhow::Context;
use rust_xlsxwriter::{
    Chart, ChartType, Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

const SUMMARY_SHEET: &str = "Summary";
const DATA_SHEET: &str = "Data";
const CHARTS_SHEET: &str = "Charts";

const ACCENT: u32 = 0x2E75B6;

/// Writes the dashboard as a three-sheet workbook: summary cards and insights, the
/// analyzed rows, and charts of price by category and the sentiment split.
pub struct XlsxReportAdapter {
    output_dir: PathBuf,
}

impl XlsxReportAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl ReportSink for XlsxReportAdapter {
    async fn write_report(
        &self,
        ctx: &RunContext,
        report: &AnalysisReport,
    ) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;
        let path = self
            .output_dir
            .join(format!("dashboard_{}.xlsx", ctx.file_stamp()));

        let formats = Formats::new();
        let mut workbook = Workbook::new();
        workbook.push_worksheet(summary_sheet(report, &formats)?);
        workbook.push_worksheet(data_sheet(report, &formats)?);
        workbook.push_worksheet(charts_sheet(report, &formats)?);
        workbook
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;

        info!("📊 Dashboard written: {}", path.display());
        Ok(path)
    }
}

struct Formats {
    title: Format,
    header: Format,
    cell: Format,
    cell_center: Format,
    currency: Format,
    percent: Format,
    metric: Format,
    metric_label: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(ACCENT))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            header: Format::new()
                .set_bold()
                .set_font_size(12)
                .set_background_color(Color::RGB(0xD9E1F2))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            cell: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Left),
            cell_center: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            currency: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("$#,##0.00"),
            percent: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("0.0%"),
            metric: Format::new()
                .set_bold()
                .set_font_size(24)
                .set_font_color(Color::RGB(ACCENT))
                .set_align(FormatAlign::Center),
            metric_label: Format::new()
                .set_font_size(10)
                .set_font_color(Color::RGB(0x666666))
                .set_align(FormatAlign::Center),
        }
    }
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("${:.2}", v))
}

/// Write a price cell, or "n/a" when the metric is undefined
fn write_price(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
    formats: &Formats,
) -> Result<(), XlsxError> {
    match value {
        Some(v) => sheet.write_number_with_format(row, col, v, &formats.currency)?,
        None => sheet.write_string_with_format(row, col, "n/a", &formats.cell_center)?,
    };
    Ok(())
}

fn summary_sheet(report: &AnalysisReport, formats: &Formats) -> Result<Worksheet, XlsxError> {
    let stats = &report.statistics;
    let mut sheet = Worksheet::new();
    sheet.set_name(SUMMARY_SHEET)?;

    sheet.merge_range(
        0,
        0,
        0,
        5,
        "📊 COMPETITIVE INTELLIGENCE DASHBOARD",
        &formats.title,
    )?;
    sheet.set_row_height(0, 30)?;
    let generated = format!(
        "Generated: {} (run {})",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.run_id
    );
    sheet.write_string(1, 0, &generated)?;

    // Metric cards
    let mut cards = vec![
        (stats.total_products.to_string(), "Products analysed"),
        (money(stats.avg_price), "Average price"),
    ];
    if let Some(pct) = stats.sentiment_share(SentimentLabel::Positive) {
        cards.push((format!("{:.0}%", pct), "Positive sentiment"));
    }
    for (i, (value, label)) in cards.iter().enumerate() {
        let col = (i * 2) as u16;
        sheet.merge_range(4, col, 4, col + 1, value, &formats.metric)?;
        sheet.merge_range(5, col, 5, col + 1, label, &formats.metric_label)?;
    }

    let mut row = 8;
    sheet.write_string_with_format(row, 0, "DETAILED STATISTICS", &formats.header)?;
    row += 1;
    sheet.write_string_with_format(row, 0, "Products", &formats.cell)?;
    sheet.write_number_with_format(row, 1, stats.total_products as f64, &formats.cell_center)?;
    row += 1;
    let prices = [
        ("Average price", stats.avg_price),
        ("Median price", stats.median_price),
        ("Minimum price", stats.min_price),
        ("Maximum price", stats.max_price),
        ("Standard deviation", stats.std_price),
    ];
    for (label, value) in prices {
        sheet.write_string_with_format(row, 0, label, &formats.cell)?;
        write_price(&mut sheet, row, 1, value, formats)?;
        row += 1;
    }
    sheet.write_string_with_format(row, 0, "Rows before cleaning", &formats.cell)?;
    sheet.write_number_with_format(
        row,
        1,
        report.cleaning.initial_rows as f64,
        &formats.cell_center,
    )?;
    row += 1;
    sheet.write_string_with_format(row, 0, "Rows removed", &formats.cell)?;
    sheet.write_number_with_format(
        row,
        1,
        report.cleaning.total_removed() as f64,
        &formats.cell_center,
    )?;
    row += 3;

    sheet.write_string_with_format(row, 0, "💡 BUSINESS INSIGHTS", &formats.header)?;
    row += 1;
    for insight in &report.insights {
        sheet.write_string(row, 0, insight)?;
        row += 1;
    }

    sheet.set_column_width(0, 40)?;
    sheet.set_column_width(1, 15)?;
    for col in 2..=5 {
        sheet.set_column_width(col, 12)?;
    }
    Ok(sheet)
}

fn data_sheet(report: &AnalysisReport, formats: &Formats) -> Result<Worksheet, XlsxError> {
    let with_sentiment = report.records.has_sentiment();
    let mut sheet = Worksheet::new();
    sheet.set_name(DATA_SHEET)?;

    sheet.merge_range(0, 0, 0, 5, "ANALYZED DATA", &formats.title)?;
    sheet.set_row_height(0, 25)?;

    let mut headers = vec!["id", "title", "price", "category"];
    if with_sentiment {
        headers.extend(["sentiment", "sentiment_score"]);
    }
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(2, col as u16, *header, &formats.header)?;
    }

    for (i, record) in report.records.records.iter().enumerate() {
        let row = 3 + i as u32;
        let product = &record.product;
        match &product.id {
            Value::Number(n) => match n.as_f64() {
                Some(id) => sheet.write_number_with_format(row, 0, id, &formats.cell_center)?,
                None => sheet.write_string_with_format(row, 0, &n.to_string(), &formats.cell)?,
            },
            Value::String(s) => sheet.write_string_with_format(row, 0, s, &formats.cell)?,
            Value::Null => sheet.write_blank(row, 0, &formats.cell)?,
            other => sheet.write_string_with_format(row, 0, &other.to_string(), &formats.cell)?,
        };
        sheet.write_string_with_format(row, 1, &product.title_short, &formats.cell)?;
        sheet.write_number_with_format(row, 2, product.price, &formats.currency)?;
        sheet.write_string_with_format(row, 3, &product.category, &formats.cell)?;
        if let Some(sentiment) = record.sentiment {
            sheet.write_string_with_format(
                row,
                4,
                &sentiment.label.to_string(),
                &formats.cell_center,
            )?;
            sheet.write_number_with_format(row, 5, sentiment.score, &formats.percent)?;
        }
    }

    for (col, width) in [8, 50, 12, 20, 15, 15].into_iter().enumerate() {
        sheet.set_column_width(col as u16, width)?;
    }
    Ok(sheet)
}

fn charts_sheet(report: &AnalysisReport, formats: &Formats) -> Result<Worksheet, XlsxError> {
    let stats = &report.statistics;
    let mut sheet = Worksheet::new();
    sheet.set_name(CHARTS_SHEET)?;

    sheet.merge_range(0, 0, 0, 11, "VISUALIZATIONS", &formats.title)?;
    sheet.set_row_height(0, 25)?;

    // Chart source tables sit in columns A:B, charts to their right
    let mut row: u32 = 2;
    if !stats.avg_price_by_category.is_empty() {
        sheet.write_string_with_format(row, 0, "Category", &formats.header)?;
        sheet.write_string_with_format(row, 1, "Average price", &formats.header)?;
        let first = row + 1;
        for (i, (category, price)) in stats.avg_price_by_category.iter().enumerate() {
            sheet.write_string(first + i as u32, 0, category)?;
            sheet.write_number_with_format(first + i as u32, 1, *price, &formats.currency)?;
        }
        let last = first + stats.avg_price_by_category.len() as u32 - 1;

        let mut chart = Chart::new(ChartType::Column);
        chart
            .add_series()
            .set_name("Average price")
            .set_categories((CHARTS_SHEET, first, 0, last, 0))
            .set_values((CHARTS_SHEET, first, 1, last, 1));
        chart.title().set_name("Average price by category");
        chart.x_axis().set_name("Category");
        chart.y_axis().set_name("Price ($)");
        sheet.insert_chart(row, 3, &chart)?;

        row = (last + 2).max(20);
    }

    if let Some(distribution) = stats.sentiment_distribution.as_ref().filter(|d| !d.is_empty()) {
        sheet.write_string_with_format(row, 0, "Sentiment", &formats.header)?;
        sheet.write_string_with_format(row, 1, "Products", &formats.header)?;
        let first = row + 1;
        for (i, (label, count)) in distribution.iter().enumerate() {
            sheet.write_string(first + i as u32, 0, &label.to_string())?;
            sheet.write_number(first + i as u32, 1, *count as f64)?;
        }
        let last = first + distribution.len() as u32 - 1;

        let mut chart = Chart::new(ChartType::Pie);
        chart
            .add_series()
            .set_name("Sentiment")
            .set_categories((CHARTS_SHEET, first, 0, last, 0))
            .set_values((CHARTS_SHEET, first, 1, last, 1));
        chart.title().set_name("Sentiment split");
        sheet.insert_chart(row, 3, &chart)?;
    }

    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 15)?;
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentimentConfig;
    use crate::domain::{EnrichedBatch, RawBatch};
    use crate::pipeline::processing::cleaning::clean;
    use crate::pipeline::processing::enrich::{Enricher, LexiconScorer};
    use crate::pipeline::processing::statistics::compute_statistics;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn report(rows: Value, scored: bool) -> AnalysisReport {
        let raw = RawBatch::from_json_array(rows).unwrap();
        let (batch, audit) = clean(&raw).unwrap();
        let records = if scored {
            Enricher::new(Arc::new(LexiconScorer), &SentimentConfig::default())
                .enrich(&batch)
                .0
        } else {
            EnrichedBatch::from(batch)
        };
        let statistics = compute_statistics(&records);
        AnalysisReport {
            run_id: uuid::Uuid::new_v4(),
            generated_at: Utc::now(),
            cleaning: audit,
            statistics,
            insights: vec!["📊 one insight".to_string()],
            records,
        }
    }

    #[tokio::test]
    async fn test_writes_workbook() {
        let dir = tempdir().unwrap();
        let adapter = XlsxReportAdapter::new(dir.path().join("output"));
        let report = report(
            json!([
                {"id": 1, "title": "Great leather backpack", "price": 109.95, "category": "bags"},
                {"id": "sku-2", "title": "Broken cheap cable", "price": 4.5, "category": "cables"},
                {"id": 3, "title": "Gold ring", "price": 168, "category": "jewelery"}
            ]),
            true,
        );

        let path = adapter
            .write_report(&RunContext::new(), &report)
            .await
            .unwrap();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
        assert!(path.starts_with(dir.path().join("output")));
        let bytes = fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_empty_report_still_writes_workbook() {
        let dir = tempdir().unwrap();
        let adapter = XlsxReportAdapter::new(dir.path());
        let report = report(json!([]), false);

        let path = adapter
            .write_report(&RunContext::new(), &report)
            .await
            .unwrap();

        assert!(path.exists());
    }
}
