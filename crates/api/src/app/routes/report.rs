//! Per-process pricing report: one row per item with its statistics and the
//! strategy-selected unit estimate, plus the process total. `?format=csv`
//! renders the same table for printing/spreadsheets.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};

use pricelab_core::ItemId;
use pricelab_pricing::{PriceStatistics, PricingStrategy, Process, stats};
use pricelab_storage::{PriceStore, StoreError};

use crate::app::errors;
use crate::app::routes::processes::parse_process_id;
use crate::app::services::AppStore;

pub fn router() -> Router {
    Router::new().route("/processes/:id/report", get(process_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub item_id: ItemId,
    pub item_number: u32,
    pub specification: String,
    pub unit: String,
    pub quantity: f64,
    pub pricing_strategy: PricingStrategy,
    pub quote_count: usize,
    pub statistics: PriceStatistics,
    /// Unit price selected by the item's strategy.
    pub unit_estimate: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub process: Process,
    pub rows: Vec<ReportRow>,
    pub total_estimated: f64,
}

pub async fn process_report(
    Extension(store): Extension<Arc<AppStore>>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> axum::response::Response {
    let process_id = match parse_process_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let report = match build_report(&store, process_id).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "process not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let csv_wanted = query
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("csv"));

    if csv_wanted {
        match render_csv(&report) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "csv rendering failed");
                errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "csv_error", e.to_string())
            }
        }
    } else {
        Json(report).into_response()
    }
}

async fn build_report(
    store: &AppStore,
    process_id: pricelab_core::ProcessId,
) -> Result<Option<ProcessReport>, StoreError> {
    let Some(process) = store.get_process(process_id).await? else {
        return Ok(None);
    };

    let items = store.list_items(process_id).await?;
    let mut rows = Vec::with_capacity(items.len());
    let mut total_estimated = 0.0;

    for item in items {
        let quotes = store.list_quotes(item.id).await?;
        let prices: Vec<f64> = quotes.iter().map(|q| q.unit_price).collect();
        let statistics = stats::compute(&prices, item.quantity);

        let unit_estimate = statistics.unit_estimate(item.pricing_strategy);
        let total = unit_estimate * item.quantity;
        total_estimated += total;

        rows.push(ReportRow {
            item_id: item.id,
            item_number: item.item_number,
            specification: item.specification,
            unit: item.unit,
            quantity: item.quantity,
            pricing_strategy: item.pricing_strategy,
            quote_count: quotes.len(),
            statistics,
            unit_estimate,
            total,
        });
    }

    Ok(Some(ProcessReport { process, rows, total_estimated }))
}

fn render_csv(report: &ProcessReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record([
        "item",
        "specification",
        "unit",
        "quantity",
        "quotes",
        "mean",
        "median",
        "std_dev",
        "cv_pct",
        "sanitized_mean",
        "unit_estimate",
        "total",
    ])?;

    for row in &report.rows {
        wtr.write_record([
            row.item_number.to_string(),
            row.specification.clone(),
            row.unit.clone(),
            format!("{:.2}", row.quantity),
            row.quote_count.to_string(),
            format!("{:.2}", row.statistics.mean),
            format!("{:.2}", row.statistics.median),
            format!("{:.2}", row.statistics.std_dev),
            format!("{:.2}", row.statistics.cv),
            format!("{:.2}", row.statistics.sanitized_mean),
            format!("{:.2}", row.unit_estimate),
            format!("{:.2}", row.total),
        ])?;
    }

    let grand_total = format!("{:.2}", report.total_estimated);
    wtr.write_record([
        "",
        "TOTAL",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        grand_total.as_str(),
    ])?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}
