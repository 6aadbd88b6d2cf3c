use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::handlers::AppState;
use crate::services::reports::SalesReportQuery;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SalesReportParams {
    pub start_date: String,
    pub end_date: String,
    pub customer_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

impl SalesReportParams {
    /// Converts calendar-date strings to a UTC window covering the whole of
    /// both days: start-day midnight up to (but excluding) the midnight
    /// after the end day.
    fn to_query(&self) -> Result<SalesReportQuery, ApiError> {
        let start = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|e| ApiError::BadRequest(format!("Invalid start date format: {}", e)))?;
        let end = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
            .map_err(|e| ApiError::BadRequest(format!("Invalid end date format: {}", e)))?;
        let end_exclusive = end
            .succ_opt()
            .ok_or_else(|| ApiError::BadRequest("End date out of range".to_string()))?;

        let start_date =
            DateTime::<Utc>::from_naive_utc_and_offset(start.and_hms_opt(0, 0, 0).unwrap(), Utc);
        let end_date = DateTime::<Utc>::from_naive_utc_and_offset(
            end_exclusive.and_hms_opt(0, 0, 0).unwrap(),
            Utc,
        );

        Ok(SalesReportQuery {
            start_date,
            end_date,
            customer_id: self.customer_id,
            product_id: self.product_id,
        })
    }
}

/// Generate a sales report over a date window
async fn generate_sales_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SalesReportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.to_query()?;

    let report = state
        .services
        .reports
        .generate_sales_report(query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Report routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sales", get(generate_sales_report))
}
