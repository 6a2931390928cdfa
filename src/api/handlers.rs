// API request handlers
// Author: Gabriel Demetrios Lafis

use actix_web::{web, HttpResponse};

use crate::data::{DimensionName, MetricName, RecordSet};
use crate::processing::{self, LimitProcessor, Pipeline, SkipProcessor};
use crate::query::{self, DateRange, DEFAULT_RANGE_NAME};
use super::{models::*, ApiError, AppState};

/// Rows returned by `/records` when no limit is given
pub const DEFAULT_RECORDS_LIMIT: usize = 1000;

/// Groups returned by `/top` when no `top_n` is given
pub const DEFAULT_TOP_N: usize = 10;

/// Run the blocking load off the async workers
async fn load(state: &web::Data<AppState>, range: Option<String>) -> Result<(DateRange, RecordSet), ApiError> {
    let state = state.clone();
    let result = web::block(move || {
        let range = state.resolve_range(range.as_deref());
        state.load(range).map(|set| (range, set))
    })
    .await?;

    Ok(result?)
}

/// Named ranges a dashboard can offer
pub async fn list_ranges() -> HttpResponse {
    HttpResponse::Ok().json(RangesResponse {
        ranges: query::range_names().into_iter().map(str::to_string).collect(),
        default: DEFAULT_RANGE_NAME.to_string(),
    })
}

/// Sites the configured credential can read
pub async fn list_sites(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let sites = web::block(move || state.sites()).await??;

    Ok(HttpResponse::Ok().json(SitesResponse { sites }))
}

/// Redacted records with where they came from
pub async fn get_records(
    state: web::Data<AppState>,
    params: web::Query<RecordsQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let (range, set) = load(&state, params.range).await?;
    let info = LoadInfo::from_set(&set, range);
    let total = set.len();

    let page = Pipeline::new("records_page")
        .add(SkipProcessor::new(params.offset.unwrap_or(0)))
        .add(LimitProcessor::new(params.limit.unwrap_or(DEFAULT_RECORDS_LIMIT)))
        .execute(&set)?;

    Ok(HttpResponse::Ok().json(RecordsResponse {
        info,
        total,
        records: page.into_records(),
    }))
}

/// Best groups of one dimension by a metric
pub async fn top_by_dimension(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<TopQuery>,
) -> Result<HttpResponse, ApiError> {
    let dimension: DimensionName = path
        .into_inner()
        .parse()
        .map_err(|e: crate::data::UnknownDimensionError| ApiError::ValidationError(e.to_string()))?;

    let params = params.into_inner();
    let metric: MetricName = match params.metric.as_deref() {
        Some(name) => name
            .parse()
            .map_err(|e: crate::data::UnknownMetricError| ApiError::ValidationError(e.to_string()))?,
        None => MetricName::Clicks,
    };
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);
    if top_n == 0 {
        return Err(ApiError::ValidationError("top_n must be at least 1".to_string()));
    }

    let (range, set) = load(&state, params.range).await?;
    let rows = processing::aggregate(&set.records, dimension, metric, top_n)?;

    Ok(HttpResponse::Ok().json(TopResponse {
        info: LoadInfo::from_set(&set, range),
        dimension: dimension.to_string(),
        metric: metric.to_string(),
        rows,
    }))
}

/// Totals over the range
pub async fn get_summary(
    state: web::Data<AppState>,
    params: web::Query<RangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let (range, set) = load(&state, params.into_inner().range).await?;

    Ok(HttpResponse::Ok().json(SummaryResponse {
        info: LoadInfo::from_set(&set, range),
        summary: processing::summarize(&set.records),
    }))
}

/// Daily metrics, oldest first
pub async fn get_time_series(
    state: web::Data<AppState>,
    params: web::Query<RangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let (range, set) = load(&state, params.into_inner().range).await?;

    Ok(HttpResponse::Ok().json(TimeSeriesResponse {
        info: LoadInfo::from_set(&set, range),
        points: processing::time_series(&set.records),
    }))
}
