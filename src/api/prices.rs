use crate::api::AppState;
use crate::pricing::PriceTable;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    #[serde(default)]
    pub refresh: bool,
}

pub async fn get_prices(
    Query(params): Query<PricesQuery>,
    State(state): State<AppState>,
) -> Json<PriceTable> {
    Json(state.valuation.price_cache().get_prices(params.refresh).await)
}
