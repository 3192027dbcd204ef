use crate::middleware::CurrentUser;
use crate::models::{product::format_usd, Identity, Product, StockStatus};
use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: Identity,
    pub current_page: &'static str,
    pub product_count: usize,
    pub units_in_stock: u64,
    pub inventory_value: String,
    pub needs_attention: Vec<Product>,
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let products = state.catalog.list().await?;

    let units_in_stock = products.iter().map(|p| u64::from(p.stock)).sum();
    let inventory_value = products.iter().map(|p| p.price * f64::from(p.stock)).sum();
    let needs_attention = products
        .iter()
        .filter(|p| p.status() != StockStatus::InStock)
        .cloned()
        .collect();

    Ok(DashboardTemplate {
        user,
        current_page: "dashboard",
        product_count: products.len(),
        units_in_stock,
        inventory_value: format_usd(inventory_value),
        needs_attention,
    })
}
