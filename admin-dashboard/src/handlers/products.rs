use crate::middleware::CurrentUser;
use crate::models::{Category, FieldErrors, Identity, Product, ProductForm};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use service_core::error::AppError;

const PRODUCTS_PATH: &str = "/dashboard/products";

#[derive(Template)]
#[template(path = "products.html")]
pub struct ProductsTemplate {
    pub user: Identity,
    pub current_page: &'static str,
    pub products: Vec<Product>,
}

#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub user: Identity,
    pub current_page: &'static str,
    pub product: Product,
}

#[derive(Template)]
#[template(path = "product_form.html")]
pub struct ProductFormTemplate {
    pub user: Identity,
    pub current_page: &'static str,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub categories: &'static [Category],
    /// `Some(id)` when editing an existing product.
    pub product_id: Option<String>,
}

impl ProductFormTemplate {
    fn new(user: Identity, form: ProductForm, errors: FieldErrors, product_id: Option<String>) -> Self {
        Self {
            user,
            current_page: "products",
            form,
            errors,
            categories: &Category::ALL,
            product_id,
        }
    }

    pub fn field_error(&self, field: &str) -> &str {
        self.errors.get(field).unwrap_or("")
    }

    /// Form target, also where "Cancel" leads back to.
    pub fn action(&self) -> String {
        match &self.product_id {
            Some(id) => format!("{}/{}", PRODUCTS_PATH, id),
            None => PRODUCTS_PATH.to_string(),
        }
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Product {} not found", id))
}

pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let products = state.catalog.list().await?;

    Ok(ProductsTemplate {
        user,
        current_page: "products",
        products,
    })
}

pub async fn show_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.get(&id).await?.ok_or_else(|| not_found(&id))?;

    Ok(ProductTemplate {
        user,
        current_page: "products",
        product,
    })
}

pub async fn new_product_page(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ProductFormTemplate::new(user, ProductForm::default(), FieldErrors::default(), None)
}

pub async fn edit_product_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.catalog.get(&id).await?.ok_or_else(|| not_found(&id))?;
    let form = ProductForm::from_product(&product);

    Ok(ProductFormTemplate::new(user, form, FieldErrors::default(), Some(id)))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    save_product(&state, user, form, None).await
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    if state.catalog.get(&id).await?.is_none() {
        return Err(not_found(&id));
    }
    save_product(&state, user, form, Some(id)).await
}

/// Validate and persist a submitted form. Invalid input and SKU clashes
/// re-render the form with field messages instead of failing the request.
async fn save_product(
    state: &AppState,
    user: Identity,
    form: ProductForm,
    product_id: Option<String>,
) -> Result<Response, AppError> {
    let draft = match form.clone().into_draft() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(invalid_form(user, form, errors, product_id));
        }
    };

    let result = match &product_id {
        Some(id) => state.catalog.update(id, draft).await,
        None => state.catalog.create(draft).await,
    };

    match result {
        Ok(product) => {
            tracing::info!(
                user_id = %user.id,
                product_id = %product.id,
                updated = product_id.is_some(),
                "Product saved"
            );
            Ok(Redirect::to(PRODUCTS_PATH).into_response())
        }
        Err(AppError::Conflict(err)) => {
            let errors = FieldErrors::single("sku", &err.to_string());
            Ok(invalid_form(user, form, errors, product_id))
        }
        Err(err) => Err(err),
    }
}

fn invalid_form(
    user: Identity,
    form: ProductForm,
    errors: FieldErrors,
    product_id: Option<String>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate::new(user, form, errors, product_id),
    )
        .into_response()
}
