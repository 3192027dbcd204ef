use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

/// Stock below this many units is reported as low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

const CATEGORY_MESSAGE: &str = "Please select a category.";
const PRICE_MESSAGE: &str = "Price must be a positive number.";
const STOCK_MESSAGE: &str = "Stock must be a non-negative integer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Audio,
    Accessories,
    Furniture,
    Storage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Electronics,
        Category::Audio,
        Category::Accessories,
        Category::Furniture,
        Category::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Audio => "Audio",
            Category::Accessories => "Accessories",
            Category::Furniture => "Furniture",
            Category::Storage => "Storage",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn for_stock(stock: u32) -> Self {
        match stock {
            0 => StockStatus::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    /// CSS modifier for the status badge.
    pub fn badge(&self) -> &'static str {
        match self {
            StockStatus::InStock => "badge-default",
            StockStatus::LowStock => "badge-outline",
            StockStatus::OutOfStock => "badge-destructive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
    pub stock: u32,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn status(&self) -> StockStatus {
        StockStatus::for_stock(self.stock)
    }

    pub fn price_display(&self) -> String {
        format_usd(self.price)
    }

    pub fn created_display(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }

    pub fn updated_display(&self) -> String {
        self.updated_at.format("%Y-%m-%d").to_string()
    }
}

/// `1299.99` -> `$1,299.99`
pub fn format_usd(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Typed create/edit payload accepted by the catalog.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ProductDraft {
    #[validate(length(min = 2, message = "Product name must be at least 2 characters."))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters."))]
    pub description: String,
    pub category: Category,
    #[validate(range(exclusive_min = 0.0, message = "Price must be a positive number."))]
    pub price: f64,
    pub stock: u32,
    #[validate(length(min = 3, message = "SKU must be at least 3 characters."))]
    pub sku: String,
}

/// Raw product form as posted by the browser. Numeric fields stay text until
/// [`ProductForm::into_draft`] so bad input can be reported per field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductForm {
    #[serde(default)]
    #[validate(length(min = 2, message = "Product name must be at least 2 characters."))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "Description must be at least 10 characters."))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub price: String,
    #[serde(default)]
    #[validate(custom(function = "validate_stock"))]
    pub stock: String,
    #[serde(default)]
    #[validate(length(min = 3, message = "SKU must be at least 3 characters."))]
    pub sku: String,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.as_str().to_string(),
            price: format!("{:.2}", product.price),
            stock: product.stock.to_string(),
            sku: product.sku.clone(),
        }
    }

    pub fn into_draft(self) -> Result<ProductDraft, FieldErrors> {
        let form = self.trimmed();
        form.validate()?;

        let category = Category::parse(&form.category)
            .ok_or_else(|| FieldErrors::single("category", CATEGORY_MESSAGE))?;
        let price = parse_price(&form.price).ok_or_else(|| FieldErrors::single("price", PRICE_MESSAGE))?;
        let stock = parse_stock(&form.stock).ok_or_else(|| FieldErrors::single("stock", STOCK_MESSAGE))?;

        Ok(ProductDraft {
            name: form.name,
            description: form.description,
            category,
            price,
            stock,
            sku: form.sku,
        })
    }

    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            price: self.price.trim().to_string(),
            stock: self.stock.trim().to_string(),
            sku: self.sku.trim().to_string(),
        }
    }
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
}

// An empty stock field counts as zero units.
fn parse_stock(value: &str) -> Option<u32> {
    if value.is_empty() {
        return Some(0);
    }
    value.parse::<u32>().ok()
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_category(value: &str) -> Result<(), ValidationError> {
    match Category::parse(value) {
        Some(_) => Ok(()),
        None => Err(validation_error("category", CATEGORY_MESSAGE)),
    }
}

fn validate_price(value: &str) -> Result<(), ValidationError> {
    match parse_price(value.trim()) {
        Some(_) => Ok(()),
        None => Err(validation_error("price", PRICE_MESSAGE)),
    }
}

fn validate_stock(value: &str) -> Result<(), ValidationError> {
    match parse_stock(value.trim()) {
        Some(_) => Ok(()),
        None => Err(validation_error("stock", STOCK_MESSAGE)),
    }
}

/// First validation message per form field, for re-rendering the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.to_string());
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (field, field_errors) in errors.field_errors() {
            let message = field_errors
                .iter()
                .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("Invalid {}", field));
            fields.insert(field.to_string(), message);
        }
        Self(fields)
    }
}
