use crate::models::{Category, Product, ProductDraft};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::time::Duration;
use tokio::sync::RwLock;
use validator::Validate;

const ID_PREFIX: &str = "PROD-";

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<Product>, AppError>;
    async fn create(&self, draft: ProductDraft) -> Result<Product, AppError>;
    async fn update(&self, id: &str, draft: ProductDraft) -> Result<Product, AppError>;
}

/// In-memory catalog seeded with demo products, standing in for a database.
pub struct MockCatalog {
    products: RwLock<Vec<Product>>,
    latency: Duration,
}

impl MockCatalog {
    pub fn new(latency: Duration) -> Self {
        Self::with_products(seed_products(), latency)
    }

    pub fn with_products(products: Vec<Product>, latency: Duration) -> Self {
        Self {
            products: RwLock::new(products),
            latency,
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn next_id(products: &[Product]) -> String {
    let max = products
        .iter()
        .filter_map(|p| p.id.strip_prefix(ID_PREFIX))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{}", ID_PREFIX, max + 1)
}

fn ensure_unique_sku(products: &[Product], sku: &str, except_id: Option<&str>) -> Result<(), AppError> {
    let clash = products
        .iter()
        .any(|p| p.sku.eq_ignore_ascii_case(sku) && Some(p.id.as_str()) != except_id);

    if clash {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "A product with SKU {} already exists",
            sku
        )));
    }
    Ok(())
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn list(&self) -> Result<Vec<Product>, AppError> {
        self.simulate_latency().await;
        Ok(self.products.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, AppError> {
        self.simulate_latency().await;
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, AppError> {
        draft.validate()?;
        self.simulate_latency().await;

        let mut products = self.products.write().await;
        ensure_unique_sku(&products, &draft.sku, None)?;

        let now = Utc::now();
        let product = Product {
            id: next_id(&products),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            stock: draft.stock,
            sku: draft.sku,
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());

        tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    async fn update(&self, id: &str, draft: ProductDraft) -> Result<Product, AppError> {
        draft.validate()?;
        self.simulate_latency().await;

        let mut products = self.products.write().await;
        ensure_unique_sku(&products, &draft.sku, Some(id))?;

        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", id)))?;

        product.name = draft.name;
        product.description = draft.description;
        product.category = draft.category;
        product.price = draft.price;
        product.stock = draft.stock;
        product.sku = draft.sku;
        product.updated_at = Utc::now();

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product.clone())
    }
}

fn seeded_at(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    description: &str,
    category: Category,
    price: f64,
    stock: u32,
    sku: &str,
    created_at: i64,
    updated_at: i64,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        price,
        stock,
        sku: sku.to_string(),
        created_at: seeded_at(created_at),
        updated_at: seeded_at(updated_at),
    }
}

pub fn seed_products() -> Vec<Product> {
    vec![
        seed(
            "PROD-1",
            "Premium Laptop",
            "High-performance laptop with the latest processor, 16GB RAM, and 512GB SSD storage. Perfect for professionals and gamers alike.",
            Category::Electronics,
            1299.99,
            45,
            "LAP-PRO-2023",
            1_684_146_600,
            1_687_272_300,
        ),
        seed(
            "PROD-2",
            "Wireless Earbuds",
            "True wireless earbuds with active noise cancellation and a 24-hour charging case.",
            Category::Audio,
            129.99,
            8,
            "AUD-EAR-2023",
            1_680_426_000,
            1_686_500_400,
        ),
        seed(
            "PROD-3",
            "Ergonomic Office Chair",
            "Mesh-back office chair with adjustable lumbar support, armrests and seat depth.",
            Category::Furniture,
            349.00,
            0,
            "FUR-CHR-ERG",
            1_679_127_300,
            1_685_620_800,
        ),
        seed(
            "PROD-4",
            "USB-C Docking Station",
            "Twelve-port docking station with dual HDMI, Ethernet and 100W power delivery.",
            Category::Accessories,
            89.99,
            120,
            "ACC-DCK-USBC",
            1_677_498_300,
            1_685_441_400,
        ),
        seed(
            "PROD-5",
            "Portable SSD 1TB",
            "Rugged USB 3.2 portable solid state drive with read speeds up to 1050MB/s.",
            Category::Storage,
            159.99,
            32,
            "STO-SSD-1TB",
            1_673_271_000,
            1_687_686_000,
        ),
    ]
}
