pub mod identity;
pub mod product;

pub use identity::{Identity, Role};
pub use product::{Category, FieldErrors, Product, ProductDraft, ProductForm, StockStatus};
