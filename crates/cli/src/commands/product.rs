//! Owner-mode inventory management commands.

use clap::Subcommand;
use rust_decimal::Decimal;

use vivero_core::ProductId;
use vivero_storefront::{AppError, ProductCatalog, ProductForm, Result, StoreError};

/// Actions on the product catalog.
#[derive(Subcommand)]
pub enum ProductAction {
    /// List every product with price and stock
    List,
    /// Add a new product
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value_t = 0)]
        stock: u32,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image: String,
    },
    /// Update fields of an existing product
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Permanently delete a product
    Delete { id: String },
}

/// Execute a product action.
pub async fn run(catalog: &ProductCatalog, action: ProductAction) -> Result<()> {
    match action {
        ProductAction::List => {
            let mut products = catalog.list_products().await?;
            products.sort_by(|a, b| a.name.cmp(&b.name));
            if products.is_empty() {
                println!("No products");
                return Ok(());
            }
            for product in products {
                println!(
                    "{:<10} {:<28} {:>9} {:>5} in stock  [{}]",
                    product.id,
                    product.name,
                    product.price.display(),
                    product.stock,
                    product.category,
                );
            }
            Ok(())
        }
        ProductAction::Add {
            name,
            price,
            stock,
            category,
            description,
            image,
        } => {
            let form = ProductForm {
                name,
                price,
                stock,
                category,
                description,
                image,
            };
            let id = catalog.create_product(&form).await?;
            println!("Created {id}");
            Ok(())
        }
        ProductAction::Update {
            id,
            name,
            price,
            stock,
            category,
            description,
            image,
        } => {
            let id = ProductId::new(id);
            let existing = catalog.get_product(&id).await?.ok_or_else(|| {
                AppError::from(StoreError::InvalidDocument(format!("no product {id}")))
            })?;

            let form = ProductForm {
                name: name.unwrap_or(existing.name),
                price: price.unwrap_or(existing.price.amount),
                stock: stock.unwrap_or(existing.stock),
                category: Some(category.unwrap_or(existing.category)),
                description: description.unwrap_or(existing.description),
                image: image.unwrap_or(existing.image),
            };
            catalog.update_product(&id, &form).await?;
            println!("Updated {id}");
            Ok(())
        }
        ProductAction::Delete { id } => {
            let id = ProductId::new(id);
            catalog.delete_product(&id).await?;
            println!("Deleted {id}");
            Ok(())
        }
    }
}
