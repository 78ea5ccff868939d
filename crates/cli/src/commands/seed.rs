//! Seed the local store with a demo plant catalog.

use rust_decimal::Decimal;

use vivero_storefront::{ProductCatalog, ProductForm, Result};

const DEMO_PLANTS: &[(&str, &str, u32, &str, &str)] = &[
    (
        "Monstera Deliciosa",
        "24.99",
        7,
        "Indoor",
        "Large split-leaf tropical, tolerates shade",
    ),
    (
        "Snake Plant",
        "14.50",
        12,
        "Indoor",
        "Near-indestructible, low water",
    ),
    ("Lavender", "6.75", 20, "Outdoor", "Fragrant, loves full sun"),
    ("Rosemary", "5.25", 15, "Herbs", "Culinary herb, drought tolerant"),
    ("Golden Barrel Cactus", "18.00", 4, "Cacti", "Slow growing, bright light"),
    ("Boston Fern", "11.20", 9, "Indoor", "Humidity lover, hanging baskets"),
    ("Tomato Seedling", "2.50", 40, "Edible", "Ready to transplant"),
    ("Japanese Maple", "89.00", 2, "Trees", "Ornamental, partial shade"),
];

/// Write the demo catalog. Refuses to touch a non-empty catalog unless
/// `force` is set.
pub async fn run(catalog: &ProductCatalog, force: bool) -> Result<()> {
    let existing = catalog.list_products().await?;
    if !existing.is_empty() {
        if !force {
            println!(
                "Catalog already holds {} products; re-run with --force to replace them",
                existing.len()
            );
            return Ok(());
        }
        for product in &existing {
            catalog.delete_product(&product.id).await?;
        }
    }

    for (name, price, stock, category, description) in DEMO_PLANTS {
        let form = ProductForm {
            name: (*name).to_owned(),
            price: price.parse::<Decimal>().unwrap_or(Decimal::ZERO),
            stock: *stock,
            category: Some((*category).to_owned()),
            description: (*description).to_owned(),
            image: String::new(),
        };
        let id = catalog.create_product(&form).await?;
        println!("{id}  {name}  ({stock} in stock)");
    }

    println!("Seeded {} products", DEMO_PLANTS.len());
    Ok(())
}
