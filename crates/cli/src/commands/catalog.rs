//! Catalogue browsing.

use fitwear_client::models::{Product, ProductQuery};
use fitwear_client::state::AppState;
use fitwear_core::{CategoryId, ProductId};

use super::CommandError;

pub async fn list(
    app: &AppState,
    search: Option<String>,
    category: Option<i32>,
    page: Option<u32>,
) -> Result<(), CommandError> {
    let query = ProductQuery {
        page,
        per_page: None,
        search,
        category_id: category.map(CategoryId::new),
    };
    let listing = app.api().list_products(&query).await?;

    for product in &listing.products {
        println!("{:>5}  {:<40} {:>10}", product.id, product.name, price_label(product));
    }
    println!(
        "page {} of {} ({} products)",
        listing.current_page,
        listing.pages.max(1),
        listing.total
    );
    Ok(())
}

pub async fn show(app: &AppState, id: i32) -> Result<(), CommandError> {
    let product = app.api().get_product(ProductId::new(id)).await?;

    println!("{} (#{})", product.name, product.id);
    println!("  price: {}", price_label(&product));
    for (label, value) in [
        ("sku", &product.sku),
        ("brand", &product.brand),
        ("size", &product.size),
        ("color", &product.color),
        ("about", &product.description),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    Ok(())
}

fn price_label(product: &Product) -> String {
    product
        .selling_price
        .map_or_else(|| "-".to_string(), |price| price.to_string())
}
