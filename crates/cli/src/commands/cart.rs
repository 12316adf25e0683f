//! Cart commands.

use fitwear_client::state::AppState;
use fitwear_core::ProductId;

use super::CommandError;

pub async fn add(app: &AppState, product_id: i32, quantity: i64) -> Result<(), CommandError> {
    let product = app.api().get_product(ProductId::new(product_id)).await?;
    app.cart().add_to_cart(&product, quantity)?;
    println!("Added {quantity} x {} to cart", product.name);
    show(app);
    Ok(())
}

pub fn remove(app: &AppState, product_id: i32) {
    app.cart().remove_from_cart(ProductId::new(product_id));
    show(app);
}

pub fn set(app: &AppState, product_id: i32, quantity: i64) -> Result<(), CommandError> {
    app.cart()
        .update_quantity(ProductId::new(product_id), quantity)?;
    show(app);
    Ok(())
}

pub fn show(app: &AppState) {
    let cart = app.cart();
    let lines = cart.lines();
    if lines.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in &lines {
        let price = line
            .unit_price
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "{:>5}  {:<32} {:>4} x {:>9} = {:>10}",
            line.product_id,
            line.name,
            line.quantity,
            price,
            line.line_total()
        );
    }
    println!("{} item(s), total {}", cart.item_count(), cart.total());
}

pub fn clear(app: &AppState) {
    app.cart().clear();
    println!("Cart cleared");
}
