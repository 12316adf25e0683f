//! Checkout and purchase history.

use fitwear_client::models::Purchase;
use fitwear_client::state::AppState;
use fitwear_core::{PaymentMethod, PurchaseId};

use super::CommandError;

pub async fn checkout(app: &AppState, payment: PaymentMethod) -> Result<(), CommandError> {
    let mut flow = app.checkout();
    flow.begin()?;

    let purchase = flow.confirm(payment).await?;
    println!(
        "Purchase #{} placed: {} paid by {payment}",
        purchase.id, purchase.total_amount
    );
    Ok(())
}

pub async fn list(app: &AppState, page: u32) -> Result<(), CommandError> {
    let history = app.api().list_purchases(page).await?;
    if history.purchases.is_empty() {
        println!("No purchases yet");
        return Ok(());
    }

    for purchase in &history.purchases {
        summary(purchase);
    }
    println!(
        "page {} of {} ({} purchases)",
        history.current_page.max(1),
        history.pages.max(1),
        history.total
    );
    Ok(())
}

pub async fn show(app: &AppState, id: i32) -> Result<(), CommandError> {
    let purchase = app.api().get_purchase(PurchaseId::new(id)).await?;
    summary(&purchase);
    for item in &purchase.items {
        println!(
            "        product {:>5}  {:>4} x {:>9} = {:>10}",
            item.product_id, item.quantity, item.unit_price, item.total_price
        );
    }
    if let Some(notes) = &purchase.notes {
        println!("        notes: {notes}");
    }
    Ok(())
}

pub async fn cancel(app: &AppState, id: i32) -> Result<(), CommandError> {
    let id = PurchaseId::new(id);
    let current = app.api().get_purchase(id).await?;
    if !current.status.is_cancellable() {
        eprintln!(
            "Purchase #{id} is {:?}; only pending purchases can be cancelled",
            current.status
        );
        return Ok(());
    }

    let purchase = app.api().cancel_purchase(id).await?;
    println!("Purchase #{} is now {:?}", purchase.id, purchase.status);
    Ok(())
}

fn summary(purchase: &Purchase) {
    let method = purchase
        .payment_method
        .map_or_else(|| "-".to_string(), |m| m.to_string());
    println!(
        "#{:<6} {}  {:>10}  {:<5} {:?}",
        purchase.id,
        purchase.created_at.format("%Y-%m-%d %H:%M"),
        purchase.total_amount,
        method,
        purchase.status
    );
}
