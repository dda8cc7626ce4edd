use serde_json::json;

use crate::backend::ProductBackend;
use crate::cli::utils::{connect, output_empty_collection};
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let backend = connect().await?;
    let products = backend.list_products().await?;

    if products.is_empty() {
        return output_empty_collection(&output_format, "products", "No products");
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "products": products }))?);
        }
        OutputFormat::Text => {
            println!("{:<36} {:<30} {:>10} {:>12}", "ID", "NAME", "QUANTITY", "PRICE");
            println!("{}", "-".repeat(91));
            for product in &products {
                println!(
                    "{:<36} {:<30} {:>10} {:>12}",
                    product.id, product.name, product.quantity, product.price
                );
            }
        }
    }
    Ok(())
}
