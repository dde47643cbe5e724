use std::process::ExitCode;

use console::style;
use pricetag::models::Cart;

use crate::{args::CartCommand, get_pricetag, write_failure, write_success, TERMINAL};

pub async fn cart_command(command: &CartCommand) -> anyhow::Result<ExitCode> {
    let pricetag = get_pricetag().await;

    let (verb, result) = match command {
        CartCommand::Create { customer, address } => {
            ("Cart", pricetag.create_cart(*customer, *address).await)
        }
        CartCommand::Show { cart } => ("Cart", pricetag.get_cart(*cart).await),
        CartCommand::Submit { cart } => ("Submitted", pricetag.submit_cart(*cart).await),
    };

    match result {
        Ok(cart) => {
            print_cart(verb, &cart)?;

            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            write_failure(&format!("Failed {err}"))?;

            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_cart(verb: &str, cart: &Cart) -> anyhow::Result<()> {
    write_success(&format!("{verb} {} [{}]", cart.cart_id, cart.status))?;

    TERMINAL.write_line(&format!(
        "  customer {} at {}",
        cart.customer_id, cart.address_id
    ))?;

    if cart.effective_tags.is_empty() {
        TERMINAL.write_line(&format!("  {}", style("no effective tags").dim()))?;
    }

    for tag in &cart.effective_tags {
        TERMINAL.write_line(&format!("  {tag}"))?;
    }

    Ok(())
}
