use std::process::ExitCode;

use console::style;
use pricetag::models::{AddressId, Customer, CustomerId, TagRef};

use crate::{
    args::{CustomerColumn, CustomerCommand, CustomerDisplayOptions, OverrideCommand},
    get_pricetag,
    table::Table,
    utils::join_tags,
    write_failure, write_success, TERMINAL,
};

pub async fn customer_command(command: &CustomerCommand) -> anyhow::Result<ExitCode> {
    let pricetag = get_pricetag().await;

    match command {
        CustomerCommand::Create { name } => {
            let customer = pricetag.create_customer(name).await?;

            write_success(&format!(
                "Created {} ({})",
                customer.name, customer.customer_id
            ))?;

            Ok(ExitCode::SUCCESS)
        }
        CustomerCommand::List { display_options } => {
            let customers = pricetag.list_customers().await?;

            print_customers(&customers, display_options)?;

            Ok(ExitCode::SUCCESS)
        }
        CustomerCommand::Show { customer } => {
            let customer = pricetag.get_customer(*customer).await?;

            print_customer(&customer)?;

            Ok(ExitCode::SUCCESS)
        }
        CustomerCommand::AddAddress { customer, label } => {
            let address = pricetag.add_address(*customer, label).await?;

            write_success(&format!("Added {} ({})", address.label, address.address_id))?;

            Ok(ExitCode::SUCCESS)
        }
        CustomerCommand::Assign { customer, full_tag } => report_tags(
            "Assigned",
            full_tag,
            pricetag.assign_customer_tag(*customer, full_tag).await,
        ),
        CustomerCommand::Remove { customer, full_tag } => report_tags(
            "Removed",
            full_tag,
            pricetag.remove_customer_tag(*customer, full_tag).await,
        ),
    }
}

pub async fn override_command(command: &OverrideCommand) -> anyhow::Result<ExitCode> {
    let pricetag = get_pricetag().await;

    match command {
        OverrideCommand::Assign {
            customer,
            address,
            full_tag,
        } => report_tags(
            "Overrode",
            full_tag,
            pricetag
                .assign_address_tag_override(*customer, *address, full_tag)
                .await,
        ),
        OverrideCommand::Remove {
            customer,
            address,
            full_tag,
        } => report_tags(
            "Removed",
            full_tag,
            pricetag
                .remove_address_tag_override(*customer, *address, full_tag)
                .await,
        ),
    }
}

pub async fn resolve(
    customer: CustomerId,
    address: AddressId,
    detailed: bool,
) -> anyhow::Result<ExitCode> {
    let pricetag = get_pricetag().await;

    if detailed {
        let tags = match pricetag.effective_tags_detailed(customer, address).await {
            Ok(tags) => tags,
            Err(err) => {
                write_failure(&format!("Failed {err}"))?;

                return Ok(ExitCode::FAILURE);
            }
        };

        for tag in tags {
            TERMINAL.write_line(&format!(
                "{} {}",
                tag.tag.full_tag,
                style(format!("({})", tag.source)).dim()
            ))?;
        }
    } else {
        let tags = match pricetag.effective_tags(customer, address).await {
            Ok(tags) => tags,
            Err(err) => {
                write_failure(&format!("Failed {err}"))?;

                return Ok(ExitCode::FAILURE);
            }
        };

        for tag in tags {
            TERMINAL.write_line(&tag)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_tags(
    verb: &str,
    full_tag: &str,
    result: Result<Vec<TagRef>, pricetag::Error>,
) -> anyhow::Result<ExitCode> {
    match result {
        Ok(tags) => {
            write_success(&format!("{verb} {full_tag}"))?;

            if tags.is_empty() {
                TERMINAL.write_line(&style("no tags").dim().to_string())?;
            } else {
                TERMINAL.write_line(&join_tags(&tags))?;
            }

            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            write_failure(&format!("Failed {err}"))?;

            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_customer(customer: &Customer) -> anyhow::Result<()> {
    write_success(&format!("Customer {} ({})", customer.name, customer.customer_id))?;
    TERMINAL.write_line(&format!("  tags: {}", join_tags(&customer.tags)))?;

    for address in &customer.addresses {
        TERMINAL.write_line(&format!(
            "  {} {}",
            style(&address.label).bold(),
            style(address.address_id).dim()
        ))?;

        if !address.tag_overrides.is_empty() {
            TERMINAL.write_line(&format!(
                "    overrides: {}",
                join_tags(&address.tag_overrides)
            ))?;
        }
    }

    Ok(())
}

pub fn print_customers(
    customers: &[Customer],
    options: &CustomerDisplayOptions,
) -> anyhow::Result<()> {
    let mut table = Table::new(
        &TERMINAL,
        options.columns.iter().map(CustomerColumn::behavior).collect(),
    );

    table.push_header(&options.columns)?;

    for customer in customers {
        for column in &options.columns {
            match column {
                CustomerColumn::Id => table.push_cell(customer.customer_id)?,
                CustomerColumn::Name => table.push_cell(&customer.name)?,
                CustomerColumn::Tags => table.push_cell(join_tags(&customer.tags))?,
                CustomerColumn::Addresses => table.push_cell(customer.addresses.len())?,
            }
        }
    }

    Ok(())
}
