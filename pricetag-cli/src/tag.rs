use std::process::ExitCode;

use console::style;
use dialoguer::Confirm;
use pricetag::{
    models::NewTagDefinition,
    tag::FullTag,
    ErrorKind,
};

use crate::{
    args::{TagColumn, TagCommand, TagDisplayOptions},
    get_pricetag,
    table::Table,
    utils::or_dash,
    write_failure, write_success, TERMINAL,
};

pub async fn tag_command(command: &TagCommand) -> anyhow::Result<ExitCode> {
    match command {
        TagCommand::Create {
            full_tag,
            description,
            color,
        } => tag_create(full_tag, description.clone(), color.clone()).await,
        TagCommand::List {
            all,
            display_options,
        } => tag_list(*all, display_options).await,
        TagCommand::Describe {
            full_tag,
            description,
            color,
        } => {
            let pricetag = get_pricetag().await;

            match pricetag
                .update_tag_display(full_tag, description.clone(), color.clone())
                .await
            {
                Ok(definition) => {
                    write_success(&format!("Updated {}", definition.full_tag))?;

                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    write_failure(&format!("Failed {err}"))?;

                    Ok(ExitCode::FAILURE)
                }
            }
        }
        TagCommand::Deactivate { full_tag, yes } => tag_deactivate(full_tag, *yes).await,
        TagCommand::Recount => {
            let drifted = get_pricetag().await.recount_customer_counts().await?;

            write_success(&format!(
                "Recounted customer counts, {} {} corrected",
                style(drifted).bold(),
                if drifted == 1 { "tag" } else { "tags" },
            ))?;

            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn tag_create(
    full_tag: &FullTag,
    description: Option<String>,
    color: Option<String>,
) -> anyhow::Result<ExitCode> {
    let new = NewTagDefinition {
        prefix: full_tag.prefix.clone(),
        code: full_tag.code.clone(),
        description,
        color,
    };

    match get_pricetag().await.create_tag_definition(&new).await {
        Ok(definition) => {
            write_success(&format!("Created {}", definition.full_tag))?;

            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.kind() == ErrorKind::Conflict => {
            write_failure(&format!("Exists {full_tag} is already in the catalog"))?;

            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            write_failure(&format!("Failed {err}"))?;

            Ok(ExitCode::FAILURE)
        }
    }
}

async fn tag_list(all: bool, options: &TagDisplayOptions) -> anyhow::Result<ExitCode> {
    let definitions = get_pricetag().await.list_tag_definitions(all).await?;

    let mut table = Table::new(
        &TERMINAL,
        options.columns.iter().map(TagColumn::behavior).collect(),
    );

    table.push_header(&options.columns)?;

    for definition in &definitions {
        for column in &options.columns {
            match column {
                TagColumn::Id => table.push_cell(definition.tag_id)?,
                TagColumn::FullTag => table.push_cell(&definition.full_tag)?,
                TagColumn::Description => {
                    table.push_cell(or_dash(definition.description.as_deref()))?
                }
                TagColumn::Color => table.push_cell(or_dash(definition.color.as_deref()))?,
                TagColumn::Active => {
                    table.push_cell(if definition.is_active { "yes" } else { "no" })?
                }
                TagColumn::Customers => table.push_cell(definition.customer_count)?,
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn tag_deactivate(full_tag: &str, yes: bool) -> anyhow::Result<ExitCode> {
    let pricetag = get_pricetag().await;

    let definition = match pricetag.get_tag_definition_any(full_tag).await {
        Ok(definition) => definition,
        Err(err) => {
            write_failure(&format!("Failed {err}"))?;

            return Ok(ExitCode::FAILURE);
        }
    };

    if !definition.is_active {
        write_success(&format!("Unchanged {full_tag} is already inactive"))?;

        return Ok(ExitCode::SUCCESS);
    }

    // Existing assignments keep pointing at a deactivated tag.
    if !yes
        && definition.customer_count > 0
        && !Confirm::new()
            .with_prompt(format!(
                "{full_tag} is assigned to {} customers, deactivate anyway?",
                definition.customer_count
            ))
            .default(false)
            .interact()?
    {
        write_failure("Cancelled deactivation")?;

        return Ok(ExitCode::FAILURE);
    }

    let definition = pricetag.deactivate_tag_definition(full_tag).await?;

    write_success(&format!("Deactivated {}", definition.full_tag))?;

    Ok(ExitCode::SUCCESS)
}
