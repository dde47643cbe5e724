mod args;
mod bulk;
mod cart;
mod customer;
mod logging;
mod table;
mod tag;
mod utils;

use std::{fs, io, process::ExitCode, sync::Arc};

use args::{Arguments, Command};
use clap::{CommandFactory, Parser};
use console::{Style, Term};
use directories::ProjectDirs;
use indicatif::ProgressStyle;
use lazy_static::lazy_static;
use logging::initialize_logging;
use pricetag::{Pricetag, DEFAULT_CONFIG};
use tokio::sync::OnceCell;
use tracing::error;

lazy_static! {
    pub static ref ARGUMENTS: Arguments = Arguments::parse();
    pub static ref PROJECT_DIRS: ProjectDirs = ProjectDirs::from("dev", "pricetag", "pricetag-cli")
        .expect("could not get project directories");
    pub static ref TERMINAL: Term = Term::stdout();
    pub static ref PREFIX_STYLE: Style = Style::new().green().bold();
    pub static ref ERROR_STYLE: Style = Style::new().red().bold();
    pub static ref SPINNER_STYLE: ProgressStyle =
        ProgressStyle::with_template("{prefix:>12} {spinner} {msg}")
            .expect("invalid spinner template");
}

static PRICETAG: OnceCell<Pricetag> = OnceCell::const_new();

pub async fn get_pricetag() -> &'static Pricetag {
    PRICETAG
        .get_or_init(|| async {
            Pricetag::from_path(ARGUMENTS.config.clone())
                .await
                .expect("could not load config file")
        })
        .await
}

fn ensure_config() -> anyhow::Result<()> {
    if !fs::exists(&ARGUMENTS.config)? {
        fs::create_dir_all(
            ARGUMENTS
                .config
                .parent()
                .ok_or_else(|| anyhow::anyhow!("could not get config path directory"))?,
        )?;
        fs::write(&ARGUMENTS.config, DEFAULT_CONFIG)?;
    }

    Ok(())
}

async fn fallible() -> anyhow::Result<ExitCode> {
    if let Command::Completions { shell } = &ARGUMENTS.command {
        clap_complete::generate(*shell, &mut Arguments::command(), "pricetag", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(err) = ensure_config() {
        error!("Could not create the config: {err}");
        return Ok(ExitCode::FAILURE);
    }

    match &ARGUMENTS.command {
        Command::Tag { command } => tag::tag_command(command).await,
        Command::Customer { command } => customer::customer_command(command).await,
        Command::Override { command } => customer::override_command(command).await,
        Command::Resolve {
            customer,
            address,
            detailed,
        } => customer::resolve(*customer, *address, *detailed).await,
        Command::Cart { command } => cart::cart_command(command).await,
        Command::Bulk { command } => bulk::bulk(command).await,
        Command::Serve => {
            let pricetag = Pricetag::from_path(ARGUMENTS.config.clone()).await?;

            write_success(&format!(
                "Serving on http://{}",
                pricetag.config.http_address
            ))?;

            pricetag::http::serve(Arc::new(pricetag)).await?;

            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { .. } => unreachable!("handled above"),
    }
}

pub fn write_with(string: &str, style: &Style) -> anyhow::Result<()> {
    let Some((first_word, rest)) = string.split_once(" ") else {
        TERMINAL.write_line(&format!("{}", style.apply_to(string)))?;

        return Ok(());
    };

    TERMINAL.write_line(&format!("{} {}", style.apply_to(first_word), rest))?;

    Ok(())
}

pub fn write_success(string: &str) -> anyhow::Result<()> {
    write_with(string, &PREFIX_STYLE)
}

pub fn write_failure(string: &str) -> anyhow::Result<()> {
    write_with(string, &ERROR_STYLE)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    initialize_logging()?;

    let result = fallible().await;

    if let Err(err) = &result {
        error!("Pricetag encountered an error which it could not recover from");
        error!("{err}");
    }

    result
}
