use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{Record, Value},
    protocol::{ApiOutcome, ExecuteOptions, Notification},
    schema::{Element, ScreenSchema},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use view_core::{Collaborators, HttpFetcher, ScreenContext};

mod config;
mod console;

use config::{load_settings, DEFAULT_CONFIG_FILE};
use console::{ConsoleNotifier, LogNavigator, StdinConfirmer};

#[derive(Parser, Debug)]
#[command(name = "screenctl", about = "Drive a declarative screen schema from the terminal")]
struct Cli {
    /// Screen schema (JSON).
    #[arg(long)]
    schema: PathBuf,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    api_origin: Option<String>,
    /// Approve confirmation prompts without asking.
    #[arg(long, short = 'y')]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the visibility/enablement verdict of each element for a record.
    Resolve {
        #[arg(long, default_value = "{}")]
        record: String,
    },
    /// Check a form's required fields against a set of values.
    Validate {
        #[arg(long)]
        form: String,
        #[arg(long, default_value = "{}")]
        values: String,
    },
    /// Submit a form through the screen API.
    Submit {
        #[arg(long)]
        form: String,
        #[arg(long, default_value = "{}")]
        values: String,
        /// Active record for forms bound to their drawer's payload.
        #[arg(long)]
        record: Option<String>,
    },
    /// Run one symbolic action.
    Exec {
        action: String,
        #[arg(long)]
        item: Option<String>,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        success: Option<String>,
        #[arg(long)]
        error: Option<String>,
        /// Ask before running the action.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Fetch the screen's list.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(origin) = &cli.api_origin {
        settings.api_origin = origin.clone();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let raw = fs::read_to_string(&cli.schema)
        .with_context(|| format!("failed to read schema '{}'", cli.schema.display()))?;
    let schema = ScreenSchema::from_json(&raw)
        .with_context(|| format!("failed to parse schema '{}'", cli.schema.display()))?;

    let fetcher = HttpFetcher::new(
        &settings.api_origin,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let collaborators = Collaborators::default()
        .with_fetcher(Arc::new(fetcher))
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_navigator(Arc::new(LogNavigator))
        .with_confirmer(Arc::new(StdinConfirmer {
            assume_yes: cli.yes,
        }));
    let ctx = ScreenContext::new(&schema, collaborators);
    info!(
        "screenctl: loaded screen base_url={} actions={} drawers={}",
        schema.base_url,
        schema.api.len(),
        schema.drawers.len()
    );

    match cli.command {
        Command::Resolve { record } => {
            let record = parse_record(&record, "record")?;
            for element in &schema.elements {
                print_verdicts(&ctx, element, &record, 0);
            }
            for (name, drawer) in &schema.drawers {
                println!("drawer {name}");
                for element in &drawer.elements {
                    print_verdicts(&ctx, element, &record, 1);
                }
            }
        }
        Command::Validate { form, values } => {
            let element = find_form(&schema, &form)?;
            let controller = ctx
                .form(element)
                .ok_or_else(|| anyhow!("element '{form}' is not a form"))?;
            for (name, value) in parse_record(&values, "values")? {
                controller.set_value(&name, value);
            }
            let missing = controller.validate();
            if missing.is_empty() {
                println!("ok");
            } else {
                for name in &missing {
                    let message = controller.error(name).unwrap_or_default();
                    println!("{name}: {message}");
                }
                bail!("{} required field(s) missing", missing.len());
            }
        }
        Command::Submit {
            form,
            values,
            record,
        } => {
            let element = find_form(&schema, &form)?;
            if let Some(record) = record {
                let drawer = drawer_containing(&schema, &form)
                    .ok_or_else(|| anyhow!("form '{form}' is not inside a drawer"))?;
                ctx.open_drawer(&drawer, Some(parse_record(&record, "record")?))
                    .map_err(|err| anyhow!(err.message))?;
            }
            let controller = ctx
                .form(element)
                .ok_or_else(|| anyhow!("element '{form}' is not a form"))?;
            for (name, value) in parse_record(&values, "values")? {
                controller.set_value(&name, value);
            }
            report(controller.submit().await.into_outcome())?;
        }
        Command::Exec {
            action,
            item,
            data,
            success,
            error,
            confirm,
        } => {
            let item = item.map(|raw| parse_record(&raw, "item")).transpose()?;
            let options = match data {
                Some(raw) => ExecuteOptions::with_data(
                    serde_json::from_str::<Value>(&raw).context("--data is not valid json")?,
                ),
                None => ExecuteOptions::default(),
            };
            let notification = Notification { success, error };
            let view = ctx.view();
            let outcome = match confirm {
                Some(message) => {
                    view.confirm_and_execute(&message, &action, item.as_ref(), options, Some(&notification))
                        .await
                }
                None => {
                    view.execute_api(&action, item.as_ref(), options, Some(&notification))
                        .await
                }
            };
            report(outcome)?;
        }
        Command::List => {
            report(ctx.view().fetch_list().await)?;
        }
    }

    Ok(())
}

fn parse_record(raw: &str, label: &str) -> Result<Record> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("--{label} is not valid json"))? {
        Value::Object(record) => Ok(record),
        other => bail!("--{label} must be a json object, got {other}"),
    }
}

fn find_form<'a>(schema: &'a ScreenSchema, id: &str) -> Result<&'a Element> {
    schema
        .find_element(id)
        .ok_or_else(|| anyhow!("no element with id '{id}'"))
}

fn drawer_containing(schema: &ScreenSchema, id: &str) -> Option<String> {
    schema
        .drawers
        .iter()
        .find(|(_, def)| def.elements.iter().any(|e| e.find(id).is_some()))
        .map(|(name, _)| name.clone())
}

fn print_verdicts(ctx: &ScreenContext, element: &Element, record: &Record, depth: usize) {
    let verdict = ctx.resolve(element, record);
    let label = element
        .id
        .as_deref()
        .or(element.name.as_deref())
        .or(element.label.as_deref())
        .unwrap_or("-");
    println!(
        "{}{} {label} visible={} enabled={}",
        "  ".repeat(depth),
        element.kind.type_name(),
        verdict.visible,
        verdict.enabled
    );
    // Hidden elements are never mounted, so neither are their children.
    if verdict.visible {
        for child in element.children() {
            print_verdicts(ctx, child, record, depth + 1);
        }
    }
}

fn report(outcome: ApiOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if let Some(err) = outcome.error {
        bail!("{:?}: {}", err.code, err.message);
    }
    Ok(())
}
