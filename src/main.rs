use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use blockpaste::{
    platform,
    settings::{default_config_dir, AppSettings},
    BlockStore, PasteEngine, PasteError, SettingsStore, TimerQueue,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Paste saved text blocks into the focused window", long_about = None)]
struct Args {
    /// Settings file (defaults to <config dir>/blockpaste/settings.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show where settings and blocks live and the configured values
    Config,
    /// List block names
    List,
    /// Print a block
    Show { name: String },
    /// Create a block; content comes from --text or stdin
    Add {
        name: String,
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Change a block's content and/or name
    Edit {
        name: String,
        #[arg(short, long)]
        rename: Option<String>,
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Delete a block
    Remove { name: String },
    /// Paste a block into the control that has focus
    Paste {
        name: String,
        /// Wait before pasting so the target window can be focused
        #[arg(short, long, default_value_t = 0)]
        delay_ms: u64,
    },
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed reading block content from stdin")?;
    Ok(text)
}

fn describe_config(settings_path: &Path, store: &BlockStore, settings: &AppSettings) -> String {
    let timing = &settings.timing;
    format!(
        "settings: {}\nblocks:   {}\nhotkey:   {}\nsettle:   {}ms cold, {}ms warm, {}ms after focus\n",
        settings_path.display(),
        store.path().display(),
        settings.hotkey,
        timing.cold_settle_ms,
        timing.warm_settle_ms,
        timing.focus_settle_ms
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings_path = match args.config {
        Some(path) => path,
        None => default_config_dir()
            .context("no config directory on this system, pass --config")?
            .join("settings.json"),
    };
    let settings = SettingsStore::new(settings_path.clone()).load()?;
    let blocks_path = settings
        .resolve_blocks_path()
        .context("no location for the block file, set blocks_path in settings")?;
    let store = BlockStore::new(blocks_path);

    match args.command {
        Command::Config => print!("{}", describe_config(&settings_path, &store, &settings)),
        Command::List => {
            for name in store.list()? {
                println!("{name}");
            }
        }
        Command::Show { name } => {
            let block = store.block(&name)?;
            for line in block.lines {
                println!("{line}");
            }
        }
        Command::Add { name, text } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let name = store.add(&name, &text)?;
            println!("added '{name}'");
        }
        Command::Edit { name, rename, text } => {
            let text = match text {
                Some(text) => text,
                None => store.edit_text(&name)?,
            };
            let new_name = rename.unwrap_or_else(|| name.clone());
            let saved = store.replace(&name, &new_name, &text)?;
            println!("saved '{saved}'");
        }
        Command::Remove { name } => {
            store.delete(&name)?;
            println!("removed '{name}'");
        }
        Command::Paste { name, delay_ms } => {
            let queue = Arc::new(TimerQueue::new());
            let mut engine =
                PasteEngine::new(platform::host_services()?, queue.clone(), settings.timing);
            thread::sleep(Duration::from_millis(delay_ms));

            let result = engine.paste_named(&store, &name);
            // Let the deferred restore run before the process exits.
            queue.run_until_idle();
            log::debug!("engine {}", engine.state().label());
            match result {
                Ok(report) => log::info!("'{name}' pasted via {}", report.delivered_by.label()),
                Err(err @ PasteError::PasteDeliveryFailed { .. }) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
