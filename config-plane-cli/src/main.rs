mod backend;
mod logging;

use std::thread;
use std::time::Duration;

use clap::Parser;
use config_plane_cli::cli::{Cli, Command};
use config_plane_core::Update;
use eyre::eyre;
use tracing::info;

fn main() -> eyre::Result<()> {
    logging::install()?;
    let cli = Cli::parse();
    let mut repo = backend::open(&cli.backend, &cli.branch)?;

    match cli.command {
        Command::Get { key } => match repo.get(&key)? {
            Some(blob) => println!("{}", String::from_utf8_lossy(&blob)),
            None => println!("<absent>"),
        },

        Command::Set { key, value, delete } => {
            let update = if delete {
                Update::Delete
            } else {
                let value = value.ok_or_else(|| eyre!("a value is required unless --delete is given"))?;
                Update::Set(value.into_bytes().into())
            };
            repo.set(&key, update)?;
            info!(key, "staged");
        }

        Command::Commit => {
            repo.commit()?;
            info!(branch = %cli.branch, "committed");
        }

        Command::Branches => {
            for name in repo.list_branches()? {
                println!("{name}");
            }
        }

        Command::Branch { name, from } => {
            repo.create_branch(&name, from.as_deref())?;
            info!(new_branch = name, "created");
        }

        Command::Switch { name } => {
            repo.switch_branch(&name)?;
            info!(branch = name, "switched");
        }

        Command::Merge { source } => {
            repo.merge(&source)?;
            info!(source, target = %cli.branch, "merged");
        }

        Command::Watch { key: keys, poll_interval } => {
            let mut last: Vec<_> = keys
                .iter()
                .map(|key| repo.get(key))
                .collect::<Result<_, _>>()?;
            for (key, value) in keys.iter().zip(&last) {
                info!(key = %key, value = %describe(value), "watch");
            }
            loop {
                thread::sleep(Duration::from_secs(poll_interval));
                repo.reload()?;
                for (i, key) in keys.iter().enumerate() {
                    let current = repo.get(key)?;
                    if current != last[i] {
                        info!(key = %key, value = %describe(&current), "watch");
                        last[i] = current;
                    }
                }
            }
        }
    }

    Ok(())
}

fn describe(value: &Option<config_plane_core::Blob>) -> String {
    match value {
        Some(blob) => String::from_utf8_lossy(blob).into_owned(),
        None => "<absent>".to_string(),
    }
}
