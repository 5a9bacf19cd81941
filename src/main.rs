mod auth;
mod cli;
mod exit_codes;
mod logging;
mod output;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use locker::{Account, ApiKey, ItemType, Locker, LockerDir, LockerError, Note};
use tracing::error;
use zeroize::Zeroizing;

use crate::cli::{Cli, Commands, ItemRef};
use crate::logging::LogTarget;

fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(e) = logging::init(LogTarget::from_option(args.log_file.clone())) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(exit_codes::EXIT_IO);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<LockerError>().is_some_and(LockerError::is_fatal) {
                error!(error = %e, "fatal error");
            }
            eprintln!("Error: {e:#}");
            exit_codes::exit_code_for_error(&e)
        }
    }
}

fn resolve_dir(dir: Option<std::path::PathBuf>) -> Result<LockerDir> {
    match dir {
        Some(p) => Ok(LockerDir::new(p)),
        None => Ok(LockerDir::default_location()?),
    }
}

fn open(dir: &LockerDir, name: &str) -> Result<Locker> {
    let passphrase = auth::read_passphrase()?;
    Ok(Locker::open(dir, name, passphrase)?)
}

fn save_and_close(mut locker: Locker) -> Result<()> {
    locker.save()?;
    locker.close()?;
    Ok(())
}

/// Uses the flag value if given, otherwise prompts for it.
fn secret_or_prompt(value: Option<String>, label: &str) -> Result<Zeroizing<String>> {
    match value {
        Some(v) => Ok(Zeroizing::new(v)),
        None => Ok(auth::read_secret(label)?),
    }
}

fn run(args: Cli) -> Result<()> {
    let dir = resolve_dir(args.dir)?;

    match args.command {
        Commands::Lockers { json } => {
            let names = dir.list_names()?;
            if json {
                output::print_json(&names)?;
            } else if names.is_empty() {
                println!("No lockers found.");
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }

        Commands::Create { name } => {
            let passphrase = auth::read_new_passphrase_with_confirmation()?;
            let locker = Locker::create(&dir, &name, passphrase)?;
            println!("locker '{}' created", locker.name());
            locker.close()?;
        }

        Commands::Items {
            locker,
            query,
            json,
        } => {
            let locker = open(&dir, &locker)?;
            let items = locker.items(&query)?;
            if json {
                output::print_json(&items)?;
            } else {
                println!("{}", output::items_text(&items));
            }
            locker.close()?;
        }

        Commands::Show {
            item: ItemRef { locker, key },
            json,
        } => {
            let locker = open(&dir, &locker)?;
            let summary = locker.item_by_key(&key)?;

            match summary.item_type {
                ItemType::ApiKey => {
                    let item = locker.get_apikey(summary.id)?;
                    output::write_apikey(&mut io::stdout().lock(), &item, json)?;
                }
                ItemType::Account => {
                    let item = locker.get_account(summary.id)?;
                    output::write_account(&mut io::stdout().lock(), &item, json)?;
                }
                ItemType::Note => {
                    let item = locker.get_note(summary.id)?;
                    output::write_note(&mut io::stdout().lock(), &item, json)?;
                }
            }
            locker.close()?;
        }

        Commands::AddApikey {
            item: ItemRef { locker, key },
            description,
            value,
        } => {
            let mut locker = open(&dir, &locker)?;
            let value = secret_or_prompt(value, "Value")?;
            locker.add_apikey(&ApiKey::new(key.as_str(), description, value.as_str()))?;
            save_and_close(locker)?;
            println!("stored api key '{key}'");
        }

        Commands::AddAccount {
            item: ItemRef { locker, key },
            description,
            username,
            password,
            url,
        } => {
            let mut locker = open(&dir, &locker)?;
            let password = secret_or_prompt(password, "Password")?;
            locker.add_account(&Account::new(
                key.as_str(),
                description,
                username,
                password.as_str(),
                url,
            ))?;
            save_and_close(locker)?;
            println!("stored account '{key}'");
        }

        Commands::AddNote {
            item: ItemRef { locker, key },
            description,
            text,
        } => {
            let mut locker = open(&dir, &locker)?;
            let text = secret_or_prompt(text, "Text")?;
            locker.add_note(&Note::new(key.as_str(), description, text.as_str()))?;
            save_and_close(locker)?;
            println!("stored note '{key}'");
        }

        Commands::UpdateApikey {
            item: ItemRef { locker, key },
            new_key,
            description,
            value,
        } => {
            let mut locker = open(&dir, &locker)?;
            let id = locker.item_by_key(&key)?.id;
            let current = locker.get_apikey(id)?;
            let value = value.map(Zeroizing::new);

            let updated = ApiKey::new(
                new_key.unwrap_or_else(|| key.clone()),
                description.unwrap_or_else(|| current.description().to_string()),
                value.as_deref().map_or(current.value(), String::as_str),
            );
            locker.update_apikey(id, &updated)?;
            save_and_close(locker)?;
            println!("api key '{key}' updated");
        }

        Commands::UpdateAccount {
            item: ItemRef { locker, key },
            new_key,
            description,
            username,
            password,
            url,
        } => {
            let mut locker = open(&dir, &locker)?;
            let id = locker.item_by_key(&key)?.id;
            let current = locker.get_account(id)?;
            let password = password.map(Zeroizing::new);

            let updated = Account::new(
                new_key.unwrap_or_else(|| key.clone()),
                description.unwrap_or_else(|| current.description().to_string()),
                username.unwrap_or_else(|| current.username().to_string()),
                password.as_deref().map_or(current.password(), String::as_str),
                url.unwrap_or_else(|| current.url().to_string()),
            );
            locker.update_account(id, &updated)?;
            save_and_close(locker)?;
            println!("account '{key}' updated");
        }

        Commands::UpdateNote {
            item: ItemRef { locker, key },
            new_key,
            description,
            text,
        } => {
            let mut locker = open(&dir, &locker)?;
            let id = locker.item_by_key(&key)?.id;
            let current = locker.get_note(id)?;
            let text = text.map(Zeroizing::new);

            let updated = Note::new(
                new_key.unwrap_or_else(|| key.clone()),
                description.unwrap_or_else(|| current.description().to_string()),
                text.as_deref().map_or(current.text(), String::as_str),
            );
            locker.update_note(id, &updated)?;
            save_and_close(locker)?;
            println!("note '{key}' updated");
        }

        Commands::Delete {
            item: ItemRef { locker, key },
        } => {
            let mut locker = open(&dir, &locker)?;
            let id = locker.item_by_key(&key)?.id;
            locker.delete_item(id)?;
            save_and_close(locker)?;
            println!("item '{key}' removed");
        }
    }

    Ok(())
}
