mod cli;
mod config;
mod file_backend;

use crate::cli::{Cli, Command, ExportArgs, ImportArgs, KeysCommand, MigrateCommand};
use crate::config::Config;
use crate::file_backend::FileKeystore;
use clap::Parser;
use sigil_keyring::migration::{self, ExportOptions, ImportOptions};
use sigil_keyring::{Keyring, KeyringConfig};
use sigil_primitives::KeyRecord;
use sigil_secretstore::SecretStoreClient;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
	sigil_telemetry::init_tracing();
	let cli = Cli::parse();
	let json = cli.json;
	if let Err(err) = run(cli).await {
		if json {
			println!("{}", serde_json::json!({ "error": err.to_string() }));
		} else {
			eprintln!("error: {err}");
		}
		std::process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let json = cli.json;
	let config = Config::resolve(cli.bao_addr, cli.bao_token, cli.store_path, json)?;
	let store = SecretStoreClient::new(config.bao_addr.clone(), config.bao_token.clone());
	let keyring = Keyring::new(store, KeyringConfig { index_path: config.store_path.clone() }).await?;

	match cli.command {
		Command::Keys(cmd) => run_keys(&keyring, cmd, json).await,
		Command::Migrate(cmd) => run_migrate(&keyring, cmd, json).await,
	}
}

fn print_value(json: bool, value: impl serde::Serialize, human: impl FnOnce() -> String) {
	if json {
		println!("{}", serde_json::to_string_pretty(&value).expect("value serializes"));
	} else {
		println!("{}", human());
	}
}

fn describe_key(record: &KeyRecord) -> String {
	format!(
		"{}  {}  exportable={}  source={:?}",
		record.name, record.address, record.exportable, record.source
	)
}

async fn run_keys(keyring: &Keyring, cmd: KeysCommand, json: bool) -> anyhow::Result<()> {
	match cmd {
		KeysCommand::List => {
			let keys = keyring.list().await;
			print_value(json, &keys, || {
				if keys.is_empty() {
					"(no keys)".to_string()
				} else {
					keys.iter().map(describe_key).collect::<Vec<_>>().join("\n")
				}
			});
		}
		KeysCommand::Show { name } => {
			let record = keyring.get_metadata(&name).await?;
			print_value(json, &record, || describe_key(&record));
		}
		KeysCommand::Add { name, exportable } => {
			let record = keyring.new_account_with_options(&name, exportable, None).await?;
			print_value(json, &record, || format!("created {}", describe_key(&record)));
		}
		KeysCommand::Delete { name, force } => {
			if !force && !json && !confirm(&format!("delete key `{name}`? [y/N] "))? {
				println!("aborted");
				return Ok(());
			}
			keyring.delete(&name).await?;
			print_value(json, serde_json::json!({ "deleted": name }), || format!("deleted `{name}`"));
		}
		KeysCommand::Rename { old, new } => {
			keyring.rename(&old, &new).await?;
			print_value(json, serde_json::json!({ "old": old, "new": new }), || format!("renamed `{old}` to `{new}`"));
		}
		KeysCommand::ExportPub { name } => {
			let armor = keyring.export_pub_key_armor(&name).await?;
			print_value(json, serde_json::json!({ "armor": armor }), || armor.clone());
		}
	}
	Ok(())
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
	use std::io::Write;
	print!("{prompt}");
	std::io::stdout().flush()?;
	let mut line = String::new();
	std::io::stdin().read_line(&mut line)?;
	Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn require_file_backend(backend: &str) -> anyhow::Result<()> {
	if backend != "file" {
		anyhow::bail!("backend `{backend}` is not implemented; only `file` is supported");
	}
	Ok(())
}

async fn run_migrate(keyring: &Keyring, cmd: MigrateCommand, json: bool) -> anyhow::Result<()> {
	match cmd {
		MigrateCommand::Import(args) => run_import(keyring, args, json).await,
		MigrateCommand::Export(args) => run_export(keyring, args, json).await,
	}
}

async fn run_import(keyring: &Keyring, args: ImportArgs, json: bool) -> anyhow::Result<()> {
	require_file_backend(&args.backend)?;
	if !args.all && args.key_name.is_none() {
		anyhow::bail!("either --all or --key-name is required");
	}
	let source = FileKeystore::open(PathBuf::from(&args.from))?;
	let opts = ImportOptions {
		new_name: args.new_name,
		delete_after_import: args.delete_after_import,
		exportable: args.exportable,
		verify: args.verify,
	};
	let report = migration::import(keyring, &source, args.key_name.as_deref(), None, opts).await?;
	print_value(json, &report, || {
		let mut lines = vec![format!("imported {} key(s)", report.successful.len())];
		lines.extend(report.successful.iter().map(|name| format!("  ok: {name}")));
		lines.extend(report.failed.iter().map(|failure| format!("  failed: {} ({})", failure.name, failure.error)));
		lines.join("\n")
	});
	Ok(())
}

async fn run_export(keyring: &Keyring, args: ExportArgs, json: bool) -> anyhow::Result<()> {
	require_file_backend(&args.backend)?;
	let target = FileKeystore::open(PathBuf::from(&args.to))?;
	let opts = ExportOptions { new_name: args.new_name, verify: args.verify };
	let moved = migration::export(keyring, &target, &args.key_name, &args.confirm, opts).await?;
	print_value(json, serde_json::json!({ "moved": moved }), || {
		if moved {
			format!("exported `{}`", args.key_name)
		} else {
			"confirmation phrase did not match; nothing was moved".to_string()
		}
	});
	Ok(())
}
