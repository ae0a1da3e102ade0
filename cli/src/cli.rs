//! The `sigil` command tree: `keys` manages the local keyring,
//! `migrate` moves key material to/from a foreign keyring format.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sigil", about = "Manage keys held by the signing control plane's keyring")]
pub struct Cli {
	/// Secret store base URL. Falls back to `BAO_ADDR`.
	#[arg(long, global = true)]
	pub bao_addr: Option<String>,

	/// Secret store auth token. Falls back to `BAO_TOKEN`.
	#[arg(long, global = true)]
	pub bao_token: Option<String>,

	/// Path to the local keyring index file. Falls back to `BAO_STORE_PATH`.
	#[arg(long, global = true)]
	pub store_path: Option<PathBuf>,

	/// Emit machine-readable JSON instead of human-formatted text.
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Key lifecycle: list, inspect, create, delete, rename, export a public key.
	#[command(subcommand)]
	Keys(KeysCommand),
	/// Move key material to or from a foreign keyring format.
	#[command(subcommand)]
	Migrate(MigrateCommand),
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
	/// List every key in the local keyring.
	List,
	/// Show one key's metadata.
	Show { name: String },
	/// Create a new key in the secret store and record it locally.
	Add {
		name: String,
		/// Mark the key's private material as exportable via `migrate export`.
		#[arg(long)]
		exportable: bool,
	},
	/// Delete a key from both the secret store and the local index.
	Delete {
		name: String,
		#[arg(short = 'f', long = "force", alias = "yes", visible_short_alias = 'y')]
		force: bool,
	},
	/// Rename a key in the local index.
	Rename { old: String, new: String },
	/// Print a key's armored public key.
	ExportPub { name: String },
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
	/// Import one or every key from a foreign keyring into this one.
	Import(ImportArgs),
	/// Export one key's private material from this keyring into a foreign one.
	Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
	/// Path (or connection string) identifying the foreign keyring.
	#[arg(long)]
	pub from: String,
	/// Foreign keyring format. Only `file` is implemented.
	#[arg(long, default_value = "file")]
	pub backend: String,
	/// Import exactly this key.
	#[arg(long, conflicts_with = "all")]
	pub key_name: Option<String>,
	/// Import every key the source reports.
	#[arg(long)]
	pub all: bool,
	/// Rename the key on import. Only valid with `--key-name`.
	#[arg(long, requires = "key_name")]
	pub new_name: Option<String>,
	#[arg(long)]
	pub delete_after_import: bool,
	#[arg(long)]
	pub exportable: bool,
	/// Verify the imported key by requesting a throwaway signature from the source.
	#[arg(long)]
	pub verify: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
	/// Path (or connection string) identifying the foreign keyring.
	#[arg(long)]
	pub to: String,
	/// Foreign keyring format. Only `file` is implemented.
	#[arg(long, default_value = "file")]
	pub backend: String,
	#[arg(long)]
	pub key_name: String,
	#[arg(long)]
	pub new_name: Option<String>,
	/// Must equal exactly `"I understand this compromises key security"`.
	#[arg(long)]
	pub confirm: String,
	#[arg(long)]
	pub verify: bool,
}
