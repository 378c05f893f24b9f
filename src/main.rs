#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "glbopt", about = "glTF container packing and pruning tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print source and per-category statistics for one asset.
	Info(cmd::info::Args),
	/// Unpack a binary container into a JSON document.
	Unpack(cmd::unpack::Args),
	/// Pack a JSON document into a binary container.
	Pack(cmd::pack::Args),
	/// Run the pruning and packing pipeline over one asset.
	Optimize(cmd::optimize::Args),
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> glbopt::gltf::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Unpack(args) => cmd::unpack::run(args),
		Commands::Pack(args) => cmd::pack::run(args),
		Commands::Optimize(args) => cmd::optimize::run(args),
	}
}
