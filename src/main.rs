use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};

use treesync::config::Config;
use treesync::{logging, serve, sync};

///////////////////////
// Utility functions //
///////////////////////

/// Defaults, then the config file, then TREESYNC_* variables, then flags
fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
	let mut config = match matches.get_one::<String>("config") {
		Some(file) => Config::load(Path::new(file))?,
		None => Config::default(),
	};
	config.apply_env()?;

	if let Some(patterns) = matches.get_many::<String>("exclude") {
		config.exclude_patterns.extend(patterns.cloned());
	}
	if let Some((_, sub_matches)) = matches.subcommand() {
		if let Some(port) = sub_matches.try_get_one::<u16>("port").ok().flatten() {
			config.port = *port;
		}
		if let Some(bind) = sub_matches.try_get_one::<String>("bind").ok().flatten() {
			config.bind_address = bind.clone();
		}
	}
	Ok(config)
}

fn dir_arg(matches: &ArgMatches) -> Result<PathBuf, Box<dyn Error>> {
	let dir = matches.get_one::<String>("dir").ok_or("directory argument required")?;
	Ok(PathBuf::from(dir))
}

fn port_arg() -> Arg {
	Arg::new("port")
		.short('p')
		.long("port")
		.value_name("PORT")
		.value_parser(clap::value_parser!(u16))
		.help("TCP port (default 3012)")
}

async fn run(matches: ArgMatches) -> Result<(), Box<dyn Error>> {
	let config = load_config(&matches)?;
	logging::init_tracing(&config.log_level);

	match matches.subcommand() {
		Some(("initiate", sub_matches)) => {
			let dir = dir_arg(sub_matches)?;
			let summary = sync::initiate(&dir, &config).await?;
			println!(
				"{} files: {} pushed ({} bytes), {} pulled ({} bytes)",
				summary.files,
				summary.pushed,
				summary.bytes_sent,
				summary.pulled,
				summary.bytes_received
			);
		}
		Some(("respond", sub_matches)) => {
			let dir = dir_arg(sub_matches)?;
			let peer = sub_matches.get_one::<String>("peer").ok_or("respond: peer argument required")?;
			let summary = serve::respond(&dir, peer, &config).await?;
			println!(
				"Folder sync complete: {} received, {} sent",
				summary.files_received, summary.files_sent
			);
		}
		Some(("tree", sub_matches)) => {
			let dir = dir_arg(sub_matches)?;
			let snapshot = config.snapshot_builder()?.from_path(&dir)?;
			println!("{}", snapshot);
		}
		_ => return Err("unknown subcommand".into()),
	}
	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let matches = Command::new("treesync")
		.version("0.1.0")
		.author("Szilard Hajba <szilard@symbion.hu>")
		.about("One-way directory sync between two peers")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("Config file (.toml or .json5)"),
		)
		.arg(
			Arg::new("exclude")
				.short('x')
				.long("exclude")
				.value_name("GLOB")
				.global(true)
				.action(ArgAction::Append)
				.help("Leave out entries whose name matches GLOB"),
		)
		.subcommand(
			Command::new("initiate")
				.about("Snapshot DIR, wait for a responder and reconcile against it")
				.arg(Arg::new("dir").required(true))
				.arg(
					Arg::new("bind")
						.short('b')
						.long("bind")
						.value_name("ADDR")
						.help("Address to listen on (default 0.0.0.0)"),
				)
				.arg(port_arg()),
		)
		.subcommand(
			Command::new("respond")
				.about("Connect to an initiator and serve DIR until it closes")
				.arg(Arg::new("dir").required(true))
				.arg(Arg::new("peer").required(true))
				.arg(port_arg()),
		)
		.subcommand(
			Command::new("tree")
				.about("Print the snapshot of DIR")
				.arg(Arg::new("dir").required(true)),
		)
		.get_matches();

	if let Err(e) = run(matches).await {
		eprintln!("treesync: {}", e);
		std::process::exit(1);
	}
}

// vim: ts=4
