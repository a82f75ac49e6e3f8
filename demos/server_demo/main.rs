//! # wryfig demo application
//!
//! A sample server launcher that shows how to wire
//! [wryfig](https://docs.rs/wryfig) into a clap application. It does not
//! start anything; it prints the resolved configuration and where each value
//! came from.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example server_demo -- --database-url sqlite://demo.db
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                        |
//! |-----------------------|---------------------------------------------------------------------------|
//! | Defaults              | `cargo run --example server_demo -- --database-url x`                     |
//! | Env var               | `DEMO_PORT=9000 cargo run --example server_demo -- --database-url x`      |
//! | Config file           | `cargo run --example server_demo -- -c server.json`                       |
//! | CLI beats file        | `cargo run --example server_demo -- -c server.json --port 7000`           |
//! | Boolean pair          | `cargo run --example server_demo -- --verbose --no-verbose ...`           |
//! | Comma list            | `cargo run --example server_demo -- --tags a,b,c ...`                     |
//! | Env var table         | `cargo run --example server_demo -- --show-env-vars`                      |
//! | Missing required      | `cargo run --example server_demo`                                         |
//! | Save resolved config  | `cargo run --example server_demo -- --database-url x --save out.json`     |

mod config;

use std::path::PathBuf;

use clap::{Arg, Command};
use wryfig::{Wryfig, cli, ops};

use config::ServerConfig;

fn command() -> Command {
    Command::new("server-demo")
        .about("wryfig demo: resolve a server configuration and show its sources")
        .arg(
            Arg::new("save")
                .long("save")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write the resolved configuration to a JSON file"),
        )
}

fn main() {
    let schema = <ServerConfig as wryfig::Model>::schema().unwrap_or_else(|e| {
        eprintln!("Invalid schema:\n{e}");
        std::process::exit(1);
    });

    let mut cmd = cli::augment_command(command(), &schema);
    let matches = cmd.clone().get_matches();

    if cli::show_env_vars(&matches) {
        println!("{}", cli::render_env_vars(&[&schema]));
        return;
    }

    let config = match Wryfig::builder::<ServerConfig>().arg_matches(&matches).load() {
        Ok(config) => config,
        Err(e) if e.is_config_file_error() => cli::to_clap_error(&mut cmd, &e).exit(),
        Err(e) => {
            eprintln!("Failed to load config:\n{e}");
            std::process::exit(1);
        }
    };

    match ops::source_listing(&config) {
        Ok(listing) => println!("{listing}"),
        Err(e) => eprintln!("Failed to list sources:\n{e}"),
    }

    if config.verbose {
        println!();
        for (source, fields) in config.sources_summary() {
            println!("{source}: {}", fields.join(", "));
        }
    }

    if let Some(path) = matches.get_one::<PathBuf>("save") {
        if let Err(e) = config.to_json_file(path) {
            eprintln!("Failed to save config:\n{e}");
            std::process::exit(1);
        }
        println!("saved to {}", path.display());
    }
}
