mod analytics;
mod cli;
mod config;
mod error;
mod matcher;
mod models;
mod reader;
mod scorer;
mod transformer;

use clap::Parser;

use cli::{Cli, Commands, RulesCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            rules,
            output,
            analytics,
            analytics_json,
        } => cli::convert::run(
            &input,
            &rules,
            output.as_deref(),
            analytics,
            analytics_json.as_deref(),
        ),
        Commands::Analyze { input, rules, json } => cli::analyze::run(&input, &rules, json),
        Commands::Rules { command } => match command {
            RulesCommands::List { rules } => cli::rules::list(&rules),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
