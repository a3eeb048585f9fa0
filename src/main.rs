use clap::Parser;

use offswitch::cli::{self, Cli, Command, ConfigCommand};
use offswitch::{config, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = config::config_path(cli.config.as_deref());
    let settings = match config::load_config(&config_path) {
        Ok(raw) => config::resolve(&raw),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Command::Start) {
        Command::Start => {
            logging::init(&settings.log_level);
            cli::handle_start(settings).await
        }
        Command::Trigger(args) => cli::handle_trigger(&settings, args).await,
        Command::Config(ConfigCommand::Show) => cli::handle_config_show(&settings),
        Command::Config(ConfigCommand::Path) => {
            cli::handle_config_path(cli.config.as_deref());
            Ok(())
        }
        Command::Version => {
            cli::handle_version();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
