use crate::demo::{print_survey_items, run_demo, DemoArgs};
use crate::server;
use agile_affinity::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Agile Affinity",
    about = "Score team affinity for agile practices and recommend better-fitting alternatives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the personality questionnaire
    Survey {
        #[command(subcommand)]
        command: SurveyCommand,
    },
    /// Seed a sample team, score it, and print the recommendation report
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum SurveyCommand {
    /// List questionnaire items and the dimension each one measures
    Items,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Survey {
            command: SurveyCommand::Items,
        } => {
            print_survey_items();
            Ok(())
        }
        Command::Demo(args) => run_demo(args).await,
    }
}
