use crate::score::{run_score, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use uplift_policy::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "uplift-policy",
    about = "Score uplift and choose who to contact, from the command line or over HTTP",
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
    /// Score a feature table and write the selected contact list
    Score(ScoreArgs),
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
        Command::Score(args) => run_score(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uplift_policy::scoring::ContactPolicy;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["uplift-policy"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_the_documented_flags() {
        let cli = Cli::try_parse_from([
            "uplift-policy",
            "score",
            "--in",
            "customers.csv",
            "--out",
            "contacts.csv",
            "--policy",
            "bestN",
            "--topn",
            "250",
            "--margin",
            "12.5",
            "--id-col",
            "customer_id",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.input, PathBuf::from("customers.csv"));
                assert_eq!(args.output, PathBuf::from("contacts.csv"));
                assert_eq!(args.policy, ContactPolicy::BestN);
                assert_eq!(args.top_n, Some(250));
                assert_eq!(args.margin, Some(12.5));
                assert_eq!(args.cost, None);
                assert_eq!(args.id_col.as_deref(), Some("customer_id"));
                assert!(!args.allow_empty_best_n);
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn score_defaults_to_threshold_policy() {
        let cli = Cli::try_parse_from([
            "uplift-policy",
            "score",
            "--in",
            "a.csv",
            "--out",
            "b.csv",
        ])
        .expect("parses");
        let Some(Command::Score(args)) = cli.command else {
            panic!("expected score command");
        };
        assert_eq!(args.policy, ContactPolicy::Threshold);
    }

    #[test]
    fn unknown_policy_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "uplift-policy",
            "score",
            "--in",
            "a.csv",
            "--out",
            "b.csv",
            "--policy",
            "everyone",
        ]);
        assert!(result.is_err());
    }
}
