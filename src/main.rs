//! Credit Summarizer CLI
//!
//! Summarizes credit-card lifecycle events from a JSON document or from an
//! append-only CSV event log.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- summarize input.json
//! cargo run -- append --log events.csv --event-type TXN_AUTHED --time 1 --amount 100
//! cargo run -- report --log events.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `CREDIT_SUMMARIZER_LOG`: Default event log path
//! - `CREDIT_SUMMARIZER_CREDIT_LIMIT`: Default credit limit

use clap::{Args, Parser, Subcommand, ValueEnum};
use credit_summarizer::{
    build_history, Amount, EventLog, EventType, ReducerPolicy, Result, Submission, Summary,
    SummaryInput,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "credit-summarizer",
    version,
    about = "Summarizes credit-card transaction events into balances and transaction lists"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a JSON document of the form {creditLimit, events}
    Summarize {
        /// Input JSON file
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Ignore clearings of unknown transactions and out-of-order times
        #[arg(long)]
        lenient: bool,
    },

    /// Validate a new event against the log and append it
    Append {
        #[command(flatten)]
        log: LogArgs,

        #[command(flatten)]
        reduce: ReduceArgs,

        /// Event type, e.g. TXN_AUTHED
        #[arg(long)]
        event_type: EventType,

        /// Event time (logical clock)
        #[arg(long)]
        time: i64,

        /// Transaction id; assigned automatically for TXN_AUTHED and PAYMENT_INITIATED
        #[arg(long)]
        txn_id: Option<String>,

        /// Amount in whole units (negative for payments)
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<i64>,
    },

    /// Summarize the event log
    Report {
        #[command(flatten)]
        log: LogArgs,

        #[command(flatten)]
        reduce: ReduceArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List every event in the log, oldest first
    History {
        #[command(flatten)]
        log: LogArgs,
    },

    /// List transaction and payment ids that are still open
    Ids {
        #[command(flatten)]
        log: LogArgs,
    },
}

#[derive(Args)]
struct LogArgs {
    /// Event log CSV file
    #[arg(long = "log", env = "CREDIT_SUMMARIZER_LOG")]
    path: PathBuf,
}

#[derive(Args)]
struct ReduceArgs {
    /// Credit limit in whole units
    #[arg(
        long,
        env = "CREDIT_SUMMARIZER_CREDIT_LIMIT",
        default_value_t = 1000,
        allow_hyphen_values = true
    )]
    credit_limit: i64,

    /// Ignore clearings of unknown transactions and out-of-order times
    #[arg(long)]
    lenient: bool,
}

impl ReduceArgs {
    fn policy(&self) -> ReducerPolicy {
        policy(self.lenient)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summarize {
            input,
            format,
            lenient,
        } => {
            let reader = BufReader::new(File::open(input)?);
            let summary = SummaryInput::from_reader(reader)?.summarize(policy(lenient))?;
            print_summary(&summary, format)?;
        }
        Commands::Append {
            log,
            reduce,
            event_type,
            time,
            txn_id,
            amount,
        } => {
            let submission = Submission {
                event_type,
                event_time: time,
                txn_id,
                amount: amount.map(Amount::new),
            };
            let event = EventLog::open(log.path).submit(
                submission,
                Amount::new(reduce.credit_limit),
                reduce.policy(),
            )?;
            println!("{}", serde_json::to_string(&event.to_record())?);
        }
        Commands::Report {
            log,
            reduce,
            format,
        } => {
            let summary = EventLog::open(log.path)
                .summarize(Amount::new(reduce.credit_limit), reduce.policy())?;
            print_summary(&summary, format)?;
        }
        Commands::History { log } => {
            let events = EventLog::open(log.path).list_all()?;
            println!("{}", build_history(&events));
        }
        Commands::Ids { log } => {
            let open = EventLog::open(log.path).open_ids()?;
            println!("Transactions: {}", open.transactions.join(", "));
            println!("Payments: {}", open.payments.join(", "));
        }
    }

    Ok(())
}

fn policy(lenient: bool) -> ReducerPolicy {
    if lenient {
        ReducerPolicy::Lenient
    } else {
        ReducerPolicy::Strict
    }
}

fn print_summary(summary: &Summary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}
