//! lrq - run DataSet long-running queries from the command line
//!
//! Usage:
//!   lrq log --filter "error" --start 2024-01-01T00:00:00Z --paginate
//!   lrq top-facets --num-facets 5
//!   lrq plot "count()" --slice-width 5m --breakdown-facet serverHost
//!   lrq pq-table "| group count() by serverHost"
//!
//! The service URL and API key come from `--url`/`--api-key` or the
//! `DATASET_URL`/`DATASET_API_KEY` environment variables. Ctrl-C stops
//! polling and prints whatever the server has produced so far.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dataset_lrq::{
    ClientConfig, Completion, Cursor, DistributionQuery, FacetValuesQuery, LogPaginator, LogQuery,
    LrqClient, LrqError, PlotQuery, PqPlotQuery, PqTableQuery, QueryResult, TopFacetsQuery,
};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lrq")]
#[command(about = "Run DataSet long-running queries", long_about = None)]
struct Args {
    /// Service base URL
    #[arg(long, env = "DATASET_URL")]
    url: String,

    /// API key with query permissions
    #[arg(long, env = "DATASET_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Start of the time range (RFC 3339)
    #[arg(long, global = true)]
    start: Option<DateTime<Utc>>,

    /// End of the time range (RFC 3339)
    #[arg(long, global = true)]
    end: Option<DateTime<Utc>>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Matching log events
    Log {
        #[arg(long)]
        filter: Option<String>,
        /// Maximum matches per request
        #[arg(long)]
        limit: Option<u32>,
        /// Follow cursors until the end of the stream, one JSON line per event
        #[arg(long)]
        paginate: bool,
        /// Resume pagination after this cursor
        #[arg(long, requires = "paginate")]
        cursor: Option<String>,
    },
    /// Histogram of a numeric facet
    Dist {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        facet: Option<String>,
    },
    /// Most frequent facets
    TopFacets {
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        num_values: Option<u32>,
        #[arg(long)]
        num_facets: Option<u32>,
    },
    /// Values of one facet
    FacetValues {
        name: String,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        max_values: Option<u32>,
    },
    /// Time series of an expression
    Plot {
        expression: String,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, conflicts_with = "slice_width")]
        slices: Option<u32>,
        #[arg(long)]
        slice_width: Option<String>,
        #[arg(long)]
        breakdown_facet: Option<String>,
    },
    /// PowerQuery rendered as a plot
    PqPlot { query: String },
    /// PowerQuery rendered as a table
    PqTable { query: String },
}

fn print_result<T: Serialize>(result: &QueryResult<T>) -> Result<(), Box<dyn std::error::Error>> {
    report_completion(result.completion);
    println!("{}", serde_json::to_string_pretty(&result.value)?);
    Ok(())
}

fn report_completion(completion: Completion) {
    if let Completion::Partial { steps_completed, steps_total } = completion {
        eprintln!("warning: partial result ({}/{} steps completed)", steps_completed, steps_total);
    }
}

fn report_resume(paginator: &LogPaginator) {
    if let Some(cursor) = paginator.cursor() {
        eprintln!("interrupted; resume with --cursor {}", cursor);
    }
}

async fn run_logs(
    client: &LrqClient,
    query: LogQuery,
    paginate: bool,
    cursor: Option<String>,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    if !paginate {
        return print_result(&client.logs(&query, cancel).await?);
    }

    let mut paginator = match cursor {
        Some(cursor) => client.resume_logs(query, Cursor::new(cursor)),
        None => client.paginate_logs(query),
    };

    let mut total = 0usize;
    loop {
        let page = match paginator.next_page(cancel).await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(LrqError::RateLimitCancelled) if cancel.is_cancelled() => {
                report_resume(&paginator);
                break;
            }
            Err(err) => return Err(err.into()),
        };
        report_completion(page.completion);
        for log_match in &page.matches {
            println!("{}", serde_json::to_string(log_match)?);
        }
        total += page.matches.len();
        info!(page_matches = page.matches.len(), total, "page received");

        if cancel.is_cancelled() {
            report_resume(&paginator);
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::new(args.url, args.api_key).with_timeout(Duration::from_secs(args.timeout_secs));
    let client = LrqClient::new(config)?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("cancelling...");
        handler_token.cancel();
    })?;

    let (start_time, end_time) = (args.start, args.end);

    match args.command {
        Command::Log { filter, limit, paginate, cursor } => {
            let query = LogQuery { start_time, end_time, filter, limit };
            run_logs(&client, query, paginate, cursor, &cancel).await?;
        }
        Command::Dist { filter, facet } => {
            let query = DistributionQuery { start_time, end_time, filter, facet };
            print_result(&client.distribution(&query, &cancel).await?)?;
        }
        Command::TopFacets { filter, num_values, num_facets } => {
            let query = TopFacetsQuery {
                start_time,
                end_time,
                filter,
                num_values_per_facet: num_values,
                num_facets,
            };
            print_result(&client.top_facets(&query, &cancel).await?)?;
        }
        Command::FacetValues { name, filter, max_values } => {
            let query = FacetValuesQuery { name, start_time, end_time, filter, max_values };
            print_result(&client.facet_values(&query, &cancel).await?)?;
        }
        Command::Plot { expression, filter, slices, slice_width, breakdown_facet } => {
            let query = PlotQuery {
                expression,
                start_time,
                end_time,
                filter,
                slices,
                slice_width,
                breakdown_facet,
            };
            print_result(&client.plot(&query, &cancel).await?)?;
        }
        Command::PqPlot { query } => {
            let query = PqPlotQuery { query, start_time, end_time };
            print_result(&client.pq_plot(&query, &cancel).await?)?;
        }
        Command::PqTable { query } => {
            let query = PqTableQuery { query, start_time, end_time };
            print_result(&client.pq_table(&query, &cancel).await?)?;
        }
    }

    Ok(())
}
