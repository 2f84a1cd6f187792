use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use chronologicon_core::time::parse_timestamp;
use chronologicon_storage::{SearchQuery, SortKey, SortOrder};

/// Load historical event files and query them.
///
/// Every input file is ingested into an in-process store before the
/// command runs. Results are printed as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "chronologicon", about = "Historical event ingestion and temporal analytics")]
pub struct CliArgs {
    /// Pipe-delimited event files to ingest (repeatable)
    #[arg(short, long = "input", env = "CHRONOLOGICON_INPUT", value_delimiter = ',')]
    pub inputs: Vec<PathBuf>,

    /// Rows per atomic insert (overrides INGEST_BATCH_SIZE)
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest inputs and print the job records
    Ingest,

    /// Largest uncovered span in a window
    Gaps(Window),

    /// Intersecting event pairs inside a window
    Overlaps(Window),

    /// Cheapest parent/child chain between two events
    Path {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
    },

    /// Full hierarchy around an event
    Timeline {
        #[arg(long)]
        event_id: String,
    },

    /// Filter, sort and page through events
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct Window {
    /// Window start (ISO-8601)
    #[arg(long, value_parser = parse_instant)]
    pub start: DateTime<Utc>,

    /// Window end (ISO-8601)
    #[arg(long, value_parser = parse_instant)]
    pub end: DateTime<Utc>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive substring of the event name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_parser = parse_instant)]
    pub start_date_after: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_instant)]
    pub end_date_before: Option<DateTime<Utc>>,

    /// start_date, end_date, event_name or duration_minutes
    #[arg(long, default_value = "start_date")]
    pub sort_by: String,

    /// asc or desc
    #[arg(long, default_value = "asc")]
    pub sort_order: String,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub limit: Option<usize>,
}

impl SearchArgs {
    pub fn into_query(self) -> SearchQuery {
        SearchQuery {
            name: self.name,
            start_date_after: self.start_date_after,
            end_date_before: self.end_date_before,
            sort_by: SortKey::from_param(&self.sort_by),
            sort_order: SortOrder::from_param(&self.sort_order),
            page: self.page,
            limit: self.limit,
        }
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gaps_command() {
        let args = CliArgs::parse_from([
            "chronologicon",
            "-i",
            "a.txt",
            "--input",
            "b.txt",
            "gaps",
            "--start",
            "2023-01-01T00:00:00Z",
            "--end",
            "2023-01-15T00:00:00Z",
        ]);
        assert_eq!(args.inputs, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        match args.command {
            Command::Gaps(w) => assert!(w.start < w.end),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let res = CliArgs::try_parse_from([
            "chronologicon",
            "overlaps",
            "--start",
            "yesterday",
            "--end",
            "2023-01-15T00:00:00Z",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_search_args_into_query() {
        let args = CliArgs::parse_from([
            "chronologicon",
            "search",
            "--name",
            "war",
            "--sort-by",
            "duration_minutes",
            "--sort-order",
            "DESC",
            "--limit",
            "500",
        ]);
        let Command::Search(search) = args.command else {
            panic!("expected search");
        };
        let query = search.into_query();
        assert_eq!(query.sort_by, SortKey::DurationMinutes);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.effective_limit(), 100);
    }
}
