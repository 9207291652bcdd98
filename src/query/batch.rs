//! Batch query files.
//!
//! Input holds one request per line, `<count>, <raw query>`: the count is the
//! text before the first comma. Each request produces a block of output:
//!
//! ```text
//! Results for query: "t:rust b:cargo"
//! ------------------- Showing best 2 results (14 found total) :
//! Doc Id: 17, Doc Title: Rust (programming language)
//! Doc Id: 3, Doc Title: Cargo
//! Total query time      : 0.01s
//! Average time per result: 0.00s
//! ```
//!
//! A malformed request is reported in its own block and does not stop the
//! batch.

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::error::{Result, WikindexError};
use crate::query::engine::{QueryEngine, SearchResults};

/// Separator line prefix used in result blocks.
const RULE: &str = "-------------------";

/// Why a single request failed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("expected `<count>, <query>`")]
    MissingSeparator,

    #[error("missing result count")]
    MissingCount,

    #[error("invalid result count {0:?}")]
    InvalidCount(String),

    #[error("query is not valid UTF-8")]
    InvalidEncoding,

    #[error("{0}")]
    Search(#[from] WikindexError),
}

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub num_results: usize,
    pub query: String,
}

impl FromStr for QueryRequest {
    type Err = QueryError;

    fn from_str(line: &str) -> std::result::Result<Self, QueryError> {
        let (count, query) = line.split_once(',').ok_or(QueryError::MissingSeparator)?;
        let count = count.trim();
        if count.is_empty() {
            return Err(QueryError::MissingCount);
        }
        let num_results = count
            .parse::<usize>()
            .map_err(|_| QueryError::InvalidCount(count.to_string()))?;
        Ok(QueryRequest {
            num_results,
            query: query.trim().to_string(),
        })
    }
}

/// Result of evaluating one request line.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The query text, or the whole line when it could not be parsed.
    pub query: String,
    pub num_results: usize,
    pub result: std::result::Result<SearchResults, QueryError>,
    pub elapsed: Duration,
}

impl QueryOutcome {
    fn rejected(line: &str, error: QueryError) -> Self {
        QueryOutcome {
            query: line.trim().to_string(),
            num_results: 0,
            result: Err(error),
            elapsed: Duration::ZERO,
        }
    }
}

/// Parse and run one request line.
pub fn evaluate(engine: &QueryEngine, line: &str) -> QueryOutcome {
    let started = Instant::now();
    let request = match line.parse::<QueryRequest>() {
        Ok(request) => request,
        Err(e) => return QueryOutcome::rejected(line, e),
    };
    let result = engine
        .search(&request.query, request.num_results)
        .map_err(QueryError::from);
    QueryOutcome {
        query: request.query,
        num_results: request.num_results,
        result,
        elapsed: started.elapsed(),
    }
}

/// Read the non-blank request lines of `input`. A line that is not valid
/// UTF-8 is kept as `Err` with its lossily decoded text.
fn read_requests<R: BufRead>(mut input: R) -> Result<Vec<std::result::Result<String, String>>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => lines.push(Ok(line)),
            Err(e) => lines.push(Err(String::from_utf8_lossy(e.as_bytes()).into_owned())),
        }
    }
}

/// Write the output block of one request.
pub fn write_outcome<W: Write + ?Sized>(out: &mut W, outcome: &QueryOutcome) -> Result<()> {
    writeln!(out, "Results for query: \"{}\"", outcome.query)?;
    match &outcome.result {
        Err(e) => {
            writeln!(out, "{RULE} Invalid query: {e}")?;
        }
        Ok(results) => {
            if results.is_empty() {
                writeln!(out, "{RULE} No results found matching this query :(")?;
            } else {
                writeln!(
                    out,
                    "{RULE} Showing best {} results ({} found total) :",
                    outcome.num_results,
                    results.total
                )?;
                for hit in &results.hits {
                    writeln!(out, "Doc Id: {}, Doc Title: {}", hit.doc_id, hit.title)?;
                }
            }
            let secs = outcome.elapsed.as_secs_f64();
            writeln!(out, "Total query time      : {secs:.2}s")?;
            writeln!(
                out,
                "Average time per result: {:.2}s",
                secs / outcome.num_results.max(1) as f64
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out)?;
    Ok(())
}

/// Totals of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub requests: usize,
    pub failed: usize,
}

/// Run every request of `input` and write the result blocks to `output` in
/// request order. Blank lines are ignored.
///
/// With `parallel`, requests are evaluated on the rayon pool. Only I/O
/// errors on `input` or `output` abort the batch; a line that is not valid
/// UTF-8 fails on its own.
pub fn run_batch<R, W>(
    engine: &QueryEngine,
    input: R,
    output: &mut W,
    parallel: bool,
) -> Result<BatchSummary>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let started = Instant::now();
    let lines = read_requests(input)?;
    let evaluate_line = |line: &std::result::Result<String, String>| match line {
        Ok(line) => evaluate(engine, line),
        Err(lossy) => QueryOutcome::rejected(lossy, QueryError::InvalidEncoding),
    };

    let outcomes: Vec<QueryOutcome> = if parallel {
        lines.par_iter().map(evaluate_line).collect()
    } else {
        lines.iter().map(evaluate_line).collect()
    };

    let mut failed = 0;
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            warn!("query {:?} failed: {e}", outcome.query);
            failed += 1;
        }
        write_outcome(output, outcome)?;
    }
    output.flush()?;

    info!(
        "answered {} queries ({} failed) in {:.2}s",
        outcomes.len(),
        failed,
        started.elapsed().as_secs_f64()
    );
    Ok(BatchSummary {
        requests: outcomes.len(),
        failed,
    })
}
