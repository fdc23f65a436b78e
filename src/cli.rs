//! Command-line arguments for `rfm-segment`

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use std::path::PathBuf;

use crate::segments::Segment;

/// Score customers by recency, frequency and monetary value and assign segments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Transaction export (CSV, Online Retail II columns)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the per-customer result table
    #[arg(short, long, default_value = "rfm.csv")]
    pub output: PathBuf,

    /// Reference date (YYYY-MM-DD); defaults to latest invoice day + offset
    #[arg(short, long)]
    pub reference_date: Option<String>,

    /// Days added to the latest invoice day when no reference date is given
    #[arg(long)]
    pub offset_days: Option<u32>,

    /// JSON file with an ordered list of segment rules
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Segment whose customer ids should be written out separately
    #[arg(long, requires = "extract_output")]
    pub extract: Option<String>,

    /// Destination for the extracted id list
    #[arg(long, requires = "extract")]
    pub extract_output: Option<PathBuf>,

    /// Print per-segment counts and averages
    #[arg(short, long)]
    pub summary: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse `--reference-date`; a bare date means midnight
    pub fn parse_reference_date(&self) -> Result<Option<NaiveDateTime>> {
        let Some(ref text) = self.reference_date else {
            return Ok(None);
        };

        let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid reference date: {text}"))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("Invalid reference date: {text}"))?;
        Ok(Some(midnight))
    }

    pub fn parse_extract_segment(&self) -> Result<Option<Segment>> {
        self.extract
            .as_deref()
            .map(|name| name.parse::<Segment>().map_err(|e| anyhow!(e)))
            .transpose()
    }
}
