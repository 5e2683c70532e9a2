use chrono::{Duration, NaiveDate};
use clap::{Args, ValueEnum};
use serde_json::Value;

use refi_core::market::{RateCache, RateRange, Tenor, DEFAULT_FRESHNESS_MINUTES};

use crate::fred::FredRateSource;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TenorArg {
    /// 30-year fixed (MORTGAGE30US)
    #[value(name = "30")]
    Thirty,
    /// 15-year fixed (MORTGAGE15US)
    #[value(name = "15")]
    Fifteen,
}

impl From<TenorArg> for Tenor {
    fn from(arg: TenorArg) -> Self {
        match arg {
            TenorArg::Thirty => Tenor::ThirtyYear,
            TenorArg::Fifteen => Tenor::FifteenYear,
        }
    }
}

/// Arguments for historical mortgage rates
#[derive(Args)]
pub struct RatesArgs {
    /// Tenor bucket
    #[arg(long, default_value = "30")]
    pub tenor: TenorArg,

    /// First observation date (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last observation date (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Force a live refetch, bypassing the freshness window
    #[arg(long)]
    pub refresh: bool,

    /// FRED API key; falls back to $FRED_API_KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// Freshness window in minutes
    #[arg(long, default_value_t = DEFAULT_FRESHNESS_MINUTES)]
    pub ttl_minutes: i64,
}

pub fn run_rates(args: RatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let api_key = args
        .api_key
        .or_else(|| std::env::var("FRED_API_KEY").ok())
        .ok_or("FRED API key required: pass --api-key or set $FRED_API_KEY")?;

    let tenor = Tenor::from(args.tenor);
    let range = RateRange::new(args.start, args.end)?;
    let source = FredRateSource::new(api_key)?;
    let cache = RateCache::with_freshness(source, Duration::minutes(args.ttl_minutes));

    let entry = if args.refresh {
        cache.refresh(tenor, &range)?
    } else {
        cache.get_rates(tenor, &range)?
    };
    // The cache lives for one invocation, so the status here reflects the
    // fetch that just landed rather than a prior process's state.
    let status = cache.status(tenor, &range);
    Ok(serde_json::json!({ "status": status, "entry": entry }))
}
