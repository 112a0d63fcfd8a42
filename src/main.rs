//! posting-limits CLI
//!
//! Run the limit-window aggregators and limit checks over a JSON file of
//! postings.
//!
//! # Usage
//!
//! ```bash
//! # Net deposited / withdrawn since a cutoff
//! posting-limits window --input postings.json --denomination GBP --cutoff 2024-05-01T00:00:00Z
//!
//! # Sum of ATM debits since a cutoff
//! posting-limits tagged --input postings.json --denomination GBP --cutoff 2024-05-01T00:00:00Z \
//!     --key PAYMENT_TYPE --value ATM
//!
//! # Check the proposed postings against configured limits
//! posting-limits check --input postings.json --config limits.json --now 2024-05-01T12:00:00Z
//!
//! # Generate a random posting file
//! posting-limits generate --chains 50 --seed 7
//! ```
//!
//! Set `RUST_LOG=debug` (or `trace`) to see per-chain aggregation detail.

use chrono::{DateTime, Utc};
use posting_limits::aggregation::category::CategorySummer;
use posting_limits::aggregation::window::WindowAggregator;
use posting_limits::config::LimitConfig;
use posting_limits::core::chain::ChainBook;
use posting_limits::core::denomination::Denomination;
use posting_limits::core::ids::{ChainId, PartyId};
use posting_limits::core::posting::{
    Direction, Posting, PostingError, PostingKind, DEFAULT_ADDRESS, DEFAULT_ASSET,
};
use posting_limits::simulation::generator::{generate_chain_book, ChainBookConfig};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"posting-limits — chain-aware deposit/withdrawal aggregation and limit checks

USAGE:
    posting-limits <COMMAND> [OPTIONS]

COMMANDS:
    window      Net deposited and withdrawn since a cutoff
    tagged      Sum of debits carrying an instruction detail since a cutoff
    check       Validate proposed postings against a limit config
    generate    Generate a random posting file (for testing)
    help        Show this message

OPTIONS (window):
    --input <FILE>          Path to JSON postings file
    --denomination <CCY>    Denomination to aggregate (default: GBP)
    --cutoff <RFC3339>      Start of the window
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (tagged):
    --input, --denomination, --cutoff as above
    --key <KEY>             Instruction detail key (default: PAYMENT_TYPE)
    --value <VALUE>         Instruction detail value to match
    --exclude <CHAIN_ID>    Chain id to leave out

OPTIONS (check):
    --input <FILE>          Postings; those with "proposed": true form the batch
    --config <FILE>         Limit config JSON
    --now <RFC3339>         Evaluation instant (default: current time)

OPTIONS (generate):
    --chains <N>            Number of chains (default: 100)
    --denomination <CCY>    Denomination (default: GBP)
    --seed <N>              Seed for reproducible output
    --output <FILE>         Write to file instead of stdout

EXAMPLES:
    posting-limits window --input postings.json --cutoff 2024-05-01T00:00:00Z
    posting-limits tagged --input postings.json --cutoff 2024-05-01T00:00:00Z --value ATM
    posting-limits check --input postings.json --config limits.json
    posting-limits generate --chains 20 --seed 1 --output postings.json"#
    );
}

/// JSON schema for one input posting.
#[derive(serde::Deserialize, serde::Serialize)]
struct PostingInput {
    party_id: String,
    chain_id: String,
    kind: String,
    amount: String,
    direction: String,
    #[serde(default = "default_denomination")]
    denomination: String,
    value_at: DateTime<Utc>,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default)]
    proposed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    details: BTreeMap<String, String>,
}

fn default_denomination() -> String {
    "GBP".to_string()
}

#[derive(serde::Deserialize, serde::Serialize)]
struct PostingsFile {
    postings: Vec<PostingInput>,
}

impl PostingInput {
    fn into_posting(self) -> Result<Posting, String> {
        let amount: Decimal = self
            .amount
            .parse()
            .map_err(|e| format!("invalid amount '{}': {}", self.amount, e))?;
        let kind = PostingKind::parse(&self.kind, self.is_final).map_err(|e| e.to_string())?;
        let direction: Direction = self.direction.parse().map_err(|e: PostingError| e.to_string())?;

        let mut posting = Posting::try_new(
            PartyId::new(self.party_id),
            ChainId::new(self.chain_id),
            kind,
            amount,
            direction,
            Denomination::new(self.denomination),
            self.value_at,
        )
        .map_err(|e| e.to_string())?;
        if let Some(address) = self.address {
            posting = posting.with_address(address);
        }
        if let Some(asset) = self.asset {
            posting = posting.with_asset(asset);
        }
        for (key, value) in self.details {
            posting = posting.with_detail(key, value);
        }
        Ok(posting)
    }

    fn from_posting(posting: &Posting) -> Self {
        let (kind, is_final) = match posting.kind() {
            PostingKind::Authorisation => ("authorisation", false),
            PostingKind::AuthorisationAdjustment => ("adjustment", false),
            PostingKind::Settlement { is_final } => ("settlement", is_final),
            PostingKind::Release => ("release", false),
            PostingKind::HardSettlement => ("hard_settlement", false),
            PostingKind::Transfer => ("transfer", false),
        };
        Self {
            party_id: posting.party_id().to_string(),
            chain_id: posting.chain_id().to_string(),
            kind: kind.to_string(),
            amount: posting.amount().to_string(),
            direction: if posting.is_credit() { "credit" } else { "debit" }.to_string(),
            denomination: posting.denomination().to_string(),
            value_at: posting.value_at(),
            is_final,
            proposed: false,
            address: Some(posting.address())
                .filter(|a| *a != DEFAULT_ADDRESS)
                .map(str::to_string),
            asset: Some(posting.asset())
                .filter(|a| *a != DEFAULT_ASSET)
                .map(str::to_string),
            details: posting.details().clone(),
        }
    }
}

/// Load postings, split into (history, proposed batch).
fn load_postings(path: &str) -> (Vec<Posting>, Vec<Posting>) {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    let file: PostingsFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(r#"{{
  "postings": [
    {{ "party_id": "CARD-NETWORK", "chain_id": "auth-1", "kind": "authorisation",
       "amount": "90", "direction": "debit", "denomination": "GBP",
       "value_at": "2024-05-01T09:00:00Z" }}
  ]
}}"#);
        process::exit(1);
    });

    let mut history = Vec::new();
    let mut batch = Vec::new();
    for (i, input) in file.postings.into_iter().enumerate() {
        let proposed = input.proposed;
        let posting = input.into_posting().unwrap_or_else(|e| {
            eprintln!("Invalid posting #{}: {}", i, e);
            process::exit(1);
        });
        if proposed {
            batch.push(posting);
        } else {
            history.push(posting);
        }
    }
    (history, batch)
}

/// Parse `--flag value` pairs, accepting only `allowed` flags.
fn parse_options(args: &[String], allowed: &[&str]) -> HashMap<String, String> {
    let mut options = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            eprintln!("Unknown option: {}", flag);
            process::exit(1);
        }
        i += 1;
        let value = args.get(i).cloned().unwrap_or_else(|| {
            eprintln!("{} requires a value", flag);
            process::exit(1);
        });
        options.insert(flag.trim_start_matches("--").to_string(), value);
        i += 1;
    }
    options
}

fn required<'a>(options: &'a HashMap<String, String>, name: &str) -> &'a str {
    options.get(name).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Error: --{} is required", name);
        process::exit(1);
    })
}

fn parse_instant(name: &str, value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            eprintln!("Invalid --{} '{}': {}", name, value, e);
            process::exit(1);
        })
}

fn denomination(options: &HashMap<String, String>) -> Denomination {
    Denomination::new(
        options
            .get("denomination")
            .cloned()
            .unwrap_or_else(default_denomination),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    })
}

fn cmd_window(args: &[String]) {
    let options = parse_options(args, &["--input", "--denomination", "--cutoff", "--format"]);
    let (history, batch) = load_postings(required(&options, "input"));
    let cutoff = parse_instant("cutoff", required(&options, "cutoff"));
    let book: ChainBook = history.into_iter().chain(batch).collect();

    let totals = WindowAggregator::sum_over_window(&denomination(&options), cutoff, &book);

    match options.get("format").map(String::as_str) {
        Some("json") => println!("{}", to_json(&totals)),
        None | Some("text") => print!("{}", totals),
        Some(other) => {
            eprintln!("--format requires 'text' or 'json', got '{}'", other);
            process::exit(1);
        }
    }
}

fn cmd_tagged(args: &[String]) {
    let options = parse_options(
        args,
        &["--input", "--denomination", "--cutoff", "--key", "--value", "--exclude"],
    );
    let (history, batch) = load_postings(required(&options, "input"));
    let cutoff = parse_instant("cutoff", required(&options, "cutoff"));
    let key = options
        .get("key")
        .map(String::as_str)
        .unwrap_or(posting_limits::limits::payment_type::DEFAULT_PAYMENT_TYPE_KEY);
    let value = required(&options, "value");
    let excluded = options.get("exclude").map(|id| ChainId::new(id.as_str()));
    let book: ChainBook = history.into_iter().chain(batch).collect();

    let total = CategorySummer::sum_tagged_debits(
        &denomination(&options),
        cutoff,
        &book,
        excluded.as_ref(),
        key,
        value,
    );
    println!("{}", total);
}

fn cmd_check(args: &[String]) {
    let options = parse_options(args, &["--input", "--config", "--now"]);
    let (history, batch) = load_postings(required(&options, "input"));
    let config_path = required(&options, "config");
    let config = LimitConfig::from_path(config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config '{}': {}", config_path, e);
        process::exit(1);
    });
    let now = options
        .get("now")
        .map(|v| parse_instant("now", v))
        .unwrap_or_else(Utc::now);
    let history: ChainBook = history.into_iter().collect();

    let outcome = config.validate_batch(now, &history, &batch).unwrap_or_else(|e| {
        eprintln!("Invalid config: {}", e);
        process::exit(1);
    });
    match outcome {
        Ok(()) => println!("ACCEPTED: {} proposed postings within limits", batch.len()),
        Err(rejection) => {
            println!("REJECTED: {}", rejection);
            process::exit(2);
        }
    }
}

fn cmd_generate(args: &[String]) {
    let options = parse_options(args, &["--chains", "--denomination", "--seed", "--output"]);
    let mut config = ChainBookConfig {
        denomination: denomination(&options),
        ..Default::default()
    };
    if let Some(chains) = options.get("chains") {
        config.chain_count = chains.parse().unwrap_or_else(|_| {
            eprintln!("--chains requires a number");
            process::exit(1);
        });
    }
    if let Some(seed) = options.get("seed") {
        config.seed = Some(seed.parse().unwrap_or_else(|_| {
            eprintln!("--seed requires a number");
            process::exit(1);
        }));
    }

    let book = generate_chain_book(&config);
    let output = PostingsFile {
        postings: book
            .chains()
            .flat_map(|chain| chain.postings())
            .map(PostingInput::from_posting)
            .collect(),
    };
    let json = to_json(&output);

    if let Some(path) = options.get("output") {
        fs::write(path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} postings across {} chains → {}",
            book.posting_count(),
            book.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "window" => cmd_window(rest),
        "tagged" => cmd_tagged(rest),
        "check" => cmd_check(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
