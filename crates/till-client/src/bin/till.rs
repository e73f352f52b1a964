//! # till: Command-Line Till
//!
//! Talks to the remote POS API from a terminal.
//!
//! ## Usage
//! ```bash
//! # Log in and store the token
//! till login owner owner123
//!
//! # Who the stored token belongs to
//! till whoami
//!
//! # Ring up a sale: two cokes and a tea, paid 20 USD
//! till sell --customer C1 --product COKE*2 --product TEA --paid 20
//!
//! # Pay in shillings at a custom rate
//! till sell --customer C1 --product COKE --paid 5 --currency SOS --rate 26500
//!
//! # Recent sales and today's figures
//! till sales
//! till today
//!
//! # Forget the token
//! till logout
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - Default: INFO level

use std::env;
use std::path::PathBuf;

use till_client::{ApiClient, ClientConfig, ClientError, NewSaleSession, TokenStore};
use till_core::{Currency, ExchangeRate, Money};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(args).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Vec<String>) -> CliResult<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    let config = ClientConfig::load(config_path)?;
    let store = TokenStore::open(config.auth.token_path.clone())?;

    let Some((command, command_args)) = rest.split_first() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "login" => login(&config, &store, command_args).await,
        "logout" => {
            store.clear()?;
            println!("Logged out (token cleared).");
            Ok(())
        }
        "whoami" => whoami(&store),
        "sales" => sales(&config, &store).await,
        "today" => today(&config, &store).await,
        "sell" => sell(&config, &store, command_args).await,
        other => Err(format!("Unknown command '{}'. Run `till --help`.", other).into()),
    }
}

fn print_help() {
    println!("Till - point of sale from the terminal");
    println!();
    println!("Usage: till [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  login <username> <password>   Log in and store the token");
    println!("  logout                        Forget the stored token");
    println!("  whoami                        Show the stored identity");
    println!("  sell [SALE OPTIONS]           Create a sale");
    println!("  sales                         List recent sales");
    println!("  today                         Show today's report");
    println!();
    println!("Sale options:");
    println!("  --customer <ID|QUERY>         Customer id, or the first search match");
    println!("  --product <ID|SKU>[*QTY]      Product to add (repeatable)");
    println!("  --paid <AMOUNT>               Amount tendered in USD (default: 0)");
    println!("  --currency <USD|SOS>          Tender currency (default: USD)");
    println!("  --rate <SOS_PER_USD>          Exchange rate for SOS tender");
    println!("  --account <ID>                Settlement account (default: cash drawer)");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>           Config file (default: platform config dir)");
    println!("  -h, --help                    Show this help message");
}

fn authenticated_client(config: &ClientConfig, store: &TokenStore) -> CliResult<ApiClient> {
    let credential = store.load()?.ok_or(ClientError::NotAuthenticated)?;
    Ok(ApiClient::new(config, Some(credential))?)
}

async fn login(config: &ClientConfig, store: &TokenStore, args: &[String]) -> CliResult<()> {
    let [username, password] = args else {
        return Err("Usage: till login <username> <password>".into());
    };

    let api = ApiClient::new(config, None)?;
    let response = api.login(username, password).await?;
    store.save(&response.credential)?;

    println!("✅ Logged in as {}", response.user.username);
    if let Some(shop) = &response.shop {
        println!("   Shop: {} ({})", shop.name, shop.id);
    }
    Ok(())
}

fn whoami(store: &TokenStore) -> CliResult<()> {
    let credential = store.load()?.ok_or(ClientError::NotAuthenticated)?;
    let claims = credential.claims();

    println!("Token:   {}", store.path().display());
    println!("Shop:    {}", credential.shop_id().unwrap_or("(none)"));
    println!("User:    {}", claims.user_id.as_deref().unwrap_or("(unknown)"));
    println!("Role:    {}", claims.role.as_deref().unwrap_or("(unknown)"));
    Ok(())
}

async fn sales(config: &ClientConfig, store: &TokenStore) -> CliResult<()> {
    let api = authenticated_client(config, store)?;
    let sales = api.list_sales().await?;

    if sales.is_empty() {
        println!("No sales.");
        return Ok(());
    }

    for sale in sales {
        let total = sale
            .total_usd
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let created = sale
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<38} {:>12} {:<10} {}",
            sale.id,
            total,
            sale.status.as_deref().unwrap_or(""),
            created
        );
    }
    Ok(())
}

async fn today(config: &ClientConfig, store: &TokenStore) -> CliResult<()> {
    let api = authenticated_client(config, store)?;
    let report = api.today_report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn sell(config: &ClientConfig, store: &TokenStore, args: &[String]) -> CliResult<()> {
    let mut customer_query: Option<String> = None;
    let mut products: Vec<(String, u32)> = Vec::new();
    let mut paid = Money::zero();
    let mut currency = Currency::REFERENCE;
    let mut rate = config.exchange_rate()?;
    let mut account: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1).ok_or_else(|| format!("{} needs a value", args[i]))?;
        match args[i].as_str() {
            "--customer" => customer_query = Some(value.clone()),
            "--product" => products.push(parse_product_arg(value)?),
            "--paid" => paid = Money::parse(value)?,
            "--currency" => currency = value.parse()?,
            "--rate" => rate = ExchangeRate::parse(value)?,
            "--account" => account = Some(value.clone()),
            other => return Err(format!("Unknown sale option '{}'", other).into()),
        }
        i += 2;
    }

    let api = authenticated_client(config, store)?;
    let mut session = NewSaleSession::new(api.clone(), rate);
    session.load().await?;

    for (code, qty) in products {
        let results = api.search_products(&code).await?;
        session.merge_search_results(&results);
        let product = results
            .into_iter()
            .find(|p| p.id == code || p.sku.eq_ignore_ascii_case(&code))
            .ok_or_else(|| format!("No product matches '{}'", code))?;
        for _ in 0..qty {
            session.pick_product(product.clone());
        }
    }

    if let Some(query) = customer_query {
        let customers = api.search_customers(&query).await?;
        let customer = customers
            .iter()
            .find(|c| c.id == query)
            .or_else(|| customers.first())
            .cloned()
            .ok_or_else(|| format!("No customer matches '{}'", query))?;
        session.pick_customer(customer);
    }

    let draft = session.draft_mut();
    draft.set_currency(currency);
    if let Some(account) = account {
        draft.select_account(&account)?;
    }
    draft.set_amount_tendered(paid)?;

    let total = draft.compute_total();
    let native = draft.native_tendered_amount();

    let sale_id = session.submit().await?;
    println!("✅ Sale created: {}", sale_id);
    println!("   Total (USD): {}", total);
    if let Some(native) = native {
        println!("   Native amount (SOS) on receipt: {}", native);
    }
    Ok(())
}

/// Parses `SKU` or `SKU*QTY`.
fn parse_product_arg(arg: &str) -> CliResult<(String, u32)> {
    match arg.rsplit_once('*') {
        Some((code, qty)) => {
            let qty: u32 = qty
                .parse()
                .map_err(|_| format!("Invalid quantity in '{}'", arg))?;
            if qty == 0 {
                return Err(format!("Quantity must be at least 1 in '{}'", arg).into());
            }
            Ok((code.to_string(), qty))
        }
        None => Ok((arg.to_string(), 1)),
    }
}
