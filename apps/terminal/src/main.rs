//! # Medix Terminal
//!
//! Headless till: reads one command per line from stdin and prints the
//! resulting cart as JSON.
//!
//! ```text
//! add <batch> <qty> [base|pack]     qty <batch> <unit> <n>
//! unit <batch> <unit> <base|pack>   disc <batch> <unit> <figure>
//! rm <batch> <unit>                 clear
//! adj% <percent>                    adj <amount>
//! back | fwd | load <index>         deck | refresh | cart
//! hold                              pay cash <amount> | pay card | pay credit
//! return <transaction id>           config
//! set unit|discount|control <value> quit
//! ```
//!
//! Amounts are written in major units ("12.50"); percentages as "10" or
//! "-7.5".

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use medix_client::{HttpInvoicingService, InvoicingService};
use medix_core::{Direction, LineEdit, LineKey, Money, PaymentInfo, PaymentMethod, Percent};
use medix_terminal::state::{parse_control_mode, parse_discount_mode, parse_unit, ConfigStore};
use medix_terminal::{init_tracing, ApiError, ApiResult, Terminal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting Medix terminal");

    let store = ConfigStore::open(std::env::args().nth(1).map(Into::into));
    if let Some(path) = store.path() {
        info!(?path, "Using terminal config");
    }

    let service = build_service(&store)?;
    let terminal = Terminal::start(service, store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if matches!(words.first(), Some(&"quit") | Some(&"exit")) {
            break;
        }
        if words.is_empty() {
            continue;
        }

        match run(&terminal, &words).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                error!(code = ?e.code, "{}", e.message);
                println!("{}", serde_json::to_string(&e)?);
            }
        }
    }

    info!("Terminal stopped");
    Ok(())
}

#[cfg(feature = "demo")]
fn build_service(store: &ConfigStore) -> Result<Arc<dyn InvoicingService>, Box<dyn std::error::Error>> {
    if std::env::var("MEDIX_DEMO").is_ok() {
        info!("Running against the in-memory demo service");
        return Ok(Arc::new(medix_client::MemoryInvoicingService::new(demo::inventory())));
    }
    http_service(store)
}

#[cfg(not(feature = "demo"))]
fn build_service(store: &ConfigStore) -> Result<Arc<dyn InvoicingService>, Box<dyn std::error::Error>> {
    http_service(store)
}

fn http_service(store: &ConfigStore) -> Result<Arc<dyn InvoicingService>, Box<dyn std::error::Error>> {
    let settings = store.get().service;
    info!(url = %settings.base_url, "Connecting to invoicing service");
    let timeout = settings.timeout();
    Ok(Arc::new(HttpInvoicingService::new(
        settings.base_url,
        timeout,
    )?))
}

async fn run(terminal: &Terminal, words: &[&str]) -> ApiResult<String> {
    let arg = |i: usize| {
        words
            .get(i)
            .copied()
            .ok_or_else(|| ApiError::validation(format!("{} needs more arguments", words[0])))
    };
    let key = |i: usize| -> ApiResult<LineKey> { Ok(LineKey::new(arg(i)?, unit(arg(i + 1)?)?)) };

    match words[0] {
        "cart" => json(&terminal.get_cart()),
        "add" => {
            let requested = words.get(3).map(|u| unit(u)).transpose()?;
            json(&terminal.add_line(arg(1)?, integer(arg(2)?)?, requested)?)
        }
        "qty" => json(&terminal.update_line(&key(1)?, LineEdit::Quantity(integer(arg(3)?)?))?),
        "unit" => json(&terminal.update_line(&key(1)?, LineEdit::Unit(unit(arg(3)?)?))?),
        "disc" => json(&terminal.update_line(&key(1)?, LineEdit::Discount(hundredths(arg(3)?)?))?),
        "rm" => json(&terminal.remove_line(&key(1)?)?),
        "clear" => json(&terminal.clear()?),
        "adj%" => json(&terminal.set_adjustment_percent(Percent::from_bps(hundredths(arg(1)?)?))?),
        "adj" => json(&terminal.set_adjustment_amount(Money::from_cents(hundredths(arg(1)?)?))?),
        "back" => json(&terminal.navigate(Direction::Back)?),
        "fwd" => json(&terminal.navigate(Direction::Forward)?),
        "load" => json(&terminal.load(integer(arg(1)?)? as isize)?),
        "deck" => json(&terminal.deck()),
        "refresh" => json(&terminal.refresh().await?),
        "hold" => json(&terminal.hold().await?),
        "pay" => {
            let payment = match arg(1)? {
                "cash" => PaymentInfo::cash(Money::from_cents(hundredths(arg(2)?)?)),
                "card" => PaymentInfo::non_cash(PaymentMethod::ExternalCard),
                "credit" => PaymentInfo::non_cash(PaymentMethod::Credit),
                other => return Err(ApiError::validation(format!("unknown payment method {}", other))),
            };
            json(&terminal.commit(payment).await?)
        }
        "return" => json(&terminal.load_for_return_by_id(arg(1)?).await?),
        "config" => json(&terminal.config()),
        "set" => {
            let value = arg(2)?;
            let config = match arg(1)? {
                "unit" => terminal.set_default_unit(unit(value)?)?,
                "discount" => terminal.set_discount_mode(
                    parse_discount_mode(value).ok_or_else(|| invalid("discount mode", value))?,
                )?,
                "control" => terminal.set_control_mode(
                    parse_control_mode(value).ok_or_else(|| invalid("control mode", value))?,
                )?,
                other => return Err(invalid("setting", other)),
            };
            json(&config)
        }
        other => Err(invalid("command", other)),
    }
}

fn json<T: serde::Serialize>(value: &T) -> ApiResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn invalid(what: &str, value: &str) -> ApiError {
    ApiError::validation(format!("unknown {}: {}", what, value))
}

fn unit(s: &str) -> ApiResult<medix_core::UnitType> {
    parse_unit(s).ok_or_else(|| invalid("unit", s))
}

fn integer(s: &str) -> ApiResult<i64> {
    s.parse().map_err(|_| invalid("number", s))
}

/// "12.5" → 1250, "-7" → -700.
fn hundredths(s: &str) -> ApiResult<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if frac.len() > 2 || (whole.is_empty() && frac.is_empty()) {
        return Err(invalid("amount", s));
    }

    let whole: i64 = if whole.is_empty() { 0 } else { integer(whole)? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => integer(frac)? * 10,
        _ => integer(frac)?,
    };
    if whole < 0 || frac < 0 {
        return Err(invalid("amount", s));
    }

    let value = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| invalid("amount", s))?;
    Ok(if negative { -value } else { value })
}

#[cfg(feature = "demo")]
mod demo {
    use medix_core::{Batch, ConversionFactor, Money, Product};

    pub fn inventory() -> Vec<Product> {
        let product = |id: &str, name: &str, factor: u32, price: i64, qty: i64, controlled: bool| {
            Product {
                id: id.to_string(),
                name: name.to_string(),
                base_unit: "tablet".to_string(),
                pack_unit: (factor > 1).then(|| "strip".to_string()),
                pack_factor: ConversionFactor::new(factor).unwrap_or(ConversionFactor::NONE),
                controlled,
                batches: vec![Batch {
                    id: format!("{}-b1", id),
                    product_id: id.to_string(),
                    batch_number: format!("LOT-{}", id.to_uppercase()),
                    quantity_available: qty,
                    selling_price: Money::from_cents(price),
                    expiry: None,
                }],
            }
        };

        vec![
            product("para", "Paracetamol 500mg", 10, 150, 500, false),
            product("amox", "Amoxicillin 250mg", 21, 320, 210, false),
            product("tram", "Tramadol 50mg", 10, 480, 60, true),
            product("ors", "Oral rehydration salts", 1, 900, 40, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundredths() {
        assert_eq!(hundredths("12.5").unwrap(), 1_250);
        assert_eq!(hundredths("12.05").unwrap(), 1_205);
        assert_eq!(hundredths("-7").unwrap(), -700);
        assert_eq!(hundredths(".5").unwrap(), 50);
        assert!(hundredths("1.234").is_err());
        assert!(hundredths("abc").is_err());
        assert!(hundredths("--1").is_err());
    }
}
