use crate::domain::payment::{CallerIdentity, PaymentId, PaymentRequest};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Pay,
    Refund,
    Get,
    Customer,
    List,
}

/// One raw CSV row: `type, key, customer, merchant, bank, amount, payment`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub key: Option<String>,
    pub customer: Option<u64>,
    pub merchant: Option<u64>,
    pub bank: Option<u64>,
    pub amount: Option<Decimal>,
    pub payment: Option<PaymentId>,
}

/// A validated request for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pay {
        caller: CallerIdentity,
        request: PaymentRequest,
    },
    Refund {
        payment: PaymentId,
    },
    Get {
        payment: PaymentId,
    },
    Customer {
        customer: u64,
    },
    List,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Pay { .. } => "pay",
            Command::Refund { .. } => "refund",
            Command::Get { .. } => "get",
            Command::Customer { .. } => "customer",
            Command::List => "list",
        }
    }
}

fn required<T>(value: Option<T>, field: &str, kind: CommandType) -> Result<T> {
    value.ok_or_else(|| {
        PaymentError::Validation(format!(
            "{} command requires a {field}",
            format!("{kind:?}").to_lowercase()
        ))
    })
}

impl TryFrom<CommandRecord> for Command {
    type Error = PaymentError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let kind = record.r#type;
        match kind {
            CommandType::Pay => Ok(Command::Pay {
                caller: CallerIdentity::new(required(record.customer, "customer", kind)?),
                request: PaymentRequest::new(
                    required(record.amount, "amount", kind)?,
                    required(record.merchant, "merchant", kind)?,
                    required(record.bank, "bank", kind)?,
                )?,
            }),
            CommandType::Refund => Ok(Command::Refund {
                payment: required(record.payment, "payment", kind)?,
            }),
            CommandType::Get => Ok(Command::Get {
                payment: required(record.payment, "payment", kind)?,
            }),
            CommandType::Customer => Ok(Command::Customer {
                customer: required(record.customer, "customer", kind)?,
            }),
            CommandType::List => Ok(Command::List),
        }
    }
}

/// Reads payment commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// so trailing empty columns may be omitted.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads rows, yielding the raw record so the caller keeps the idempotency key.
    pub fn records(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
