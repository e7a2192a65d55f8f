use crate::domain::payment::{Payment, PaymentStatus, ResponseCode};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct PaymentRow<'a> {
    id: Option<u64>,
    customer: u64,
    merchant: u64,
    bank: u64,
    amount: Decimal,
    status: PaymentStatus,
    code: ResponseCode,
    operation_id: Option<&'a str>,
}

impl<'a> From<&'a Payment> for PaymentRow<'a> {
    fn from(payment: &'a Payment) -> Self {
        Self {
            id: payment.id,
            customer: payment.customer_id,
            merchant: payment.merchant_id,
            bank: payment.bank_id,
            amount: payment.amount.value(),
            status: payment.status,
            code: payment.code,
            operation_id: payment.operation_id.as_ref().map(|op| op.as_str()),
        }
    }
}

/// Writes the payment ledger as CSV.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub const HEADER: [&'static str; 8] = [
        "id",
        "customer",
        "merchant",
        "bank",
        "amount",
        "status",
        "code",
        "operation_id",
    ];

    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    /// Writes the header followed by one row per payment, then flushes.
    pub fn write_payments<'a>(
        &mut self,
        payments: impl IntoIterator<Item = &'a Payment>,
    ) -> Result<()> {
        self.writer.write_record(Self::HEADER)?;
        for payment in payments {
            self.writer.serialize(PaymentRow::from(payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
