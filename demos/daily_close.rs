//! Daily close example: one business day from opening to reconciliation

use bigdecimal::BigDecimal;
use cash_register_core::utils::MemoryStorage;
use cash_register_core::{
    CashRegister, CashTransaction, PaymentMethod, ReconciliationConfig, Withdrawal,
};
use chrono::{NaiveDate, TimeZone, Utc};
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Cash Register Core - Daily Close Example\n");

    let config = ReconciliationConfig::default();
    let mut register = CashRegister::with_config(MemoryStorage::new(), &config)?;
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid date")?;

    // 1. Open the register with the float left in the drawer
    println!("🔓 Opening the register...");
    let session = register
        .open_session(today, BigDecimal::from(100), "ana")
        .await?;
    println!(
        "  ✓ Session {} opened with R$ {}",
        session.id, session.opening_amount
    );
    println!();

    // 2. Record the day's activity
    println!("💰 Recording sales and expenses...\n");
    let at = |hour: u32| Utc.with_ymd_and_hms(2024, 3, 1, hour + 3, 0, 0).single();

    let activity = vec![
        CashTransaction::entry(
            "sale-001".to_string(),
            BigDecimal::from(50),
            PaymentMethod::Cash,
            at(9).ok_or("invalid time")?,
        ),
        CashTransaction::entry(
            "sale-002".to_string(),
            BigDecimal::from(30),
            PaymentMethod::Pix,
            at(10).ok_or("invalid time")?,
        ),
        CashTransaction::entry(
            "sale-003".to_string(),
            BigDecimal::from(240),
            PaymentMethod::CreditCard,
            at(11).ok_or("invalid time")?,
        )
        .with_installments(2),
        CashTransaction::deferred_sale(
            "tab-001".to_string(),
            BigDecimal::from(200),
            BigDecimal::from(0),
            at(13).ok_or("invalid time")?,
        )
        .with_description("Monthly tab"),
        CashTransaction::exit(
            "exp-001".to_string(),
            BigDecimal::from(20),
            PaymentMethod::Cash,
            at(14).ok_or("invalid time")?,
        )
        .with_category("Supplies"),
    ];

    for transaction in activity {
        println!(
            "  ✓ {:?} of R$ {} via {}",
            transaction.transaction_type, transaction.amount, transaction.payment_method
        );
        register.record_transaction(transaction).await?;
    }

    register
        .record_withdrawal(
            Withdrawal::new(
                "drop-001".to_string(),
                BigDecimal::from(10),
                "Safe drop".to_string(),
                at(15).ok_or("invalid time")?,
            )
            .with_operator("ana"),
        )
        .await?;
    println!("  ✓ Withdrawal of R$ 10 to the safe");
    println!();

    // 3. Review the day before counting the drawer
    println!("📊 Daily Summary:");
    let report = register.daily_report(today).await?;
    println!("  Total entries:     R$ {}", report.summary.total_entries);
    println!("  Total exits:       R$ {}", report.summary.total_exits);
    println!("  Total withdrawals: R$ {}", report.summary.total_withdrawals);
    println!("  Pending deferred:  R$ {}", report.summary.pending_deferred);
    println!("  Final balance:     R$ {}", report.summary.final_balance);
    println!("  Expected in drawer: R$ {}", report.expected_cash_in_hand);
    for line in &report.payment_breakdown {
        println!("    {:<10} R$ {} ({} sales)", line.method, line.amount, line.count);
    }
    println!();

    // 4. Close against the counted cash
    println!("🔒 Closing the register...");
    let counted = BigDecimal::from_str("142.50")?;
    let closed = register.close_session(today, counted, "ana").await?;
    if let Some(status) = closed.variance_status(&config.reconciliation_tolerance) {
        println!(
            "  ✓ Counted R$ {:?}, expected R$ {:?}: {:?}",
            closed.closing_amount, closed.expected_amount, status
        );
    }
    println!();

    // 5. Card payouts still to come
    println!("💳 Card Receivables:");
    for estimate in register.receivables_schedule(today, today).await? {
        println!(
            "  {} {}/{} on {}: gross R$ {}, fee R$ {}, net R$ {}",
            estimate.transaction_id,
            estimate.installment,
            estimate.installment_count,
            estimate.expected_date,
            estimate.gross_amount,
            estimate.fee_amount,
            estimate.net_amount
        );
    }

    println!("\n✅ Daily close completed successfully!");

    Ok(())
}
