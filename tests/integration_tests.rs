//! Integration tests for cash-register-core

use bigdecimal::BigDecimal;
use cash_register_core::{
    net_receivable_between, utils::MemoryStorage, CashRegister, CashRegisterStorage,
    CashTransaction, PaymentMethod, ReconciliationConfig, ReconciliationError, SessionStatus,
    VarianceStatus, Withdrawal,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::str::FromStr;

fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

/// Local time in Sao Paulo on a March 2024 business day
fn local(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, hour + 3, 0, 0).unwrap()
}

async fn scenario_one_register() -> CashRegister<MemoryStorage> {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .open_session(day(1), dec("100.00"), "ana")
        .await
        .unwrap();

    register
        .record_transaction(CashTransaction::entry(
            "sale-cash".to_string(),
            dec("50.00"),
            PaymentMethod::Cash,
            local(1, 9),
        ))
        .await
        .unwrap();
    register
        .record_transaction(CashTransaction::entry(
            "sale-pix".to_string(),
            dec("30.00"),
            PaymentMethod::Pix,
            local(1, 10),
        ))
        .await
        .unwrap();
    register
        .record_transaction(
            CashTransaction::exit(
                "supplies".to_string(),
                dec("20.00"),
                PaymentMethod::Cash,
                local(1, 11),
            )
            .with_category("Supplies"),
        )
        .await
        .unwrap();
    register
        .record_withdrawal(Withdrawal::new(
            "drop-1".to_string(),
            dec("10.00"),
            "Safe drop".to_string(),
            local(1, 12),
        ))
        .await
        .unwrap();

    register
}

#[tokio::test]
async fn test_daily_totals_and_expected_cash() {
    let register = scenario_one_register().await;

    let report = register.daily_report(day(1)).await.unwrap();
    assert_eq!(report.summary.total_entries, dec("80.00"));
    assert_eq!(report.summary.total_exits, dec("20.00"));
    assert_eq!(report.summary.total_withdrawals, dec("10.00"));
    assert_eq!(report.summary.final_balance, dec("150.00"));
    assert_eq!(report.expected_cash_in_hand, dec("140.00"));
    assert!(report.summary.is_consistent());
    assert!(report.variance.is_none());
}

#[tokio::test]
async fn test_close_reconciled() {
    let mut register = scenario_one_register().await;

    let closed = register
        .close_session(day(1), dec("140.00"), "ana")
        .await
        .unwrap();

    assert_eq!(closed.status, SessionStatus::Closed);
    assert_eq!(closed.expected_amount, Some(dec("140.00")));
    assert_eq!(closed.difference, Some(dec("0.00")));
    assert_eq!(
        closed.variance_status(&dec("0.01")),
        Some(VarianceStatus::Reconciled)
    );

    let report = register.daily_report(day(1)).await.unwrap();
    let variance = report.variance.unwrap();
    assert_eq!(variance.status, VarianceStatus::Reconciled);
}

#[tokio::test]
async fn test_close_with_surplus() {
    let mut register = scenario_one_register().await;

    let closed = register
        .close_session(day(1), dec("145.00"), "ana")
        .await
        .unwrap();

    assert_eq!(closed.difference, Some(dec("5.00")));
    assert_eq!(
        closed.variance_status(&dec("0.01")),
        Some(VarianceStatus::Surplus)
    );
}

#[tokio::test]
async fn test_close_with_shortage_is_still_recorded() {
    let mut register = scenario_one_register().await;

    let closed = register
        .close_session(day(1), dec("130.00"), "ana")
        .await
        .unwrap();

    assert_eq!(closed.difference, Some(dec("-10.00")));
    assert_eq!(
        closed.variance_status(&dec("0.01")),
        Some(VarianceStatus::Shortage)
    );
    let stored = register.get_session(day(1)).await.unwrap().unwrap();
    assert!(stored.is_closed());
}

#[tokio::test]
async fn test_session_closes_only_once() {
    let mut register = scenario_one_register().await;
    register
        .close_session(day(1), dec("140.00"), "ana")
        .await
        .unwrap();

    let again = register.close_session(day(1), dec("150.00"), "ana").await;
    assert!(matches!(again, Err(ReconciliationError::InvalidState(_))));

    let stored = register.get_session(day(1)).await.unwrap().unwrap();
    assert_eq!(stored.closing_amount, Some(dec("140.00")));
}

#[tokio::test]
async fn test_close_without_session_fails() {
    let mut register = CashRegister::new(MemoryStorage::new());

    let result = register.close_session(day(1), dec("0"), "ana").await;
    assert!(matches!(result, Err(ReconciliationError::InvalidState(_))));
}

#[tokio::test]
async fn test_one_session_per_business_day() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .open_session(day(1), dec("100.00"), "ana")
        .await
        .unwrap();

    let second = register.open_session(day(1), dec("50.00"), "bruno").await;
    assert!(matches!(second, Err(ReconciliationError::InvalidState(_))));

    register
        .open_session(day(2), dec("50.00"), "bruno")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_negative_opening_amount_rejected() {
    let mut register = CashRegister::new(MemoryStorage::new());

    let result = register.open_session(day(1), dec("-1.00"), "ana").await;
    assert!(matches!(result, Err(ReconciliationError::Validation(_))));
    assert!(register.get_session(day(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_withdrawal_after_close_rejected() {
    let mut register = scenario_one_register().await;
    register
        .close_session(day(1), dec("140.00"), "ana")
        .await
        .unwrap();

    let result = register
        .record_withdrawal(Withdrawal::new(
            "drop-2".to_string(),
            dec("5.00"),
            "Late drop".to_string(),
            local(1, 18),
        ))
        .await;
    assert!(matches!(result, Err(ReconciliationError::InvalidState(_))));
}

#[tokio::test]
async fn test_deferred_sale_counts_only_collected_amount() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .open_session(day(1), dec("0.00"), "ana")
        .await
        .unwrap();

    register
        .record_transaction(CashTransaction::deferred_sale(
            "tab-1".to_string(),
            dec("200.00"),
            dec("0.00"),
            local(1, 9),
        ))
        .await
        .unwrap();
    register
        .record_transaction(CashTransaction::entry(
            "sale-1".to_string(),
            dec("50.00"),
            PaymentMethod::Cash,
            local(1, 10),
        ))
        .await
        .unwrap();

    let summary = register.daily_summary(day(1)).await.unwrap();
    assert_eq!(summary.total_entries, dec("50.00"));
    assert_eq!(summary.pending_deferred, dec("200.00"));
    assert_eq!(summary.payment_total(&PaymentMethod::Deferred), dec("0.00"));
}

#[tokio::test]
async fn test_overpaid_deferred_sale_rejected() {
    let mut register = CashRegister::new(MemoryStorage::new());

    let result = register
        .record_transaction(CashTransaction::deferred_sale(
            "tab-1".to_string(),
            dec("100.00"),
            dec("150.00"),
            local(1, 9),
        ))
        .await;
    assert!(matches!(result, Err(ReconciliationError::Validation(_))));
}

#[tokio::test]
async fn test_late_night_sale_belongs_to_local_day() {
    let mut register = CashRegister::new(MemoryStorage::new());
    // 23:30 in Sao Paulo is already the next day in UTC
    let late = Utc.with_ymd_and_hms(2024, 3, 2, 2, 30, 0).unwrap();
    register
        .record_transaction(CashTransaction::entry(
            "late".to_string(),
            dec("25.00"),
            PaymentMethod::Cash,
            late,
        ))
        .await
        .unwrap();

    let first = register.daily_summary(day(1)).await.unwrap();
    let second = register.daily_summary(day(2)).await.unwrap();
    assert_eq!(first.total_entries, dec("25.00"));
    assert_eq!(second.total_entries, dec("0"));
}

#[tokio::test]
async fn test_report_without_session() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .record_transaction(CashTransaction::entry(
            "walk-in".to_string(),
            dec("12.50"),
            PaymentMethod::Pix,
            local(3, 15),
        ))
        .await
        .unwrap();

    let report = register.daily_report(day(3)).await.unwrap();
    assert!(report.session.is_none());
    assert_eq!(report.summary.opening_amount, dec("0"));
    assert_eq!(report.summary.total_entries, dec("12.50"));

    let empty = register.daily_report(day(4)).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_period_roll_up() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .open_session(day(1), dec("100.00"), "ana")
        .await
        .unwrap();
    register
        .open_session(day(2), dec("80.00"), "ana")
        .await
        .unwrap();

    let records = [
        CashTransaction::entry("a-in".to_string(), dec("100"), PaymentMethod::Cash, local(1, 9)),
        CashTransaction::exit("a-out".to_string(), dec("20"), PaymentMethod::Cash, local(1, 10)),
        CashTransaction::entry("b-in".to_string(), dec("50"), PaymentMethod::Pix, local(2, 9)),
        CashTransaction::exit("b-out".to_string(), dec("10"), PaymentMethod::Cash, local(2, 10)),
    ];
    for transaction in records {
        register.record_transaction(transaction).await.unwrap();
    }
    register
        .record_withdrawal(Withdrawal::new(
            "b-drop".to_string(),
            dec("5"),
            "Safe drop".to_string(),
            local(2, 11),
        ))
        .await
        .unwrap();
    register
        .close_session(day(1), dec("180.00"), "ana")
        .await
        .unwrap();

    let report = register.period_report(day(1), day(3)).await.unwrap();

    assert_eq!(report.days.len(), 3);
    assert_eq!(report.net_balance, dec("115"));
    assert_eq!(report.summary.total_entries, dec("150"));
    assert_eq!(report.summary.total_exits, dec("30"));
    assert_eq!(report.summary.total_withdrawals, dec("5"));
    assert_eq!(report.summary.opening_amount, dec("100.00"));

    assert_eq!(report.statistics.total_transactions, 4);
    assert_eq!(report.statistics.average_ticket, dec("75.00"));
    assert_eq!(report.statistics.average_daily_entries, dec("50.00"));
    assert_eq!(report.session_statistics.days_with_session, 2);
    assert_eq!(report.session_statistics.days_closed, 1);
    assert_eq!(report.session_statistics.days_open, 1);
}

#[tokio::test]
async fn test_period_report_rejects_inverted_range() {
    let register = CashRegister::new(MemoryStorage::new());

    let result = register.period_report(day(5), day(1)).await;
    assert!(matches!(result, Err(ReconciliationError::Validation(_))));
}

#[tokio::test]
async fn test_receivables_schedule_for_card_sales() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .record_transaction(CashTransaction::entry(
            "debit-1".to_string(),
            dec("100.00"),
            PaymentMethod::DebitCard,
            local(1, 9),
        ))
        .await
        .unwrap();
    register
        .record_transaction(
            CashTransaction::entry(
                "credit-1".to_string(),
                dec("300.00"),
                PaymentMethod::CreditCard,
                local(1, 10),
            )
            .with_installments(3),
        )
        .await
        .unwrap();
    register
        .record_transaction(CashTransaction::entry(
            "cash-1".to_string(),
            dec("40.00"),
            PaymentMethod::Cash,
            local(1, 11),
        ))
        .await
        .unwrap();

    let schedule = register.receivables_schedule(day(1), day(1)).await.unwrap();
    assert_eq!(schedule.len(), 4);
    assert!(schedule.iter().all(|e| e.payment_method.is_card()));

    let debit = &schedule[0];
    assert_eq!(debit.transaction_id, "debit-1");
    assert_eq!(debit.expected_date, day(2));
    assert_eq!(debit.fee_amount, dec("1.99"));
    assert_eq!(debit.net_amount, dec("98.01"));

    let credit: Vec<_> = schedule
        .iter()
        .filter(|e| e.transaction_id == "credit-1")
        .collect();
    assert_eq!(credit.len(), 3);
    assert_eq!(credit[0].expected_date, day(31));
    assert!(credit.iter().all(|e| e.gross_amount == dec("100.00")));

    let april = net_receivable_between(&schedule, day(2), day(30));
    assert_eq!(april, dec("98.01"));
}

#[tokio::test]
async fn test_register_from_toml_config() {
    let config = ReconciliationConfig::from_toml_str(
        r#"
        utc_offset = "+00:00"
        reconciliation_tolerance = "0.50"
        "#,
    )
    .unwrap();
    let mut register = CashRegister::with_config(MemoryStorage::new(), &config).unwrap();

    register
        .open_session(day(1), dec("10.00"), "ana")
        .await
        .unwrap();
    register
        .record_transaction(CashTransaction::entry(
            "midnight".to_string(),
            dec("5.00"),
            PaymentMethod::Cash,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap(),
        ))
        .await
        .unwrap();

    register
        .close_session(day(1), dec("15.40"), "ana")
        .await
        .unwrap();

    let report = register.daily_report(day(1)).await.unwrap();
    assert_eq!(report.summary.total_entries, dec("5.00"));
    let variance = report.variance.unwrap();
    assert_eq!(variance.difference, dec("0.40"));
    assert_eq!(variance.status, VarianceStatus::Reconciled);
}

#[tokio::test]
async fn test_storage_survives_register_clone() {
    let storage = MemoryStorage::new();
    let mut register = CashRegister::new(storage.clone());
    register
        .open_session(day(1), dec("100.00"), "ana")
        .await
        .unwrap();

    let sessions = storage.list_sessions(day(1), day(1)).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].opened_by, "ana");
}

#[tokio::test]
async fn test_reused_withdrawal_id_cannot_rewrite_closed_day() {
    let mut register = CashRegister::new(MemoryStorage::new());
    register
        .open_session(day(1), dec("100.00"), "ana")
        .await
        .unwrap();
    register
        .record_withdrawal(Withdrawal::new(
            "w1".to_string(),
            dec("30.00"),
            "Safe drop".to_string(),
            local(1, 12),
        ))
        .await
        .unwrap();
    register
        .close_session(day(1), dec("70.00"), "ana")
        .await
        .unwrap();

    register
        .open_session(day(2), dec("70.00"), "ana")
        .await
        .unwrap();
    let reused = register
        .record_withdrawal(Withdrawal::new(
            "w1".to_string(),
            dec("5.00"),
            "Safe drop".to_string(),
            local(2, 12),
        ))
        .await;
    assert!(matches!(reused, Err(ReconciliationError::InvalidState(_))));

    let closed_day = register.daily_summary(day(1)).await.unwrap();
    assert_eq!(closed_day.total_withdrawals, dec("30.00"));
    let next_day = register.daily_summary(day(2)).await.unwrap();
    assert_eq!(next_day.withdrawal_count, 0);
}

#[tokio::test]
async fn test_reused_transaction_id_rejected() {
    let mut register = CashRegister::new(MemoryStorage::new());
    let sale = CashTransaction::entry(
        "sale-1".to_string(),
        dec("40.00"),
        PaymentMethod::Cash,
        local(1, 9),
    );
    register.record_transaction(sale.clone()).await.unwrap();

    let mut moved = sale;
    moved.timestamp = local(2, 9);
    let result = register.record_transaction(moved).await;
    assert!(matches!(result, Err(ReconciliationError::InvalidState(_))));
    assert_eq!(
        register.daily_summary(day(1)).await.unwrap().total_entries,
        dec("40.00")
    );
}

#[tokio::test]
async fn test_installment_plan_limit_enforced_on_record() {
    let config = ReconciliationConfig::from_toml_str(
        r#"
        [settlement]
        max_installments = 12
        "#,
    )
    .unwrap();
    let mut register = CashRegister::with_config(MemoryStorage::new(), &config).unwrap();
    let credit_sale = |id: &str, count: u32| {
        CashTransaction::entry(
            id.to_string(),
            dec("120.00"),
            PaymentMethod::CreditCard,
            local(1, 10),
        )
        .with_installments(count)
    };

    register
        .record_transaction(credit_sale("credit-12", 12))
        .await
        .unwrap();
    let too_many = register.record_transaction(credit_sale("credit-13", 13)).await;
    assert!(matches!(too_many, Err(ReconciliationError::Validation(_))));
    let absurd = register
        .record_transaction(credit_sale("credit-max", u32::MAX))
        .await;
    assert!(matches!(absurd, Err(ReconciliationError::Validation(_))));

    let schedule = register.receivables_schedule(day(1), day(1)).await.unwrap();
    assert_eq!(schedule.len(), 12);
}
