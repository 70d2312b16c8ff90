use crate::infra::{build_billing_service, parse_date, BillingWiring};
use billing_ai::billing::grace::{calculate_grace_period, GraceMetrics, SubscriptionTier};
use billing_ai::billing::reminders::{
    BillingContact, InvoiceRecord, InvoiceStatus, OpenInvoice, RunReport,
};
use billing_ai::billing::{InvoiceId, TenantId};
use billing_ai::config::AppConfig;
use billing_ai::error::AppError;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (YYYY-MM-DD, defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DispatchArgs {
    /// Override the evaluation date (YYYY-MM-DD, defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct GraceArgs {
    /// Evaluate one tenant instead of the demo roster.
    #[arg(long)]
    pub(crate) tenant: Option<String>,
}

fn demo_invoice(
    id: &str,
    tenant: &str,
    tenant_name: &str,
    due_date: NaiveDate,
    status: InvoiceStatus,
    email: Option<&str>,
) -> OpenInvoice {
    OpenInvoice {
        invoice: InvoiceRecord {
            id: InvoiceId(id.to_string()),
            tenant_id: TenantId(tenant.to_string()),
            invoice_number: format!("PLAT-2026-{id}"),
            total: 1_750_000.0,
            status,
            issued_at: None,
            due_date,
            grace_period_days: None,
        },
        contact: BillingContact {
            tenant_name: tenant_name.to_string(),
            billing_email: email.map(str::to_string),
        },
    }
}

/// A roster covering every interesting dispatch outcome: an upcoming
/// reminder, an overdue catch-up, and an unreachable tenant.
fn seeded_invoices(today: NaiveDate) -> Vec<OpenInvoice> {
    vec![
        demo_invoice(
            "000101",
            "clinic-sanroque",
            "Clinica San Roque",
            today + Duration::days(5),
            InvoiceStatus::Sent,
            Some("billing@sanroque.example"),
        ),
        demo_invoice(
            "000102",
            "clinic-nueva",
            "Clinica Nueva Esperanza",
            today - Duration::days(9),
            InvoiceStatus::Overdue,
            Some("admin@nuevaesperanza.example"),
        ),
        demo_invoice(
            "000103",
            "clinic-centenario",
            "Veterinaria Centenario",
            today + Duration::days(2),
            InvoiceStatus::Sent,
            None,
        ),
    ]
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn render_run_report(report: &RunReport) {
    println!(
        "Scanned {} invoice(s): {} sent, {} skipped, {} error(s)",
        report.summary.invoices_scanned,
        report.summary.sent,
        report.summary.skipped,
        report.summary.errors
    );
    for result in &report.results {
        let type_label = result
            .reminder_type
            .map(|reminder_type| reminder_type.as_str())
            .unwrap_or("-");
        let reason = result
            .reason
            .as_deref()
            .map(|reason| format!(" ({reason})"))
            .unwrap_or_default();
        println!(
            "- {} | {} | {} | {:?}{}",
            result.tenant_id, result.invoice_number, type_label, result.status, reason
        );
    }
}

pub(crate) async fn run_dispatch(args: DispatchArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let config = AppConfig::load()?;
    let wiring = build_billing_service(&config, seeded_invoices(today));

    println!("Reminder dispatch over seeded invoices (evaluated {today})");
    let report = wiring
        .service
        .runner
        .run(midnight_utc(today))
        .await
        .map_err(AppError::from)?;
    render_run_report(&report);
    Ok(())
}

pub(crate) fn run_grace(args: GraceArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let wiring = build_billing_service(&config, Vec::new());

    let tenants = match args.tenant {
        Some(tenant) => vec![tenant],
        None => vec!["clinic-sanroque".to_string(), "clinic-nueva".to_string()],
    };

    for tenant in tenants {
        let tenant_id = TenantId(tenant);
        match wiring.service.collector.collect(&tenant_id, Utc::now()) {
            Ok(metrics) => {
                let evaluation = wiring.service.engine.evaluate(&metrics);
                println!("\nGrace evaluation for {tenant_id}");
                println!(
                    "- Recommendation: {} days ({:?} risk, confidence {:.2})",
                    evaluation.recommended_grace_days.days(),
                    evaluation.risk_level,
                    evaluation.confidence
                );
                println!("- Total score: {:.2}", evaluation.total_score);
                println!("- Reasoning: {}", evaluation.reasoning);
            }
            Err(err) => println!("\nGrace evaluation for {tenant_id} unavailable: {err}"),
        }
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let config = AppConfig::load()?;
    let wiring = build_billing_service(&config, seeded_invoices(today));

    println!("Billing automation demo (evaluated {today})");

    println!("\nReminder dispatch");
    let report = wiring
        .service
        .runner
        .run(midnight_utc(today))
        .await
        .map_err(AppError::from)?;
    render_run_report(&report);

    // A second pass proves the dedup gate: nothing new goes out.
    let second = wiring
        .service
        .runner
        .run(midnight_utc(today))
        .await
        .map_err(AppError::from)?;
    println!(
        "\nSecond pass (dedup check): {} sent, {} skipped",
        second.summary.sent, second.summary.skipped
    );

    render_reminder_history(&wiring, "000102");

    let notices = wiring.notices.events();
    if notices.is_empty() {
        println!("\nAdmin notices: none raised");
    } else {
        println!("\nAdmin notices");
        for notice in notices {
            println!("- [{}] {}", notice.reminder_type.as_str(), notice.message);
        }
    }

    println!("\nGrace period scoring");
    run_grace(GraceArgs::default())?;

    let brand_new = calculate_grace_period(&GraceMetrics::for_new_account(SubscriptionTier::Free));
    println!("\nBaseline for a brand-new free-tier clinic");
    println!(
        "- Recommendation: {} days ({:?} risk, confidence {:.2})",
        brand_new.recommended_grace_days.days(),
        brand_new.risk_level,
        brand_new.confidence
    );

    Ok(())
}

fn render_reminder_history(wiring: &BillingWiring, invoice_id: &str) {
    use billing_ai::billing::reminders::ReminderStore;

    let invoice = InvoiceId(invoice_id.to_string());
    match wiring.reminders.history(&invoice) {
        Ok(rows) if rows.is_empty() => println!("\nReminder history for {invoice}: empty"),
        Ok(rows) => {
            println!("\nReminder history for {invoice}");
            for row in rows {
                println!(
                    "- {} | {:?} | {}",
                    row.reminder_type.as_str(),
                    row.status,
                    row.subject
                );
            }
        }
        Err(err) => println!("\nReminder history for {invoice} unavailable: {err}"),
    }
}
