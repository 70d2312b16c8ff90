use super::domain::{InvoiceRecord, OpenInvoice, ReminderType};

/// Subject line for one reminder type and invoice.
pub fn subject_for(reminder_type: ReminderType, invoice: &InvoiceRecord) -> String {
    match reminder_type {
        ReminderType::UpcomingInvoice => {
            format!("Upcoming invoice {} due soon", invoice.invoice_number)
        }
        ReminderType::InvoiceDue => format!("Invoice {} is due today", invoice.invoice_number),
        ReminderType::OverdueGentle => {
            format!("Friendly reminder: invoice {} is overdue", invoice.invoice_number)
        }
        ReminderType::OverdueReminder => {
            format!("Invoice {} remains unpaid", invoice.invoice_number)
        }
        ReminderType::OverdueUrgent => {
            format!("Urgent: invoice {} requires immediate attention", invoice.invoice_number)
        }
        ReminderType::GracePeriodWarning => {
            format!("Grace period for invoice {} ends soon", invoice.invoice_number)
        }
    }
}

/// Plain-text body for one reminder type.
pub fn body_for(reminder_type: ReminderType, open: &OpenInvoice) -> String {
    let invoice = &open.invoice;
    let amount = format_guaranies(invoice.total);
    let due = invoice.due_date.format("%Y-%m-%d");
    let greeting = format!("Hello {},", open.contact.tenant_name);

    let detail = match reminder_type {
        ReminderType::UpcomingInvoice => format!(
            "Your platform invoice {} for {amount} is due on {due}. \
             No action is needed if payment is already scheduled.",
            invoice.invoice_number
        ),
        ReminderType::InvoiceDue => format!(
            "Your platform invoice {} for {amount} is due today ({due}). \
             Please arrange payment to keep your account in good standing.",
            invoice.invoice_number
        ),
        ReminderType::OverdueGentle => format!(
            "Invoice {} for {amount} was due on {due} and is now overdue. \
             If payment is already on its way, please disregard this notice.",
            invoice.invoice_number
        ),
        ReminderType::OverdueReminder => format!(
            "Invoice {} for {amount}, due on {due}, is still unpaid. \
             Please settle the balance or contact us to discuss payment options.",
            invoice.invoice_number
        ),
        ReminderType::OverdueUrgent => format!(
            "Invoice {} for {amount} has been overdue since {due}. \
             Continued non-payment may lead to service restrictions on your account.",
            invoice.invoice_number
        ),
        ReminderType::GracePeriodWarning => {
            let grace = invoice
                .grace_period_days
                .map(|g| g.days())
                .unwrap_or_default();
            format!(
                "The {grace}-day grace period granted for invoice {} ({amount}, due {due}) \
                 is about to end. Please complete payment before the window closes to \
                 avoid service interruption.",
                invoice.invoice_number
            )
        }
    };

    format!("{greeting}\n\n{detail}\n\nThank you,\nThe Platform Billing Team")
}

/// Guaraní amounts carry no decimals; thousands are dot-separated.
pub fn format_guaranies(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < -0.5 {
        format!("Gs. -{grouped}")
    } else {
        format!("Gs. {grouped}")
    }
}
