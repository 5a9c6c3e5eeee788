// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Tickets ---
        handlers::tickets::create_ticket,
        handlers::tickets::list_tickets,
        handlers::tickets::get_ticket,
        handlers::tickets::update_ticket,
        handlers::tickets::delete_ticket,

        // --- Finance ---
        handlers::finance::record_transaction,
        handlers::finance::list_transactions,
        handlers::finance::get_summary,
        handlers::finance::get_transaction,
        handlers::finance::delete_transaction,

        // --- Loans ---
        handlers::loans::create_loan,
        handlers::loans::list_loans,
        handlers::loans::get_loan,
        handlers::loans::record_payment,
        handlers::loans::overdue_sweep,
        handlers::loans::delete_loan,

        // --- Recurring charges ---
        handlers::charges::create_charge,
        handlers::charges::list_charges,
        handlers::charges::update_charge,
        handlers::charges::delete_charge,
        handlers::charges::sync_charges,
    ),
    components(
        schemas(
            // --- Tickets ---
            models::ticket::TicketStatus,
            models::ticket::Ticket,
            handlers::tickets::CreateTicketPayload,
            handlers::tickets::UpdateTicketPayload,

            // --- Finance ---
            models::finance::TxnDirection,
            models::finance::TxnType,
            models::finance::TxnSource,
            models::finance::TxnStatus,
            models::finance::FinanceTransaction,
            models::finance::FinanceSummary,
            crate::domain::windows::SummaryPreset,
            handlers::finance::RecordTransactionPayload,

            // --- Loans ---
            models::loan::LoanStatus,
            models::loan::PaymentStatus,
            models::loan::Loan,
            models::loan::LoanPayment,
            models::loan::LoanWithSchedule,
            models::loan::PaymentReceipt,
            models::loan::OverdueSweep,
            handlers::loans::CreateLoanPayload,
            handlers::loans::RecordPaymentPayload,

            // --- Recurring charges ---
            models::recurring::ChargeFrequency,
            models::recurring::ChargeStatus,
            models::recurring::RecurringCharge,
            models::recurring::SyncReport,
            handlers::charges::CreateChargePayload,
            handlers::charges::UpdateChargePayload,
        )
    ),
    tags(
        (name = "Tickets", description = "Multas (PCN) da frota, paginadas por cursor"),
        (name = "Finance", description = "Razão financeiro e resumos"),
        (name = "Loans", description = "Financiamentos, cronograma e pagamentos"),
        (name = "Recurring charges", description = "Cobranças recorrentes e sincronização")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
