pub mod ticket_service;
pub use ticket_service::TicketService;
pub mod finance_service;
pub use finance_service::FinanceService;
pub mod loan_service;
pub use loan_service::LoanService;
pub mod charge_service;
pub use charge_service::ChargeService;
