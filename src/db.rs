pub mod store;
pub use store::{ChargeStore, LedgerStore, LoanStore, TicketStore};

pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod loan_repo;
pub use loan_repo::LoanRepository;
pub mod charge_repo;
pub use charge_repo::ChargeRepository;

#[cfg(test)]
pub mod memory;
