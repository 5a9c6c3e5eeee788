pub mod finance;
pub mod loan;
pub mod recurring;
pub mod ticket;
