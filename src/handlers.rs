pub mod charges;
pub mod finance;
pub mod loans;
pub mod tickets;
