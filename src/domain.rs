// Regras puras, sem I/O. Os serviços chamam daqui e os testes batem direto.
pub mod amortization;
pub mod ledger;
pub mod recurrence;
pub mod windows;
