pub mod error;
pub mod i18n;
pub mod ids;
pub mod money;
pub mod pagination;
