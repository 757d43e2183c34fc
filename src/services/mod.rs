//! Business rules that sit between the HTTP handlers and the stores.

pub mod accounts;
pub mod tasks;

pub use accounts::AccountService;
pub use tasks::TaskService;
