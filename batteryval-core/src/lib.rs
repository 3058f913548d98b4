pub mod appraisal;
pub mod chemistry;
pub mod error;
pub mod market;
pub mod mass_balance;
pub mod reference;
pub mod request;
pub mod route;
pub mod transport;
pub mod valuation;
