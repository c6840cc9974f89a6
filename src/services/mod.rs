pub mod booking;
pub mod ledger;
pub mod pricing;
