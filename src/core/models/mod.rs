pub mod balance;
pub mod chart;
pub mod payment;
pub mod report;
pub mod status;
pub mod user;
