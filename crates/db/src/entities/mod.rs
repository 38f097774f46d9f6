//! `SeaORM` entity definitions.

pub mod prelude;

pub mod account_configuration_keys;
pub mod account_configurations;
pub mod account_groups;
pub mod accounts;
pub mod invoices;
pub mod ledgers;
pub mod notes;
pub mod parties;
pub mod payment_allocations;
pub mod payment_details;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod voucher_lines;
pub mod voucher_types;
pub mod vouchers;
