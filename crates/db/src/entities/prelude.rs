//! `SeaORM` entity prelude.

pub use super::account_configuration_keys::Entity as AccountConfigurationKeys;
pub use super::account_configurations::Entity as AccountConfigurations;
pub use super::account_groups::Entity as AccountGroups;
pub use super::accounts::Entity as Accounts;
pub use super::invoices::Entity as Invoices;
pub use super::ledgers::Entity as Ledgers;
pub use super::notes::Entity as Notes;
pub use super::parties::Entity as Parties;
pub use super::payment_allocations::Entity as PaymentAllocations;
pub use super::payment_details::Entity as PaymentDetails;
pub use super::payments::Entity as Payments;
pub use super::voucher_lines::Entity as VoucherLines;
pub use super::voucher_types::Entity as VoucherTypes;
pub use super::vouchers::Entity as Vouchers;
