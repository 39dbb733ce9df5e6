
mod delivery;
mod environment;
mod purchase_order;
mod remito;
mod sap_number;

pub use delivery::{read_delivery_file, parse_expiry, DeliveryColumn, DeliveryRecord, SAP_DATE_FORMAT};
pub use environment::SapEnvironment;
pub use purchase_order::PurchaseOrder;
pub use remito::{Remito, RemitoError};
pub use sap_number::{normalize_sap_number, parse_sap_quantity};
