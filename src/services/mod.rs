pub mod inventory;
pub mod orders;
pub mod reports;

pub use inventory::InventoryService;
pub use orders::OrderService;
pub use reports::ReportService;
