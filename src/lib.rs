pub mod config;
pub mod error;
pub mod inventory;
pub mod invoice;
pub mod numbering;
pub mod profit;
pub mod replies;

pub use config::{ArchivedInvoice, Company, Config, Customer, CustomerReply, Product, State};
pub use error::{BillingError, Result};
pub use inventory::{stock_report, StockLevel, StockReport};
pub use invoice::{create_invoice, Invoice, InvoiceStatus, LineItem};
pub use numbering::{extract_numeric, format_invoice_number, NumberPool, PoolStore};
pub use profit::{compute_profit_summary, ClientProfit, CostBasis, CustomerKey, ProfitSummary};
