//! # Repository Module
//!
//! One repository per entity, each holding a clone of the shared pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend command                                                        │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(&new_sale)                              │
//! │       ▼                                                                 │
//! │  SaleRepository ──────────┐                                             │
//! │  RefundRepository ────────┤  both write products.stock inside their     │
//! │                           │  own transaction                            │
//! │  ProductRepository        │                                             │
//! │  CustomerRepository       ▼                                             │
//! │  ReportRepository ──► SQLite (read only)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, search, barcodes
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers referenced by sales
//! - [`SaleRepository`](sale::SaleRepository) - Sale transaction, reads, invoices
//! - [`RefundRepository`](refund::RefundRepository) - Refund transaction and lookups
//! - [`ReportRepository`](report::ReportRepository) - Sales and stock reports

pub mod customer;
pub mod product;
pub mod refund;
pub mod report;
pub mod sale;
