//! # Repository Module
//!
//! Database repository implementations for the PDV engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP Handler                                                          │
//! │       │                                                                 │
//! │       │  db.caixa().get_open_session()                                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CaixaRepository                                                       │
//! │  ├── open_session(&self, opening_balance)                              │
//! │  ├── add_manual_movement(&self, kind, amount, description)             │
//! │  ├── running_balance(&self, session)                                   │
//! │  └── close_session(&self, counted)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`stock::ProductRepository`] - Catalog reads and the stock guard
//! - [`customer::CustomerRepository`] - Customer financial snapshots
//! - [`caixa::CaixaRepository`] - Cash sessions and drawer movements
//! - [`sale::SaleRepository`] - The atomic sale finalizer and cancellation

pub mod caixa;
pub mod customer;
pub mod sale;
pub mod stock;
