//! Data models for shop entities.
//!
//! This module contains the records appended to the shop's sheets:
//!
//! - Orders: `FabricOrder`, `TailorOrder`, `CombinedOrder`
//! - Workers: `Worker`, `NewWorker`, `PaymentEntry`, `PaymentRecord`
//! - Expenses: `FabricExpense`, `OtherExpense`
//!
//! Rows are created once and appended; nothing here is updated or deleted.

pub mod cell;
pub mod expense;
pub mod order;
pub mod worker;

pub use expense::{ExpenseSubmission, FabricExpense, OtherExpense};
pub use order::{
    fabric_total, CombinedOrder, Customer, CustomerType, FabricItem, FabricOrder, GarmentKind,
    GarmentSpec, PaymentStatus, TailorOrder,
};
pub use worker::{
    NewWorker, PaymentAmounts, PaymentEntry, PaymentRecord, Worker, PAINT_RATE, SHIRT_RATE,
};
