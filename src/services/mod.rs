// Shared building blocks
pub mod identifiers;
pub mod validators;

// Procurement and stock
pub mod inventory;
pub mod purchase_orders;
pub mod stock_in;
pub mod suppliers;

// People
pub mod customers;
pub mod staff;

// Fulfillment
pub mod deliveries;
pub mod orders;

// Fleet and finance
pub mod expenses;
pub mod vehicles;
