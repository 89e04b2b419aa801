pub mod customer_profile;
pub mod delivery;
pub mod expense;
pub mod id_sequence;
pub mod inventory_item;
pub mod order;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod staff_profile;
pub mod status;
pub mod stock_in_record;
pub mod supplier;
pub mod vehicle;
