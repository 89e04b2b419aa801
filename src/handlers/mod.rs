pub mod common;
pub mod customers;
pub mod deliveries;
pub mod expenses;
pub mod inventory;
pub mod orders;
pub mod purchase_orders;
pub mod staff;
pub mod stock_in;
pub mod suppliers;
pub mod vehicles;

use std::sync::Arc;

use crate::{
    auth::IdentityProvider,
    config::AppConfig,
    db::DbPool,
    services::{
        customers::CustomerService, deliveries::DeliveryService, expenses::ExpenseService,
        inventory::InventoryService, orders::OrderService,
        purchase_orders::PurchaseOrderService, staff::StaffService, stock_in::StockInService,
        suppliers::SupplierService, vehicles::VehicleService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
    pub inventory: Arc<InventoryService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub stock_in: Arc<StockInService>,
    pub staff: Arc<StaffService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderService>,
    pub deliveries: Arc<DeliveryService>,
    pub expenses: Arc<ExpenseService>,
    pub vehicles: Arc<VehicleService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            suppliers: Arc::new(SupplierService::new(db_pool.clone())),
            inventory: Arc::new(InventoryService::new(db_pool.clone())),
            purchase_orders: Arc::new(PurchaseOrderService::new(db_pool.clone())),
            stock_in: Arc::new(StockInService::new(
                db_pool.clone(),
                config.stock_in_id_format,
            )),
            staff: Arc::new(StaffService::new(db_pool.clone(), identity)),
            customers: Arc::new(CustomerService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(
                db_pool.clone(),
                config.order_status_vocabulary,
            )),
            deliveries: Arc::new(DeliveryService::new(db_pool.clone())),
            expenses: Arc::new(ExpenseService::new(db_pool.clone())),
            vehicles: Arc::new(VehicleService::new(db_pool)),
        }
    }
}
