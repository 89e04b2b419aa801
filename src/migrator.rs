use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_directory_tables::Migration),
            Box::new(m20240101_000002_create_procurement_tables::Migration),
            Box::new(m20240101_000003_create_fulfillment_tables::Migration),
            Box::new(m20240101_000004_create_expenses_table::Migration),
        ]
    }
}

// Schema identifiers shared by the migrations below

#[derive(DeriveIden)]
enum Suppliers {
    Table,
    SupplierId,
    SupplierName,
    ContactNo,
    Email,
    Address,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InventoryItems {
    Table,
    ItemId,
    ItemName,
    Brand,
    Category,
    Size,
    Quantity,
    Uom,
    CostPrice,
    SellingPrice,
    SupplierId,
    StockInDate,
}

#[derive(DeriveIden)]
enum StaffProfiles {
    Table,
    Id,
    StaffId,
    Email,
    Username,
    Name,
    Contact,
    Address,
    Role,
    LicenseNumber,
    CreatedAt,
    Status,
    DeactivatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    CustomerId,
    Name,
    Email,
    Contact,
    Company,
    ShippingAddress,
    CreatedAt,
    Status,
    DeactivatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum IdSequences {
    Table,
    Scope,
    LastValue,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    PoId,
    SupplierId,
    OrderedBy,
    Status,
    DateOrdered,
    ExpectedDelivery,
    DateDelivered,
    Remarks,
    TotalCost,
}

#[derive(DeriveIden)]
enum PurchaseOrderItems {
    Table,
    Id,
    PoId,
    ItemId,
    Quantity,
    Uom,
    UnitPrice,
    TotalPrice,
    CheckedQuantity,
    CheckedStatus,
}

#[derive(DeriveIden)]
enum StockInRecords {
    Table,
    StockinId,
    ItemId,
    Quantity,
    Uom,
    SupplierId,
    StockedBy,
    PurchaseOrderId,
    Remarks,
    DateStocked,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    OrderId,
    Contact,
    CustomerEmail,
    CustomerName,
    Company,
    ShippingAddress,
    Items,
    TotalAmount,
    Status,
    DateOrdered,
    ConfirmedAt,
    PackedAt,
    InTransitAt,
    DeliveredAt,
    CancelledAt,
    PlacedBy,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum Vehicles {
    Table,
    VehicleId,
    PlateNumber,
    Model,
    Brand,
    YearManufactured,
    Type,
    Status,
    DateAcquired,
    AssignedDriver,
    LastMaintenance,
    InsuranceExpiry,
    RegistrationExpiry,
    CreatedAt,
    UpdatedAt,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum Deliveries {
    Table,
    DeliveryId,
    OrderId,
    DriverId,
    VehicleId,
    DeliveryDate,
    DateDelivered,
    Status,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    ExpenseId,
    Category,
    Amount,
    Date,
    PaidTo,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

mod m20240101_000001_create_directory_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_directory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::SupplierId)
                                .string_len(20)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::SupplierName).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactNo).string_len(20).not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().not_null())
                        .col(ColumnDef::new(Suppliers::Address).text().not_null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::ItemId)
                                .string_len(20)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryItems::ItemName).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Brand).string_len(100).null())
                        .col(
                            ColumnDef::new(InventoryItems::Category)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Size).string_len(50).null())
                        .col(
                            ColumnDef::new(InventoryItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryItems::Uom).string_len(50).not_null())
                        .col(
                            ColumnDef::new(InventoryItems::CostPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::SellingPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::SupplierId).string_len(20).null())
                        .col(
                            ColumnDef::new(InventoryItems::StockInDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_supplier_id")
                                .from(InventoryItems::Table, InventoryItems::SupplierId)
                                .to(Suppliers::Table, Suppliers::SupplierId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StaffProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StaffProfiles::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::StaffId)
                                .string_len(20)
                                .null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::Username)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(StaffProfiles::Name).string().null())
                        .col(ColumnDef::new(StaffProfiles::Contact).string_len(20).not_null())
                        .col(ColumnDef::new(StaffProfiles::Address).text().null())
                        .col(ColumnDef::new(StaffProfiles::Role).string_len(30).null())
                        .col(
                            ColumnDef::new(StaffProfiles::LicenseNumber)
                                .string_len(50)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::Status)
                                .string_len(20)
                                .not_null()
                                .default("Active"),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::DeactivatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StaffProfiles::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Profiles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Profiles::CustomerId)
                                .string_len(20)
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Profiles::Name).string().not_null())
                        .col(
                            ColumnDef::new(Profiles::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Profiles::Contact).string_len(20).not_null())
                        .col(ColumnDef::new(Profiles::Company).string().null())
                        .col(ColumnDef::new(Profiles::ShippingAddress).text().null())
                        .col(
                            ColumnDef::new(Profiles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Profiles::Status)
                                .string_len(20)
                                .not_null()
                                .default("Active"),
                        )
                        .col(
                            ColumnDef::new(Profiles::DeactivatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Profiles::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(IdSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IdSequences::Scope)
                                .string_len(40)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(IdSequences::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                IdSequences::Table.into_iden(),
                Profiles::Table.into_iden(),
                StaffProfiles::Table.into_iden(),
                InventoryItems::Table.into_iden(),
                Suppliers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000002_create_procurement_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_procurement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::PoId)
                                .string_len(20)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::OrderedBy).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::DateOrdered)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ExpectedDelivery).date().null())
                        .col(ColumnDef::new(PurchaseOrders::DateDelivered).date().null())
                        .col(ColumnDef::new(PurchaseOrders::Remarks).text().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::SupplierId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_ordered_by")
                                .from(PurchaseOrders::Table, PurchaseOrders::OrderedBy)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PoId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::ItemId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Uom)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitPrice)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::TotalPrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::CheckedQuantity)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::CheckedStatus)
                                .string_len(20)
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_po_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::PoId)
                                .to(PurchaseOrders::Table, PurchaseOrders::PoId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_item_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::ItemId)
                                .to(InventoryItems::Table, InventoryItems::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_order_items_po_id")
                        .table(PurchaseOrderItems::Table)
                        .col(PurchaseOrderItems::PoId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockInRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockInRecords::StockinId)
                                .string_len(40)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockInRecords::ItemId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockInRecords::Quantity).integer().not_null())
                        .col(ColumnDef::new(StockInRecords::Uom).string_len(20).not_null())
                        .col(
                            ColumnDef::new(StockInRecords::SupplierId)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockInRecords::StockedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockInRecords::PurchaseOrderId)
                                .string_len(20)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockInRecords::Remarks)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(StockInRecords::DateStocked)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_in_records_item_id")
                                .from(StockInRecords::Table, StockInRecords::ItemId)
                                .to(InventoryItems::Table, InventoryItems::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_in_records_supplier_id")
                                .from(StockInRecords::Table, StockInRecords::SupplierId)
                                .to(Suppliers::Table, Suppliers::SupplierId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_in_records_stocked_by")
                                .from(StockInRecords::Table, StockInRecords::StockedBy)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_in_records_purchase_order_id")
                                .from(StockInRecords::Table, StockInRecords::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::PoId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                StockInRecords::Table.into_iden(),
                PurchaseOrderItems::Table.into_iden(),
                PurchaseOrders::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000003_create_fulfillment_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_fulfillment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::OrderId)
                                .string_len(100)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::Contact).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                        .col(ColumnDef::new(Orders::Company).string().not_null())
                        .col(ColumnDef::new(Orders::ShippingAddress).text().not_null())
                        .col(ColumnDef::new(Orders::Items).json().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(50)
                                .not_null()
                                .default("Pending"),
                        )
                        .col(
                            ColumnDef::new(Orders::DateOrdered)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ConfirmedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::PackedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::InTransitAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CancelledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::PlacedBy).string().null())
                        .col(ColumnDef::new(Orders::UpdatedBy).uuid().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_updated_by")
                                .from(Orders::Table, Orders::UpdatedBy)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Vehicles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Vehicles::VehicleId)
                                .string_len(20)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Vehicles::PlateNumber)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Vehicles::Model).string_len(100).not_null())
                        .col(ColumnDef::new(Vehicles::Brand).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Vehicles::YearManufactured)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Vehicles::Type).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Vehicles::Status)
                                .string_len(20)
                                .not_null()
                                .default("Active"),
                        )
                        .col(ColumnDef::new(Vehicles::DateAcquired).date().not_null())
                        .col(ColumnDef::new(Vehicles::AssignedDriver).uuid().null())
                        .col(ColumnDef::new(Vehicles::LastMaintenance).date().null())
                        .col(ColumnDef::new(Vehicles::InsuranceExpiry).date().not_null())
                        .col(
                            ColumnDef::new(Vehicles::RegistrationExpiry)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vehicles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vehicles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Vehicles::UpdatedBy).uuid().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vehicles_assigned_driver")
                                .from(Vehicles::Table, Vehicles::AssignedDriver)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Deliveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Deliveries::DeliveryId)
                                .string_len(50)
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Deliveries::OrderId)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Deliveries::DriverId).uuid().null())
                        .col(ColumnDef::new(Deliveries::VehicleId).string_len(20).null())
                        .col(ColumnDef::new(Deliveries::DeliveryDate).date().null())
                        .col(ColumnDef::new(Deliveries::DateDelivered).date().null())
                        .col(
                            ColumnDef::new(Deliveries::Status)
                                .string_len(20)
                                .not_null()
                                .default("Pending"),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_order_id")
                                .from(Deliveries::Table, Deliveries::OrderId)
                                .to(Orders::Table, Orders::OrderId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_driver_id")
                                .from(Deliveries::Table, Deliveries::DriverId)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deliveries_vehicle_id")
                                .from(Deliveries::Table, Deliveries::VehicleId)
                                .to(Vehicles::Table, Vehicles::VehicleId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Deliveries::Table.into_iden(),
                Vehicles::Table.into_iden(),
                Orders::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000004_create_expenses_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_expenses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Expenses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Expenses::ExpenseId)
                                .string_len(20)
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Expenses::Category).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Expenses::Amount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Expenses::Date).date().not_null())
                        .col(ColumnDef::new(Expenses::PaidTo).string().not_null())
                        .col(ColumnDef::new(Expenses::Description).text().null())
                        .col(ColumnDef::new(Expenses::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Expenses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Expenses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_expenses_created_by")
                                .from(Expenses::Table, Expenses::CreatedBy)
                                .to(StaffProfiles::Table, StaffProfiles::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Expenses::Table).if_exists().to_owned())
                .await
        }
    }
}
