use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tenants_table::Migration),
            Box::new(m20240101_000002_create_persons_table::Migration),
            Box::new(m20240101_000003_create_fish_reference_tables::Migration),
            Box::new(m20240101_000004_create_settings_table::Migration),
            Box::new(m20240101_000005_create_stocking_events_table::Migration),
            Box::new(m20240101_000006_create_fish_batches_table::Migration),
            Box::new(m20240101_000007_seed_reference_data::Migration),
        ]
    }
}

mod m20240101_000001_create_tenants_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_tenants_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tenants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tenants::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Tenants::Name).string().not_null())
                        .col(ColumnDef::new(Tenants::RegistryCode).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Tenants::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Tenants {
        Table,
        Id,
        Name,
        RegistryCode,
    }
}

mod m20240101_000002_create_persons_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_tenants_table::Tenants;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_persons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Persons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Persons::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Persons::FirstName).string().not_null())
                        .col(ColumnDef::new(Persons::LastName).string().not_null())
                        .col(ColumnDef::new(Persons::Email).string().not_null())
                        .col(ColumnDef::new(Persons::Phone).string().null())
                        .col(
                            ColumnDef::new(Persons::Role)
                                .string()
                                .not_null()
                                .default("USER"),
                        )
                        .col(ColumnDef::new(Persons::TenantId).big_integer().null())
                        .col(ColumnDef::new(Persons::Authority).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_persons_tenant")
                                .from(Persons::Table, Persons::TenantId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Persons::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Persons {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        Role,
        TenantId,
        Authority,
    }
}

mod m20240101_000003_create_fish_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_fish_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FishTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FishTypes::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FishTypes::Name).string().not_null())
                        .col(ColumnDef::new(FishTypes::LatinName).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FishAges::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FishAges::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FishAges::Name).string().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FishAges::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FishTypes::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum FishTypes {
        Table,
        Id,
        Name,
        LatinName,
    }

    #[derive(Iden)]
    pub enum FishAges {
        Table,
        Id,
        Name,
    }
}

mod m20240101_000004_create_settings_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_settings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Settings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Settings::Id)
                                .big_integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Settings::MinTimeTillStocking)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Settings::MaxTimeForRegistration)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Settings::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Settings {
        Table,
        Id,
        MinTimeTillStocking,
        MaxTimeForRegistration,
    }
}

mod m20240101_000005_create_stocking_events_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_tenants_table::Tenants;
    use super::m20240101_000002_create_persons_table::Persons;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_stocking_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockingEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockingEvents::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::EventTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::ReviewTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::CanceledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(StockingEvents::FishOrigin).string().not_null())
                        .col(
                            ColumnDef::new(StockingEvents::FishOriginCompanyName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::FishOriginReservoir)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockingEvents::TenantId).big_integer().null())
                        .col(
                            ColumnDef::new(StockingEvents::StockingCustomerId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::CreatedBy)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::AssignedTo)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockingEvents::ReviewedBy).big_integer().null())
                        .col(
                            ColumnDef::new(StockingEvents::AssignedInspectorId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockingEvents::Inspector).json().null())
                        .col(
                            ColumnDef::new(StockingEvents::ReservoirCadastralId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::ReservoirName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockingEvents::Municipality).string().null())
                        .col(ColumnDef::new(StockingEvents::ReservoirArea).double().null())
                        .col(
                            ColumnDef::new(StockingEvents::ReservoirLength)
                                .double()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::ReservoirCategory)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockingEvents::GeomX).double().not_null())
                        .col(ColumnDef::new(StockingEvents::GeomY).double().not_null())
                        .col(ColumnDef::new(StockingEvents::Signatures).json().null())
                        .col(ColumnDef::new(StockingEvents::WaybillNo).string().null())
                        .col(ColumnDef::new(StockingEvents::VetApprovalNo).string().null())
                        .col(
                            ColumnDef::new(StockingEvents::VetCertificateNo)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockingEvents::WaterTemp).double().null())
                        .col(
                            ColumnDef::new(StockingEvents::TransportWaterTemp)
                                .double()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockingEvents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stocking_events_tenant")
                                .from(StockingEvents::Table, StockingEvents::TenantId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stocking_events_customer")
                                .from(StockingEvents::Table, StockingEvents::StockingCustomerId)
                                .to(Tenants::Table, Tenants::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stocking_events_assigned_to")
                                .from(StockingEvents::Table, StockingEvents::AssignedTo)
                                .to(Persons::Table, Persons::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stocking_events_event_time")
                        .table(StockingEvents::Table)
                        .col(StockingEvents::EventTime)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stocking_events_tenant")
                        .table(StockingEvents::Table)
                        .col(StockingEvents::TenantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockingEvents::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StockingEvents {
        Table,
        Id,
        EventTime,
        ReviewTime,
        CanceledAt,
        FishOrigin,
        FishOriginCompanyName,
        FishOriginReservoir,
        TenantId,
        StockingCustomerId,
        CreatedBy,
        AssignedTo,
        ReviewedBy,
        AssignedInspectorId,
        Inspector,
        ReservoirCadastralId,
        ReservoirName,
        Municipality,
        ReservoirArea,
        ReservoirLength,
        ReservoirCategory,
        GeomX,
        GeomY,
        Signatures,
        WaybillNo,
        VetApprovalNo,
        VetCertificateNo,
        WaterTemp,
        TransportWaterTemp,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_fish_batches_table {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_fish_reference_tables::{FishAges, FishTypes};
    use super::m20240101_000005_create_stocking_events_table::StockingEvents;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_fish_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FishBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FishBatches::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FishBatches::FishStockingId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FishBatches::FishTypeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FishBatches::FishAgeId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FishBatches::Amount).integer().not_null())
                        .col(ColumnDef::new(FishBatches::Weight).double().null())
                        .col(ColumnDef::new(FishBatches::ReviewAmount).integer().null())
                        .col(ColumnDef::new(FishBatches::ReviewWeight).double().null())
                        .col(
                            ColumnDef::new(FishBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FishBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fish_batches_stocking_event")
                                .from(FishBatches::Table, FishBatches::FishStockingId)
                                .to(StockingEvents::Table, StockingEvents::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fish_batches_fish_type")
                                .from(FishBatches::Table, FishBatches::FishTypeId)
                                .to(FishTypes::Table, FishTypes::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fish_batches_fish_age")
                                .from(FishBatches::Table, FishBatches::FishAgeId)
                                .to(FishAges::Table, FishAges::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_fish_batches_stocking_event")
                        .table(FishBatches::Table)
                        .col(FishBatches::FishStockingId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FishBatches::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum FishBatches {
        Table,
        Id,
        FishStockingId,
        FishTypeId,
        FishAgeId,
        Amount,
        Weight,
        ReviewAmount,
        ReviewWeight,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_seed_reference_data {
    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_fish_reference_tables::{FishAges, FishTypes};
    use super::m20240101_000004_create_settings_table::Settings;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_seed_reference_data"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Single settings row read by every window check.
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Settings::Table)
                        .columns([
                            Settings::Id,
                            Settings::MinTimeTillStocking,
                            Settings::MaxTimeForRegistration,
                        ])
                        .values_panic([1.into(), 2.into(), 5.into()])
                        .to_owned(),
                )
                .await?;

            for (name, latin) in [
                ("Brown trout", Some("Salmo trutta")),
                ("Atlantic salmon", Some("Salmo salar")),
                ("European whitefish", Some("Coregonus lavaretus")),
                ("Northern pike", Some("Esox lucius")),
                ("Pikeperch", Some("Sander lucioperca")),
                ("European eel", Some("Anguilla anguilla")),
                ("Common carp", Some("Cyprinus carpio")),
                ("Crucian carp", Some("Carassius carassius")),
            ] {
                let mut insert = Query::insert()
                    .into_table(FishTypes::Table)
                    .columns([FishTypes::Name, FishTypes::LatinName])
                    .to_owned();
                match latin {
                    Some(latin) => insert.values_panic([name.into(), latin.into()]),
                    None => insert.values_panic([name.into(), Option::<String>::None.into()]),
                };
                manager.exec_stmt(insert).await?;
            }

            for name in [
                "Larva",
                "Fry",
                "One-summer",
                "One-year",
                "Two-summer",
                "Two-year",
                "Three-summer and older",
            ] {
                manager
                    .exec_stmt(
                        Query::insert()
                            .into_table(FishAges::Table)
                            .columns([FishAges::Name])
                            .values_panic([name.into()])
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .exec_stmt(Query::delete().from_table(FishAges::Table).to_owned())
                .await?;
            manager
                .exec_stmt(Query::delete().from_table(FishTypes::Table).to_owned())
                .await?;
            manager
                .exec_stmt(Query::delete().from_table(Settings::Table).to_owned())
                .await?;
            Ok(())
        }
    }
}
