pub use sea_orm_migration::prelude::*;

mod m20250505_000001_create_spin_wheel;
mod m20250512_000002_add_participant_ip;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250505_000001_create_spin_wheel::Migration),
            Box::new(m20250512_000002_add_participant_ip::Migration),
        ]
    }
}
