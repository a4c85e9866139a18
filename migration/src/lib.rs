#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug)]

pub use sea_orm_migration::prelude::*;

pub struct Migrator;

mod m20231102_091512_courses_init;
mod m20231102_093040_access_levels;
mod m20231109_174201_task_progress;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20231102_091512_courses_init::Migration),
            Box::new(m20231102_093040_access_levels::Migration),
            Box::new(m20231109_174201_task_progress::Migration),
        ]
    }
}
