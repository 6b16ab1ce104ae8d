pub mod fish_age;
pub mod fish_batch;
pub mod fish_type;
pub mod person;
pub mod settings;
pub mod stocking_event;
pub mod tenant;
