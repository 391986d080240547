mod bulk;
mod config_gen;
mod create;
mod sweep;

pub use bulk::bulk_from_csv;
pub use config_gen::config_generate;
pub use create::create_link;
pub use sweep::sweep_once;
