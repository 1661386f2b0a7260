//! Local CLI command handlers.

pub mod delete;
pub mod info;
pub mod status;

pub use delete::{run_config_dir, run_delete, run_ds_store};
pub use info::run_info;
pub use status::run_status;
