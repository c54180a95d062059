#[cfg(feature = "auto_register")]
pub use inventory;
