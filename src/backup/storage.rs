pub mod contract;
pub mod directory;

pub use contract::{BackupStorage, StoredBackup};
pub use directory::DirectoryBackupStorage;
