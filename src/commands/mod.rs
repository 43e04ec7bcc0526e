pub mod roles;
pub mod rotate;

pub use roles::UnusedRolesCommand;
pub use rotate::RotateKeysCommand;
