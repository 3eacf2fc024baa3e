//! Registration of detected token contracts, driven by `TokenDetected` events.

mod errors;
mod registrar;
mod task;

pub use errors::RegisterError;
#[cfg(any(test, feature = "test-utils"))]
pub use registrar::MockTokenRegistrar;
pub use registrar::{
    register_path, render_register_package, DryRunRegistrar, RpcTokenRegistrar, TokenRegistrar,
    REGISTER_FILE_NAME,
};
pub use task::{registration_task, spawn_registration_task, RegistrationStats};
