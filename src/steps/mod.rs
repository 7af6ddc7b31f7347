//! The provisioning steps, one module per step

pub mod activation;
pub mod artifacts;
pub mod identity;
pub mod packages;
pub mod privilege;
pub mod proxy;
pub mod runtime;
pub mod units;

pub use activation::ActivationController;
pub use artifacts::ArtifactMaterializer;
pub use identity::IdentityProvisioner;
pub use packages::PackageInstaller;
pub use privilege::PrivilegeGuard;
pub use proxy::ReverseProxyConfigurer;
pub use runtime::RuntimeEnvironmentBuilder;
pub use units::ServiceUnitInstaller;
