mod container;
pub mod endpoint;
pub mod settings;
pub mod traits;

pub use container::{Container, LaunchSpec, MANAGED_LABEL, PortTable};
pub use endpoint::{Endpoint, EndpointRouter, FallbackResolver, SERVICE_PORTS};
pub use settings::{
    Credentials, OBJECT_STORAGE_SERVICE, Settings, StackConfig, StackOption, with_credentials,
    with_host, with_image, with_region, with_services,
};
pub use traits::ContainerRuntime;
