pub mod builder;
pub mod config;
pub mod declared_type;
pub mod errors;
pub mod host_registry;
pub mod model;

// Re-export commonly used types
pub use builder::ModelBuilder;
pub use config::{
    DocumentStoreDefinition, EnumTypeDefinition, FacetRegistration, HostCatalogConfig,
    HostTypeDefinition, MethodDefinition, ModelRegistrationDefinition, OperationMarker,
    ParameterDefinition, PropertyDefinition, StructuralKind, StructuralPropertyDefinition,
    StructuralTypeDefinition, Visibility,
};
pub use declared_type::{DeclaredType, PrimitiveKind};
pub use errors::{ModelCatalogError, ModelCatalogResult};
pub use host_registry::HostTypeRegistry;
pub use model::{
    EntitySetDescriptor, EnumTypeDescriptor, FacetOrigin, FacetRef, Model, ModelOperation,
    NavigationBindingDescriptor, NavigationProperty, OperationBinding, OperationKind,
    OperationParameter, ReturnShape, SingletonDescriptor, StructuralProperty, TypeDescriptor,
};
