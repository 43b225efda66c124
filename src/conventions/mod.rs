//! Convention-based model building: scanners, binder, mapper and assembler.

pub mod catalog;
pub mod model_assembler;
pub mod model_mapper;
pub mod navigation_binder;
pub mod operation_scanner;
pub mod property_scanner;

pub use catalog::{ConventionCatalog, FacetProperty};
pub use model_assembler::{
    AssembledModel, ModelAssembler, ModelContext, ModelExtender, ModelPreparer, ModelProvider,
    RegisteredModelExtender,
};
pub use model_mapper::{ConventionModelMapper, ModelMapper, ModelMapperChain};
pub use navigation_binder::NavigationBinder;
pub use operation_scanner::{attach_operations, OperationDescriptor, OperationScanner};
pub use property_scanner::{PropertyDescriptor, PropertyKind, PropertyScan, PropertyScanner};
