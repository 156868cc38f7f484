pub mod resolver;

pub use resolver::{MetadataResolver, resolve_type_instance_metadata, unresolved_type_instance_ids};
