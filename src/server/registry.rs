//! Resource registry collecting the routes of every resource

use axum::Router;
use std::collections::BTreeMap;

/// Trait that describes how to build routes for a resource
///
/// Each resource (items, customers, invoices, ...) implements this trait to
/// provide its routes, with its state already attached.
pub trait ResourceDescriptor: Send + Sync {
    /// The resource name (e.g., "invoices")
    fn name(&self) -> &str;

    /// Build the routes for this resource
    fn build_routes(&self) -> Router;
}

/// Registry for all resources in the application
#[derive(Default)]
pub struct ResourceRegistry {
    descriptors: BTreeMap<String, Box<dyn ResourceDescriptor>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource descriptor
    ///
    /// Registering a second descriptor under the same name replaces the first.
    pub fn register(&mut self, descriptor: Box<dyn ResourceDescriptor>) {
        let name = descriptor.name().to_string();
        self.descriptors.insert(name, descriptor);
    }

    /// Merge the routes of every registered resource
    pub fn build_routes(&self) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                router.merge(descriptor.build_routes())
            })
    }

    /// Registered resource names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}
