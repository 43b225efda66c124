use serde::Serialize;

/// A host property backing a model facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetProperty {
    pub facet: String,
    /// Entity set element type or singleton value type
    pub element_type: String,
    pub is_static: bool,
}

/// Facet-backing host properties discovered by the convention pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConventionCatalog {
    pub host_type: String,
    pub entity_set_properties: Vec<FacetProperty>,
    pub singleton_properties: Vec<FacetProperty>,
}

impl ConventionCatalog {
    pub fn new(host_type: impl Into<String>) -> Self {
        ConventionCatalog {
            host_type: host_type.into(),
            ..Default::default()
        }
    }

    pub fn entity_set_property(&self, name: &str) -> Option<&FacetProperty> {
        self.entity_set_properties.iter().find(|p| p.facet == name)
    }

    pub fn singleton_property(&self, name: &str) -> Option<&FacetProperty> {
        self.singleton_properties.iter().find(|p| p.facet == name)
    }

    /// Element or value type of a facet backed by a host property
    pub fn element_type_of(&self, name: &str) -> Option<&str> {
        self.entity_set_property(name)
            .or_else(|| self.singleton_property(name))
            .map(|p| p.element_type.as_str())
    }
}
