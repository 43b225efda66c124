use crate::model_catalog::{FacetRef, ModelBuilder, NavigationBindingDescriptor};

/// Resolves navigation property targets against the facets of the model
pub struct NavigationBinder;

impl NavigationBinder {
    /// Bind every unambiguous navigation property; returns the number of new bindings.
    ///
    /// Entity sets are visited before singletons. For each facet the element
    /// type's ancestors (root first), the type itself and then its descendants
    /// are visited. A property is bound only when exactly one facet of the
    /// required kind has the related type as its element type.
    pub fn bind(builder: &mut ModelBuilder<'_>) -> usize {
        let facets: Vec<(FacetRef, String)> = builder
            .entity_sets()
            .iter()
            .map(|s| (FacetRef::EntitySet(s.name.clone()), s.element_type.clone()))
            .chain(
                builder
                    .singletons()
                    .iter()
                    .map(|s| (FacetRef::Singleton(s.name.clone()), s.type_name.clone())),
            )
            .collect();

        let mut added = 0;
        for (source, element_type) in facets {
            let mut related_types = builder.ancestors(&element_type);
            related_types.reverse();
            related_types.push(element_type.clone());
            related_types.extend(builder.derived_types(&element_type));

            for declaring_type in related_types {
                for navigation in builder.navigation_properties(&declaring_type) {
                    if builder.has_binding(&source, &declaring_type, &navigation.name) {
                        continue;
                    }

                    let candidates: Vec<FacetRef> = if navigation.singleton_target {
                        builder
                            .singletons()
                            .iter()
                            .filter(|s| s.type_name == navigation.target_type)
                            .map(|s| FacetRef::Singleton(s.name.clone()))
                            .collect()
                    } else {
                        builder
                            .entity_sets()
                            .iter()
                            .filter(|s| s.element_type == navigation.target_type)
                            .map(|s| FacetRef::EntitySet(s.name.clone()))
                            .collect()
                    };

                    match <[FacetRef; 1]>::try_from(candidates) {
                        Ok([target]) => {
                            log::debug!(
                                "Binding {}.{} on {} to {}",
                                declaring_type,
                                navigation.name,
                                source,
                                target
                            );
                            builder.add_binding(NavigationBindingDescriptor {
                                source: source.clone(),
                                declaring_type: declaring_type.clone(),
                                navigation_property: navigation.name.clone(),
                                target,
                            });
                            added += 1;
                        }
                        Err(candidates) => log::debug!(
                            "Leaving {}.{} on {} unbound: {} candidate target(s)",
                            declaring_type,
                            navigation.name,
                            source,
                            candidates.len()
                        ),
                    }
                }
            }
        }
        added
    }
}
