//! Directory of well-known DAK vocabularies and models

use dak_faq_types::{CanonicalType, KnownCanonical};
use std::sync::LazyLock;

/// DAK component types
pub const DAK_COMPONENT_TYPE_VALUE_SET: &str =
    "http://smart.who.int/base/ValueSet/DAKComponentType";

static KNOWN: LazyLock<Vec<KnownCanonical>> = LazyLock::new(|| {
    let entry = |url: &str, resource_type, title: &str, description: &str| KnownCanonical {
        url: url.to_string(),
        resource_type,
        title: title.to_string(),
        description: description.to_string(),
    };
    vec![
        entry(
            DAK_COMPONENT_TYPE_VALUE_SET,
            CanonicalType::ValueSet,
            "DAK Component Types",
            "The nine components of a Digital Adaptation Kit",
        ),
        entry(
            "http://smart.who.int/base/ValueSet/CDHIv1",
            CanonicalType::ValueSet,
            "Classification of Digital Health Interventions v1",
            "Digital health interventions a DAK requirement may reference",
        ),
        entry(
            "http://smart.who.int/base/ValueSet/CDSCv1",
            CanonicalType::ValueSet,
            "Classification of Digital Health System Categories v1",
            "Categories of digital health systems",
        ),
        entry(
            "http://smart.who.int/base/StructureDefinition/DAK",
            CanonicalType::LogicalModel,
            "Digital Adaptation Kit",
            "Logical model of a DAK and its components",
        ),
        entry(
            "http://smart.who.int/base/StructureDefinition/GenericPersona",
            CanonicalType::LogicalModel,
            "Generic Persona",
            "Logical model of a generic persona",
        ),
        entry(
            "http://smart.who.int/base/StructureDefinition/Requirements",
            CanonicalType::LogicalModel,
            "Requirements",
            "Logical model of functional and non-functional requirements",
        ),
    ]
});

/// The built-in directory, in a fixed order
pub fn known_canonicals() -> &'static [KnownCanonical] {
    &KNOWN
}
