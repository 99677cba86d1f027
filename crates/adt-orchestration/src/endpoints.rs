//! # Endpoint Table
//!
//! Where each object kind lives on the remote system and what its creation
//! document looks like. This is the only place that knows URI layouts; the
//! executors render requests from it and nothing else.

use adt_shared::{xml, ObjectDescriptor, ObjectKind, ObjectPayload};

const ADTCORE_NS: &str = "http://www.sap.com/adt/core";

/// Static per-kind endpoint data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindEndpoint {
    /// Collection URI new objects are POSTed to
    pub collection: &'static str,
    /// Qualified root element of the creation document
    pub root_element: &'static str,
    pub namespace: &'static str,
    /// Name validation service
    pub validation: &'static str,
    /// Whether the object has a `/source/main` include
    pub has_source: bool,
    pub checkable: bool,
    pub activatable: bool,
}

impl KindEndpoint {
    const fn source(
        collection: &'static str,
        root_element: &'static str,
        namespace: &'static str,
        validation: &'static str,
    ) -> Self {
        Self {
            collection,
            root_element,
            namespace,
            validation,
            has_source: true,
            checkable: true,
            activatable: true,
        }
    }

    const fn metadata(
        collection: &'static str,
        root_element: &'static str,
        namespace: &'static str,
        validation: &'static str,
    ) -> Self {
        Self {
            collection,
            root_element,
            namespace,
            validation,
            has_source: false,
            checkable: true,
            activatable: true,
        }
    }

    /// Namespace prefix of the root element.
    pub fn prefix(&self) -> &'static str {
        self.root_element
            .split_once(':')
            .map_or(self.root_element, |(prefix, _)| prefix)
    }
}

pub fn endpoint(kind: ObjectKind) -> KindEndpoint {
    match kind {
        ObjectKind::Class => KindEndpoint::source(
            "/sap/bc/adt/oo/classes",
            "class:abapClass",
            "http://www.sap.com/adt/oo/classes",
            "/sap/bc/adt/oo/validation/objectname",
        ),
        ObjectKind::Interface => KindEndpoint::source(
            "/sap/bc/adt/oo/interfaces",
            "intf:abapInterface",
            "http://www.sap.com/adt/oo/interfaces",
            "/sap/bc/adt/oo/validation/objectname",
        ),
        ObjectKind::Program => KindEndpoint::source(
            "/sap/bc/adt/programs/programs",
            "program:abapProgram",
            "http://www.sap.com/adt/programs/programs",
            "/sap/bc/adt/programs/validation",
        ),
        ObjectKind::Include => KindEndpoint::source(
            "/sap/bc/adt/programs/includes",
            "include:abapInclude",
            "http://www.sap.com/adt/programs/includes",
            "/sap/bc/adt/includes/validation",
        ),
        ObjectKind::FunctionGroup => KindEndpoint::source(
            "/sap/bc/adt/functions/groups",
            "group:abapFunctionGroup",
            "http://www.sap.com/adt/functions/groups",
            "/sap/bc/adt/functions/validation",
        ),
        // Collection is nested under the parent group, see `collection_uri`
        ObjectKind::FunctionModule => KindEndpoint::source(
            "/sap/bc/adt/functions/groups",
            "fmodule:abapFunctionModule",
            "http://www.sap.com/adt/functions/fmodules",
            "/sap/bc/adt/functions/validation",
        ),
        ObjectKind::Table => KindEndpoint::source(
            "/sap/bc/adt/ddic/tables",
            "blue:blueSource",
            "http://www.sap.com/wbobj/blue",
            "/sap/bc/adt/ddic/tables/validation",
        ),
        ObjectKind::Structure => KindEndpoint::source(
            "/sap/bc/adt/ddic/structures",
            "blue:blueSource",
            "http://www.sap.com/wbobj/blue",
            "/sap/bc/adt/ddic/structures/validation",
        ),
        ObjectKind::View => KindEndpoint::source(
            "/sap/bc/adt/ddic/ddl/sources",
            "ddl:ddlSource",
            "http://www.sap.com/adt/ddic/ddlsources",
            "/sap/bc/adt/ddic/ddl/validation",
        ),
        ObjectKind::Domain => KindEndpoint::metadata(
            "/sap/bc/adt/ddic/domains",
            "doma:domain",
            "http://www.sap.com/dictionary/domain",
            "/sap/bc/adt/ddic/domains/validation",
        ),
        ObjectKind::DataElement => KindEndpoint::metadata(
            "/sap/bc/adt/ddic/dataelements",
            "blue:wbobj",
            "http://www.sap.com/wbobj/dictionary/dtel",
            "/sap/bc/adt/ddic/dataelements/validation",
        ),
        ObjectKind::Package => KindEndpoint {
            checkable: false,
            activatable: false,
            ..KindEndpoint::metadata(
                "/sap/bc/adt/packages",
                "pak:package",
                "http://www.sap.com/adt/packages",
                "/sap/bc/adt/packages/validation",
            )
        },
        ObjectKind::BehaviorDefinition => KindEndpoint::source(
            "/sap/bc/adt/bo/behaviordefinitions",
            "blue:blueSource",
            "http://www.sap.com/wbobj/blue",
            "/sap/bc/adt/bo/behaviordefinitions/validation",
        ),
        ObjectKind::MetadataExtension => KindEndpoint::source(
            "/sap/bc/adt/ddic/ddlx/sources",
            "ddlxsources:ddlxSource",
            "http://www.sap.com/adt/ddic/ddlxsources",
            "/sap/bc/adt/ddic/ddlx/sources/validation",
        ),
        ObjectKind::ServiceDefinition => KindEndpoint::source(
            "/sap/bc/adt/ddic/srvd/sources",
            "srvd:srvdSource",
            "http://www.sap.com/adt/ddic/srvdsources",
            "/sap/bc/adt/ddic/srvd/sources/validation",
        ),
    }
}

/// Percent-encode one path segment. Namespaced names (`/DMO/FOO`) keep their
/// slashes encoded.
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Collection the object is created in.
pub fn collection_uri(descriptor: &ObjectDescriptor) -> String {
    let endpoint = endpoint(descriptor.kind());
    match (descriptor.kind(), descriptor.parent_name()) {
        (ObjectKind::FunctionModule, Some(group)) => {
            format!("{}/{}/fmodules", endpoint.collection, encode_segment(group))
        }
        _ => endpoint.collection.to_string(),
    }
}

pub fn object_uri(descriptor: &ObjectDescriptor) -> String {
    format!(
        "{}/{}",
        collection_uri(descriptor),
        encode_segment(descriptor.name())
    )
}

pub fn source_uri(descriptor: &ObjectDescriptor) -> String {
    format!("{}/source/main", object_uri(descriptor))
}

/// Creation (and metadata update) document for `descriptor`.
pub fn creation_document(descriptor: &ObjectDescriptor, payload: &ObjectPayload) -> String {
    let endpoint = endpoint(descriptor.kind());
    let prefix = endpoint.prefix();
    let description = payload
        .description
        .as_deref()
        .unwrap_or_else(|| descriptor.name());

    let mut attributes = format!(
        r#"xmlns:{prefix}="{ns}" xmlns:adtcore="{ADTCORE_NS}" adtcore:name="{name}" adtcore:type="{adt_type}" adtcore:description="{description}""#,
        ns = endpoint.namespace,
        name = xml::escape(descriptor.name()),
        adt_type = descriptor.kind().adt_type(),
        description = xml::escape(description),
    );
    if let Some(language) = payload.property_str("master_language") {
        attributes.push_str(&format!(
            r#" adtcore:masterLanguage="{}""#,
            xml::escape(language)
        ));
    }
    if let Some(responsible) = payload.property_str("responsible") {
        attributes.push_str(&format!(
            r#" adtcore:responsible="{}""#,
            xml::escape(responsible)
        ));
    }

    let mut children = String::new();
    if let Some(package) = descriptor.package_name() {
        children.push_str(&format!(
            r#"<adtcore:packageRef adtcore:name="{}"/>"#,
            xml::escape(package)
        ));
    }
    if let (ObjectKind::FunctionModule, Some(group)) = (descriptor.kind(), descriptor.parent_name()) {
        children.push_str(&format!(
            r#"<adtcore:containerRef adtcore:name="{name}" adtcore:type="{group_type}" adtcore:uri="{uri}/{segment}"/>"#,
            name = xml::escape(group),
            group_type = ObjectKind::FunctionGroup.adt_type(),
            uri = endpoint.collection,
            segment = encode_segment(group),
        ));
    }
    if let Some(super_package) = descriptor.super_package() {
        children.push_str(&format!(
            r#"<pak:superPackage adtcore:name="{}"/>"#,
            xml::escape(super_package)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><{root} {attributes}>{children}</{root}>"#,
        root = endpoint.root_element,
    )
}

/// Check-run request body for one object.
pub fn check_run_document(descriptor: &ObjectDescriptor) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><chkrun:checkObjectList xmlns:chkrun="http://www.sap.com/adt/checkrun" xmlns:adtcore="{ADTCORE_NS}"><chkrun:checkObject adtcore:uri="{uri}" chkrun:version="inactive"/></chkrun:checkObjectList>"#,
        uri = object_uri(descriptor),
    )
}

/// Activation request body for one object.
pub fn activation_document(descriptor: &ObjectDescriptor) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><adtcore:objectReferences xmlns:adtcore="{ADTCORE_NS}"><adtcore:objectReference adtcore:uri="{uri}" adtcore:name="{name}"/></adtcore:objectReferences>"#,
        uri = object_uri(descriptor),
        name = xml::escape(descriptor.name()),
    )
}
