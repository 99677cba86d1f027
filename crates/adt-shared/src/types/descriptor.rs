//! Object kinds and descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AdtError;

/// Development object categories with an identical lifecycle shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Class,
    Program,
    Interface,
    FunctionGroup,
    FunctionModule,
    Include,
    Table,
    Structure,
    View,
    Domain,
    DataElement,
    Package,
    BehaviorDefinition,
    MetadataExtension,
    ServiceDefinition,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 15] = [
        ObjectKind::Class,
        ObjectKind::Program,
        ObjectKind::Interface,
        ObjectKind::FunctionGroup,
        ObjectKind::FunctionModule,
        ObjectKind::Include,
        ObjectKind::Table,
        ObjectKind::Structure,
        ObjectKind::View,
        ObjectKind::Domain,
        ObjectKind::DataElement,
        ObjectKind::Package,
        ObjectKind::BehaviorDefinition,
        ObjectKind::MetadataExtension,
        ObjectKind::ServiceDefinition,
    ];

    /// Stable snake_case tag used at the tool boundary.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Program => "program",
            Self::Interface => "interface",
            Self::FunctionGroup => "function_group",
            Self::FunctionModule => "function_module",
            Self::Include => "include",
            Self::Table => "table",
            Self::Structure => "structure",
            Self::View => "view",
            Self::Domain => "domain",
            Self::DataElement => "data_element",
            Self::Package => "package",
            Self::BehaviorDefinition => "behavior_definition",
            Self::MetadataExtension => "metadata_extension",
            Self::ServiceDefinition => "service_definition",
        }
    }

    /// ADT object type code (`adtcore:type`).
    pub fn adt_type(self) -> &'static str {
        match self {
            Self::Class => "CLAS/OC",
            Self::Program => "PROG/P",
            Self::Interface => "INTF/OI",
            Self::FunctionGroup => "FUGR/F",
            Self::FunctionModule => "FUGR/FF",
            Self::Include => "PROG/I",
            Self::Table => "TABL/DT",
            Self::Structure => "TABL/DS",
            Self::View => "DDLS/DF",
            Self::Domain => "DOMA/DD",
            Self::DataElement => "DTEL/DE",
            Self::Package => "DEVC/K",
            Self::BehaviorDefinition => "BDEF/BDO",
            Self::MetadataExtension => "DDLX/EX",
            Self::ServiceDefinition => "SRVD/SRV",
        }
    }

    /// Kinds that live inside a container object and need a parent name.
    pub fn requires_parent(self) -> bool {
        matches!(self, Self::FunctionModule)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ObjectKind {
    type Err = AdtError;

    /// Accepts the snake_case tag or the ADT type code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.tag().eq_ignore_ascii_case(needle) || kind.adt_type().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| AdtError::UnknownObjectKind(needle.to_string()))
    }
}

/// Identity of one development object.
///
/// Names are uppercased on construction and on deserialization; no code path
/// can observe a lowercase object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawObjectDescriptor")]
pub struct ObjectDescriptor {
    kind: ObjectKind,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    super_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transport_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_name: Option<String>,
}

#[derive(Deserialize)]
struct RawObjectDescriptor {
    kind: ObjectKind,
    name: String,
    package_name: Option<String>,
    super_package: Option<String>,
    transport_request: Option<String>,
    parent_name: Option<String>,
}

impl From<RawObjectDescriptor> for ObjectDescriptor {
    fn from(raw: RawObjectDescriptor) -> Self {
        Self {
            kind: raw.kind,
            name: normalize(&raw.name),
            package_name: raw.package_name.as_deref().map(normalize),
            super_package: raw.super_package.as_deref().map(normalize),
            transport_request: raw.transport_request.as_deref().map(normalize),
            parent_name: raw.parent_name.as_deref().map(normalize),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

impl ObjectDescriptor {
    pub fn new(kind: ObjectKind, name: impl AsRef<str>) -> Self {
        Self {
            kind,
            name: normalize(name.as_ref()),
            package_name: None,
            super_package: None,
            transport_request: None,
            parent_name: None,
        }
    }

    pub fn with_package(mut self, package_name: impl AsRef<str>) -> Self {
        self.package_name = Some(normalize(package_name.as_ref()));
        self
    }

    pub fn with_super_package(mut self, super_package: impl AsRef<str>) -> Self {
        self.super_package = Some(normalize(super_package.as_ref()));
        self
    }

    pub fn with_transport_request(mut self, transport_request: impl AsRef<str>) -> Self {
        self.transport_request = Some(normalize(transport_request.as_ref()));
        self
    }

    pub fn with_parent(mut self, parent_name: impl AsRef<str>) -> Self {
        self.parent_name = Some(normalize(parent_name.as_ref()));
        self
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn super_package(&self) -> Option<&str> {
        self.super_package.as_deref()
    }

    pub fn transport_request(&self) -> Option<&str> {
        self.transport_request.as_deref()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    /// Structural checks that need no remote call.
    pub fn validate(&self) -> Result<(), AdtError> {
        if self.name.is_empty() {
            return Err(AdtError::invalid_input("object name must not be empty"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(AdtError::invalid_input(format!(
                "object name '{}' must not contain whitespace",
                self.name
            )));
        }
        if self.kind.requires_parent() && self.parent_name.is_none() {
            return Err(AdtError::invalid_input(format!(
                "{} '{}' requires a parent name",
                self.kind, self.name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent_name {
            Some(parent) => write!(f, "{} {}/{}", self.kind, parent, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}
