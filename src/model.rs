use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(ElementId, "E");
id_type!(RelationshipId, "R");
id_type!(DiagramId, "D");

/// A point in diagram space (unscaled).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Position) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Position) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle stored as min/max corners.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub min: Position,
    pub max: Position,
}

impl Rect {
    /// Builds a rectangle from two arbitrary corners, swapping so that `min <= max`.
    pub fn from_min_max(a: Position, b: Position) -> Self {
        Self {
            min: Position::new(a.x.min(b.x), a.y.min(b.y)),
            max: Position::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_origin_size(origin: Position, size: Size) -> Self {
        Self::from_min_max(
            origin,
            Position::new(origin.x + size.width, origin.y + size.height),
        )
    }

    pub fn left(self) -> f32 {
        self.min.x
    }

    pub fn right(self) -> f32 {
        self.max.x
    }

    pub fn top(self) -> f32 {
        self.min.y
    }

    pub fn bottom(self) -> f32 {
        self.max.y
    }

    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(self) -> Position {
        Position::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn contains(self, p: Position) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    // KerML
    Element,
    Feature,
    Type,
    Classifier,
    Class,
    DataType,
    Association,
    Connector,
    Relationship,
    Specialization,
    Redefinition,
    Subsetting,
    Conjugation,
    FeatureTyping,
    // SysML v2
    Part,
    PortDefinition,
    PortUsage,
    InterfaceDefinition,
    ItemFlow,
    Action,
    State,
    Requirement,
    ViewDefinition,
    ViewUsage,
    ViewpointDefinition,
    Package,
    ConstraintBlock,
    ConstraintProperty,
    ValueProperty,
}

impl ElementType {
    pub const SYSML: &'static [ElementType] = &[
        ElementType::Part,
        ElementType::PortDefinition,
        ElementType::PortUsage,
        ElementType::InterfaceDefinition,
        ElementType::ItemFlow,
        ElementType::Action,
        ElementType::State,
        ElementType::Requirement,
        ElementType::ViewDefinition,
        ElementType::ViewUsage,
        ElementType::ViewpointDefinition,
        ElementType::Package,
        ElementType::ConstraintBlock,
        ElementType::ConstraintProperty,
        ElementType::ValueProperty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Element => "Element",
            ElementType::Feature => "Feature",
            ElementType::Type => "Type",
            ElementType::Classifier => "Classifier",
            ElementType::Class => "Class",
            ElementType::DataType => "DataType",
            ElementType::Association => "Association",
            ElementType::Connector => "Connector",
            ElementType::Relationship => "Relationship",
            ElementType::Specialization => "Specialization",
            ElementType::Redefinition => "Redefinition",
            ElementType::Subsetting => "Subsetting",
            ElementType::Conjugation => "Conjugation",
            ElementType::FeatureTyping => "FeatureTyping",
            ElementType::Part => "Part",
            ElementType::PortDefinition => "PortDefinition",
            ElementType::PortUsage => "PortUsage",
            ElementType::InterfaceDefinition => "InterfaceDefinition",
            ElementType::ItemFlow => "ItemFlow",
            ElementType::Action => "Action",
            ElementType::State => "State",
            ElementType::Requirement => "Requirement",
            ElementType::ViewDefinition => "ViewDefinition",
            ElementType::ViewUsage => "ViewUsage",
            ElementType::ViewpointDefinition => "ViewpointDefinition",
            ElementType::Package => "Package",
            ElementType::ConstraintBlock => "ConstraintBlock",
            ElementType::ConstraintProperty => "ConstraintProperty",
            ElementType::ValueProperty => "ValueProperty",
        }
    }

    pub fn default_size(self) -> Size {
        match self {
            ElementType::Part | ElementType::Class | ElementType::Feature => Size::new(180.0, 120.0),
            ElementType::Requirement => Size::new(200.0, 100.0),
            ElementType::Package => Size::new(220.0, 160.0),
            ElementType::Action | ElementType::State | ElementType::InterfaceDefinition => {
                Size::new(160.0, 100.0)
            }
            ElementType::PortDefinition => Size::new(140.0, 80.0),
            _ => Size::new(160.0, 80.0),
        }
    }

    pub fn default_properties(self) -> BTreeMap<String, String> {
        let pairs: &[(&str, &str)] = match self {
            ElementType::Part => &[
                ("isAbstract", "false"),
                ("multiplicity", "1"),
                ("isPortion", "false"),
            ],
            ElementType::Requirement => &[("reqId", ""), ("priority", "Medium")],
            ElementType::State => &[("isInitial", "false"), ("isFinal", "false")],
            ElementType::Action => &[("duration", ""), ("isStream", "false")],
            ElementType::PortDefinition | ElementType::PortUsage => {
                &[("isConjugated", "false"), ("direction", "inout")]
            }
            _ => &[],
        };
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    Specialization,
    Dependency,
    Containment,
    Reference,
    Subsetting,
    Redefinition,
    Binding,
    ItemFlowConnection,
    Satisfy,
    Verify,
    Allocate,
}

impl RelationshipType {
    pub const ALL: &'static [RelationshipType] = &[
        RelationshipType::Specialization,
        RelationshipType::Dependency,
        RelationshipType::Containment,
        RelationshipType::Reference,
        RelationshipType::Subsetting,
        RelationshipType::Redefinition,
        RelationshipType::Binding,
        RelationshipType::ItemFlowConnection,
        RelationshipType::Satisfy,
        RelationshipType::Verify,
        RelationshipType::Allocate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RelationshipType::Specialization => "Specialization",
            RelationshipType::Dependency => "Dependency",
            RelationshipType::Containment => "Containment",
            RelationshipType::Reference => "Reference",
            RelationshipType::Subsetting => "Subsetting",
            RelationshipType::Redefinition => "Redefinition",
            RelationshipType::Binding => "Binding",
            RelationshipType::ItemFlowConnection => "ItemFlowConnection",
            RelationshipType::Satisfy => "Satisfy",
            RelationshipType::Verify => "Verify",
            RelationshipType::Allocate => "Allocate",
        }
    }

    /// Line style a renderer uses when the relationship carries no override.
    pub fn default_line_style(self) -> LineStyle {
        match self {
            RelationshipType::Dependency
            | RelationshipType::Satisfy
            | RelationshipType::Verify
            | RelationshipType::Allocate
            | RelationshipType::Reference => LineStyle::Dashed,
            _ => LineStyle::Solid,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipStyle {
    #[serde(default)]
    pub line_style: Option<LineStyle>,
    #[serde(default)]
    pub line_color: Option<String>,
    #[serde(default)]
    pub line_width: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub stereotype: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Element {
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Position {
        self.bounds().center()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<Position>,
    #[serde(default)]
    pub properties: Option<RelationshipStyle>,
}

impl Relationship {
    pub fn touches(&self, element: ElementId) -> bool {
        self.source_id == element || self.target_id == element
    }

    pub fn line_style(&self) -> LineStyle {
        self.properties
            .as_ref()
            .and_then(|p| p.line_style)
            .unwrap_or_else(|| self.relationship_type.default_line_style())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DiagramKind {
    #[default]
    Structure,
    Behavior,
    Requirement,
    Parametric,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: DiagramId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: DiagramKind,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Diagram {
    pub fn new(id: DiagramId, name: impl Into<String>, kind: DiagramKind) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            kind,
            elements: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn has_element(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn element_index(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    pub(crate) fn relationship_index(&self, id: RelationshipId) -> Option<usize> {
        self.relationships.iter().position(|r| r.id == id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub diagrams: Vec<Diagram>,
}

impl Project {
    /// A project with a single empty structure diagram.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 1,
            name: name.into(),
            description: None,
            diagrams: vec![Diagram::new(
                DiagramId(1),
                "Main Diagram",
                DiagramKind::Structure,
            )],
        }
    }

    pub fn diagram(&self, id: DiagramId) -> Option<&Diagram> {
        self.diagrams.iter().find(|d| d.id == id)
    }

    /// Largest numeric id used by any diagram, element or relationship.
    pub(crate) fn max_id(&self) -> u64 {
        let mut max = 0;
        for diagram in &self.diagrams {
            max = max.max(diagram.id.0);
            for e in &diagram.elements {
                max = max.max(e.id.0);
            }
            for r in &diagram.relationships {
                max = max.max(r.id.0);
            }
        }
        max
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("New Project")
    }
}

/// Field-wise merge for an [`Element`]. `None` leaves a field untouched; the
/// nested options on optional fields allow clearing them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub stereotype: Option<Option<String>>,
    pub properties: Option<BTreeMap<String, String>>,
}

impl ElementUpdate {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn geometry(position: Position, size: Size) -> Self {
        Self {
            position: Some(position),
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, element: &mut Element) {
        if let Some(name) = &self.name {
            element.name = name.clone();
        }
        if let Some(description) = &self.description {
            element.description = description.clone();
        }
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(size) = self.size {
            element.size = size;
        }
        if let Some(stereotype) = &self.stereotype {
            element.stereotype = stereotype.clone();
        }
        if let Some(properties) = &self.properties {
            element.properties = properties.clone();
        }
    }
}

/// Field-wise merge for a [`Relationship`]. Endpoints are not editable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationshipUpdate {
    pub relationship_type: Option<RelationshipType>,
    pub name: Option<Option<String>>,
    pub label: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub waypoints: Option<Vec<Position>>,
    pub properties: Option<Option<RelationshipStyle>>,
}

impl RelationshipUpdate {
    pub fn apply_to(&self, relationship: &mut Relationship) {
        if let Some(t) = self.relationship_type {
            relationship.relationship_type = t;
        }
        if let Some(name) = &self.name {
            relationship.name = name.clone();
        }
        if let Some(label) = &self.label {
            relationship.label = label.clone();
        }
        if let Some(description) = &self.description {
            relationship.description = description.clone();
        }
        if let Some(waypoints) = &self.waypoints {
            relationship.waypoints = waypoints.clone();
        }
        if let Some(properties) = &self.properties {
            relationship.properties = properties.clone();
        }
    }
}
