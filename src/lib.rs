//! Interaction engine for SysML/KerML diagram editing: selection, dragging,
//! resizing, relationship drawing, alignment and undo over a typed diagram
//! model, independent of any rendering toolkit.

pub mod align;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod menu;
pub mod model;
pub mod selection;
pub mod store;

pub use align::{AlignDirection, DistributeAxis};
pub use config::EngineConfig;
pub use engine::{Engine, PendingRelationship, Snapshot};
pub use error::{ConfigError, EndpointProblem, EngineError};
pub use events::{DiagramEvent, SubscriptionId};
pub use interaction::{InteractionMode, ModeTag, Modifiers, PointerTarget, ResizeHandle, Viewport};
pub use menu::{ContextMenu, MenuAction, MenuEntry};
pub use model::{
    Diagram, DiagramId, DiagramKind, Element, ElementId, ElementType, ElementUpdate, LineStyle,
    Position, Project, Rect, Relationship, RelationshipId, RelationshipStyle, RelationshipType,
    RelationshipUpdate, Size,
};
pub use selection::Selection;
