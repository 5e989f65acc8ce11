use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use eframe::egui;
use sysml_canvas::{ContextMenu, DiagramEvent, Engine, Modifiers, Position, Project, Viewport};

mod render;
mod settings;
mod update;

/// Context menu currently shown, with its filter text.
struct OpenMenu {
    menu: ContextMenu,
    screen: egui::Pos2,
    query: String,
    focus_requested: bool,
}

pub struct CanvasApp {
    engine: Engine,
    menu: Option<OpenMenu>,
    /// Last notification worth showing, written by the engine subscription.
    status: Rc<RefCell<Option<String>>>,
    settings_path: Option<PathBuf>,
    /// Canvas-local pointer position seen last frame while over the canvas.
    last_pointer: Option<Position>,
    canvas_size: egui::Vec2,
}

impl CanvasApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = settings::config_path();
        let config = settings::load_config(settings_path.as_deref());
        let mut engine = Engine::init(Project::new("Untitled Project"), config);

        let status = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&status);
        engine.subscribe(move |event| {
            if let Some(text) = describe(event) {
                *sink.borrow_mut() = Some(text);
            }
        });

        Self {
            engine,
            menu: None,
            status,
            settings_path,
            last_pointer: None,
            canvas_size: egui::Vec2::ZERO,
        }
    }

    fn set_status(&self, text: impl Into<String>) {
        *self.status.borrow_mut() = Some(text.into());
    }
}

fn describe(event: &DiagramEvent) -> Option<String> {
    let text = match event {
        DiagramEvent::ElementAdded(id) => format!("Added {id}"),
        DiagramEvent::ElementRemoved(id) => format!("Removed {id}"),
        DiagramEvent::RelationshipAdded(id) => format!("Connected {id}"),
        DiagramEvent::RelationshipRemoved(id) => format!("Removed {id}"),
        DiagramEvent::DiagramChanged(id) => format!("Switched to {id}"),
        DiagramEvent::ViewportChanged { scale } => format!("Zoom {:.0}%", scale * 100.0),
        DiagramEvent::ElementUpdated(_)
        | DiagramEvent::RelationshipUpdated(_)
        | DiagramEvent::SelectionChanged => return None,
    };
    Some(text)
}

/// Screen position relative to the canvas origin.
fn to_local(origin: egui::Pos2, screen: egui::Pos2) -> Position {
    Position::new(screen.x - origin.x, screen.y - origin.y)
}

fn to_screen(origin: egui::Pos2, viewport: &Viewport, diagram: Position) -> egui::Pos2 {
    let p = viewport.to_screen(diagram);
    egui::pos2(origin.x + p.x, origin.y + p.y)
}

fn modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        ctrl: m.ctrl,
        alt: m.alt,
        command: m.command,
    }
}
