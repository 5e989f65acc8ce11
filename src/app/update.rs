use eframe::egui;
use log::warn;
use sysml_canvas::{
    AlignDirection, DiagramKind, DistributeAxis, ElementType, EngineError, MenuAction,
    PointerTarget, Position,
};

use super::{CanvasApp, OpenMenu, modifiers, render, to_local};

impl eframe::App for CanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);
        self.top_bar(ctx);
        self.palette_panel(ctx);
        self.history_panel(ctx);
        self.status_bar(ctx);
        self.canvas(ctx);
        self.context_menu(ctx);
    }
}

impl CanvasApp {
    fn report(&self, err: EngineError) {
        warn!(error:% = err; "Canvas action rejected");
        self.set_status(err.to_string());
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (redo, undo, cancel, delete) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z),
                i.consume_key(egui::Modifiers::NONE, egui::Key::Escape),
                i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                    || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace),
            )
        });
        if redo {
            self.engine.redo();
        } else if undo {
            self.engine.undo();
        }
        if cancel && self.menu.take().is_none() {
            self.engine.cancel_interaction();
        }
        if delete {
            self.engine.delete_selection();
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                self.diagram_picker(ui);
                ui.separator();

                if ui
                    .add_enabled(self.engine.can_undo(), egui::Button::new("Undo (⌘Z)"))
                    .clicked()
                {
                    self.engine.undo();
                }
                if ui
                    .add_enabled(self.engine.can_redo(), egui::Button::new("Redo (⌘⇧Z)"))
                    .clicked()
                {
                    self.engine.redo();
                }
                ui.separator();

                if ui.button("−").clicked() {
                    self.engine.zoom_out();
                }
                if ui
                    .button(format!("{:.0}%", self.engine.viewport().scale() * 100.0))
                    .on_hover_text("Reset zoom")
                    .clicked()
                {
                    self.engine.reset_zoom();
                }
                if ui.button("+").clicked() {
                    self.engine.zoom_in();
                }
                ui.separator();

                let selected = self.engine.selection().element_ids();
                ui.menu_button("Arrange", |ui| {
                    ui.add_enabled_ui(selected.len() >= 2, |ui| {
                        for direction in AlignDirection::ALL {
                            if ui.button(direction.label()).clicked() {
                                self.engine.align_elements(&selected, direction);
                                ui.close();
                            }
                        }
                    });
                    ui.separator();
                    ui.add_enabled_ui(selected.len() >= 3, |ui| {
                        if ui.button("Distribute horizontally").clicked() {
                            self.engine
                                .distribute_elements(&selected, DistributeAxis::Horizontal);
                            ui.close();
                        }
                        if ui.button("Distribute vertically").clicked() {
                            self.engine
                                .distribute_elements(&selected, DistributeAxis::Vertical);
                            ui.close();
                        }
                    });
                });
                let has_selection = !self.engine.selection().is_empty()
                    || self.engine.selection().relationship().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete"))
                    .clicked()
                {
                    self.engine.delete_selection();
                }
            });
        });
    }

    fn diagram_picker(&mut self, ui: &mut egui::Ui) {
        let active = self.engine.diagram().id;
        let mut chosen = None;
        egui::ComboBox::from_id_salt("diagram_picker")
            .selected_text(self.engine.diagram().name.clone())
            .show_ui(ui, |ui| {
                for diagram in &self.engine.project().diagrams {
                    if ui
                        .selectable_label(diagram.id == active, &diagram.name)
                        .clicked()
                    {
                        chosen = Some(diagram.id);
                    }
                }
            });
        if let Some(id) = chosen {
            self.engine.select_diagram(id);
        }
        if ui.small_button("New").clicked() {
            let name = format!("Diagram {}", self.engine.project().diagrams.len() + 1);
            self.engine.add_diagram(name, DiagramKind::default());
        }
        let removable = self.engine.project().diagrams.len() > 1;
        if ui
            .add_enabled(removable, egui::Button::new("Remove").small())
            .clicked()
        {
            self.engine.remove_diagram(active);
        }
    }

    fn palette_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("palette")
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Elements");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for &element_type in ElementType::SYSML {
                        if ui.button(element_type.name()).clicked() {
                            self.create_at_center(element_type);
                        }
                    }
                });
            });
    }

    /// New element centered in the visible part of the canvas.
    fn create_at_center(&mut self, element_type: ElementType) {
        let viewport = self.engine.viewport();
        let center = viewport.to_diagram(Position::new(
            self.canvas_size.x * 0.5,
            self.canvas_size.y * 0.5,
        ));
        let size = element_type.default_size();
        let origin = Position::new(center.x - size.width * 0.5, center.y - size.height * 0.5);
        self.engine
            .create_element(element_type, origin, None, None, None);
    }

    fn history_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("history")
            .default_width(180.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("History");
                    if ui.small_button("Clear").clicked() {
                        self.engine.clear_history();
                    }
                });
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (description, applied) in self.engine.history_entries() {
                        if applied {
                            ui.label(description);
                        } else {
                            ui.weak(description);
                        }
                    }
                });
            });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.status.borrow().as_deref() {
                    Some(status) => ui.label(status),
                    None => ui.label("Ready"),
                };
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &self.settings_path {
                        Some(path) => ui.weak(path.display().to_string()),
                        None => ui.weak("default settings"),
                    };
                    ui.separator();
                    ui.label(format!("Mode: {}", self.engine.mode().tag()));
                    ui.separator();
                    ui.label(format!("Objects: {}", self.engine.diagram().elements.len()));
                    ui.separator();
                    ui.label(format!("Selected: {}", self.engine.selection().len()));
                });
            });
        });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.canvas_size = rect.size();
                let origin = rect.min;

                let (pointer, pressed, released, mods, scroll) = ctx.input(|i| {
                    (
                        i.pointer.latest_pos(),
                        i.pointer.primary_pressed(),
                        i.pointer.primary_released(),
                        modifiers(i.modifiers),
                        i.raw_scroll_delta,
                    )
                });
                let inside = response.contains_pointer();

                if inside && scroll != egui::Vec2::ZERO {
                    if mods.command {
                        self.engine.on_wheel(-scroll.y, mods);
                    } else {
                        let s = self.engine.viewport().scroll();
                        self.engine
                            .set_scroll(Position::new(s.x - scroll.x, s.y - scroll.y));
                    }
                }

                match pointer.map(|p| to_local(origin, p)) {
                    Some(local) if inside => {
                        if self.last_pointer != Some(local) {
                            let target = self.engine.hit_test(local);
                            self.engine.on_pointer_move(local, mods, target);
                        }
                        if pressed && self.menu.take().is_none() {
                            let target = self.engine.hit_test(local);
                            if let Err(err) = self.engine.on_pointer_down(local, mods, target) {
                                self.report(err);
                            }
                        }
                        if released {
                            let target = self.engine.hit_test(local);
                            self.engine.on_pointer_up(local, mods, target);
                        }
                        self.last_pointer = Some(local);
                    }
                    _ => {
                        if let Some(last) = self.last_pointer.take() {
                            self.engine
                                .on_pointer_leave(last, mods, PointerTarget::Canvas);
                        }
                    }
                }

                if response.secondary_clicked()
                    && let Some(screen) = pointer
                {
                    let local = to_local(origin, screen);
                    let element = match self.engine.hit_test(local) {
                        PointerTarget::Element(id) | PointerTarget::Handle(id, _) => Some(id),
                        PointerTarget::Canvas | PointerTarget::Relationship(_) => None,
                    };
                    self.menu = self
                        .engine
                        .on_context_menu(local, element)
                        .map(|menu| OpenMenu {
                            menu,
                            screen,
                            query: String::new(),
                            focus_requested: false,
                        });
                }

                let painter = ui.painter_at(rect);
                let snapshot = self.engine.snapshot();
                render::draw_background(&painter, rect, &snapshot.viewport);
                render::draw_relationships(&painter, origin, &self.engine, &snapshot);
                render::draw_elements(&painter, origin, &snapshot);
                render::draw_overlays(&painter, origin, &snapshot, self.engine.config().handle_size);
            });
    }

    fn context_menu(&mut self, ctx: &egui::Context) {
        let Some(mut open) = self.menu.take() else {
            return;
        };
        let mut chosen: Option<MenuAction> = None;
        let mut close = false;
        egui::Area::new(egui::Id::new("context_menu"))
            .order(egui::Order::Foreground)
            .fixed_pos(open.screen)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(200.0);
                    let filter =
                        ui.add(egui::TextEdit::singleline(&mut open.query).hint_text("Filter"));
                    if !open.focus_requested {
                        filter.request_focus();
                        open.focus_requested = true;
                    }
                    ui.separator();
                    let matches = open.menu.matching(&open.query);
                    egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                        for entry in &matches {
                            if ui.button(&entry.label).clicked() {
                                chosen = Some(entry.action);
                            }
                        }
                        if matches.is_empty() {
                            ui.weak("No matches");
                        }
                    });
                    let (enter, escape) = ui.input(|i| {
                        (i.key_pressed(egui::Key::Enter), i.key_pressed(egui::Key::Escape))
                    });
                    if enter && chosen.is_none() {
                        chosen = matches.first().map(|entry| entry.action);
                    }
                    close = escape;
                });
            });

        if let Some(action) = chosen {
            if let Err(err) = self.engine.choose(action) {
                self.report(err);
            }
        } else if !close {
            self.menu = Some(open);
        }
    }
}
