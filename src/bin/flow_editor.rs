use std::fs;

use componentcraft::{
    available_screens, node_chrome, AreaSelector, EditorEvent, EditorOutcome, FlowEditorState,
    FlowSimulator, NodePosition, Project, ProjectDocument, Screen, ScreenFlow, SimulatorState,
    ViewMode,
};
use iced::widget::{
    button, canvas, column, container, pick_list, row, scrollable, text, text_input, Canvas,
    Column, Row,
};
use iced::{
    alignment, executor, keyboard, mouse, Application, Color, Command, Element, Length, Point,
    Rectangle, Renderer, Settings, Subscription, Theme, Vector,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NODE_WIDTH: f32 = 200.0;
const NODE_HEIGHT: f32 = 120.0;
const ANCHOR_RADIUS: f32 = 7.0;
const EDGE_HIT_DISTANCE: f32 = 6.0;
const GRID: f32 = 20.0;

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !prepare_display_env() {
        return Ok(());
    }

    FlowStudio::run(Settings {
        antialiasing: true,
        ..Settings::default()
    })
}

fn prepare_display_env() -> bool {
    #[derive(Copy, Clone, Debug)]
    enum Backend {
        Wayland,
        X11,
    }

    let wayland_display = std::env::var("WAYLAND_DISPLAY").ok();
    let x11_display = std::env::var("DISPLAY").ok();
    let backend_hint = std::env::var("COMPONENTCRAFT_BACKEND")
        .ok()
        .or_else(|| std::env::var("WINIT_UNIX_BACKEND").ok());

    let mut order = Vec::new();
    match backend_hint.as_deref() {
        Some("wayland") => order.push(Backend::Wayland),
        Some("x11") => order.push(Backend::X11),
        _ => {
            if wayland_display.is_some() && x11_display.is_some() {
                order.push(Backend::X11);
                order.push(Backend::Wayland);
                eprintln!(
                    "Both WAYLAND_DISPLAY and DISPLAY are set; defaulting to X11. \
                     Set COMPONENTCRAFT_BACKEND=wayland to force the Wayland backend."
                );
            } else if wayland_display.is_some() {
                order.push(Backend::Wayland);
            } else if x11_display.is_some() {
                order.push(Backend::X11);
            }
        }
    }

    if order.is_empty() {
        eprintln!(
            "No display found (neither DISPLAY nor WAYLAND_DISPLAY set). \
             Start an X11/Wayland session or run under Xvfb, e.g. \
             `Xvfb :99 -screen 0 1280x720x24 & DISPLAY=:99 cargo run --features gui --bin flow_editor`."
        );
        return false;
    }

    let mut errors: Vec<String> = Vec::new();
    for backend in order {
        match backend {
            Backend::Wayland => match wayland_display.as_deref() {
                Some(display) => match check_wayland(display) {
                    Ok(()) => return true,
                    Err(err) => errors.push(err),
                },
                None => errors
                    .push("Wayland backend requested but WAYLAND_DISPLAY is not set.".to_string()),
            },
            Backend::X11 => match x11_display.as_deref() {
                Some(display) => match check_x11(display) {
                    Ok(()) => {
                        std::env::remove_var("WAYLAND_DISPLAY");
                        return true;
                    }
                    Err(err) => errors.push(err),
                },
                None => errors.push("X11 backend selected but DISPLAY is not set.".to_string()),
            },
        }
    }

    for err in errors {
        eprintln!("{err}");
    }
    false
}

fn check_wayland(display: &str) -> Result<(), String> {
    let base = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/run/user/1000".to_string());
    let socket = std::path::Path::new(&base).join(display);
    if !socket.exists() {
        return Err(format!(
            "WAYLAND_DISPLAY is set ({display:?}) but no compositor socket found at {socket:?}. \
             Start a Wayland compositor or set COMPONENTCRAFT_BACKEND=x11."
        ));
    }
    if !has_client_lib(&["libwayland-client.so.0", "libwayland-client.so"]) {
        return Err(
            "Wayland libraries are missing (libwayland-client). Install them or set \
             COMPONENTCRAFT_BACKEND=x11."
                .to_string(),
        );
    }
    Ok(())
}

fn check_x11(display: &str) -> Result<(), String> {
    if let Some(socket) = x11_socket_path(display) {
        if !socket.exists() {
            return Err(format!(
                "DISPLAY is set ({display}) but no X11 socket found at {socket:?}. \
                 Start an X server or run under Xvfb."
            ));
        }
    }
    if !has_client_lib(&["libX11.so.6", "libX11.so"]) {
        return Err(
            "X11 libraries are missing (libX11). Install them or set \
             COMPONENTCRAFT_BACKEND=wayland."
                .to_string(),
        );
    }
    Ok(())
}

fn x11_socket_path(display: &str) -> Option<std::path::PathBuf> {
    if !display.starts_with(':') {
        return None;
    }
    let display_num = display
        .trim_start_matches(':')
        .split('.')
        .next()
        .and_then(|num| num.parse::<i32>().ok())?;
    Some(std::path::Path::new("/tmp/.X11-unix").join(format!("X{display_num}")))
}

fn has_client_lib(names: &[&str]) -> bool {
    #[cfg(target_os = "linux")]
    {
        names
            .iter()
            .any(|lib| unsafe { libloading::Library::new(lib) }.is_ok())
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = names;
        true
    }
}

/// The in-progress interaction-area annotation: which connection it is for
/// and the selection state machine.
#[derive(Debug)]
struct AreaSession {
    connection_id: String,
    selector: AreaSelector,
}

#[derive(Debug)]
struct FlowStudio {
    document: ProjectDocument,
    file_path: String,
    status: String,
    selected_flow: usize,
    editor: FlowEditorState,
    drag_offset: Option<Vector>,
    area_session: Option<AreaSession>,
    simulator: Option<FlowSimulator>,
}

#[derive(Debug, Clone)]
enum Message {
    FilePathChanged(String),
    LoadFile,
    SaveFile,
    NewDocument,
    SelectFlow(String),
    AddFlow,
    SetViewMode(ViewMode),
    Editor(EditorEvent),
    CanvasPressed(Point),
    CanvasMoved(Point),
    CanvasReleased(Point),
    DeleteSelectedEdges,
    SelectScreen(String),
    AddSelectedScreen,
    EdgeLabelChanged(String, String),
    OpenAreaSelector(String),
    AreaPointerDown(f32, f32),
    AreaPointerMoved(f32, f32),
    AreaPointerReleased,
    AreaCancel,
    OpenSimulator,
    SimNavigate(String),
    SimRestart,
    CloseSimulator,
}

impl Application for FlowStudio {
    type Executor = executor::Default;
    type Theme = Theme;
    type Flags = ();
    type Message = Message;

    fn new(_flags: ()) -> (Self, Command<Message>) {
        (
            FlowStudio {
                document: default_document(),
                file_path: "demos/projects/sample_project.yaml".to_string(),
                status: "Ready".to_string(),
                selected_flow: 0,
                editor: FlowEditorState::new(),
                drag_offset: None,
                area_session: None,
                simulator: None,
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        "componentcraft flow editor".to_string()
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Delete)
            | keyboard::Key::Named(keyboard::key::Named::Backspace) => {
                Some(Message::DeleteSelectedEdges)
            }
            _ => None,
        })
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::FilePathChanged(path) => self.file_path = path,
            Message::LoadFile => self.load_file(),
            Message::SaveFile => self.save_file(),
            Message::NewDocument => {
                self.document = default_document();
                self.selected_flow = 0;
                self.editor = FlowEditorState::new();
                self.status = "New project created".to_string();
            }
            Message::SelectFlow(flow_id) => {
                if let Some(idx) = self
                    .document
                    .project
                    .flows
                    .iter()
                    .position(|flow| flow.id == flow_id)
                {
                    self.selected_flow = idx;
                    self.editor = FlowEditorState::new();
                }
            }
            Message::AddFlow => self.add_flow(),
            Message::SetViewMode(view) => self.editor.set_view(view),
            Message::Editor(event) => self.apply_editor(event),
            Message::CanvasPressed(position) => self.canvas_pressed(position),
            Message::CanvasMoved(position) => {
                if let Some(offset) = self.drag_offset {
                    let target = position - offset;
                    self.apply_editor(EditorEvent::DragNodeTo(NodePosition::new(
                        target.x.max(0.0),
                        target.y.max(0.0),
                    )));
                }
            }
            Message::CanvasReleased(position) => self.canvas_released(position),
            Message::DeleteSelectedEdges => {
                self.apply_editor(EditorEvent::DeleteSelectedConnections)
            }
            Message::SelectScreen(screen_id) => {
                self.apply_editor(EditorEvent::SelectScreen(Some(screen_id)))
            }
            Message::AddSelectedScreen => {
                if let Some(screen_id) = self.editor.selected_screen().map(str::to_string) {
                    let position = free_position(self.flow());
                    self.apply_editor(EditorEvent::AddScreen {
                        screen_id,
                        position: Some(position),
                        connect_from: None,
                    });
                }
            }
            Message::EdgeLabelChanged(connection_id, label) => {
                self.apply_editor(EditorEvent::RelabelConnection {
                    connection_id,
                    label,
                })
            }
            Message::OpenAreaSelector(connection_id) => {
                self.area_session = Some(AreaSession {
                    connection_id,
                    selector: AreaSelector::new(),
                });
            }
            Message::AreaPointerDown(x, y) => {
                if let Some(session) = &mut self.area_session {
                    session.selector.pointer_down(x, y);
                }
            }
            Message::AreaPointerMoved(x, y) => {
                if let Some(session) = &mut self.area_session {
                    session.selector.pointer_move(x, y);
                }
            }
            Message::AreaPointerReleased => {
                if let Some(mut session) = self.area_session.take() {
                    if let Some(area) = session.selector.pointer_up() {
                        self.apply_editor(EditorEvent::SetInteractionArea {
                            connection_id: session.connection_id,
                            area,
                        });
                        self.status = "Interaction area saved".to_string();
                    }
                }
            }
            Message::AreaCancel => {
                // Closing without committing leaves the flow unchanged.
                self.area_session = None;
            }
            Message::OpenSimulator => {
                self.simulator = Some(FlowSimulator::new(self.flow()));
            }
            Message::SimNavigate(connection_id) => {
                if let Some(simulator) = &mut self.simulator {
                    simulator.navigate(&connection_id);
                }
            }
            Message::SimRestart => {
                if let Some(simulator) = &mut self.simulator {
                    simulator.reset();
                }
            }
            Message::CloseSimulator => self.simulator = None,
        }
        Command::none()
    }

    fn view(&self) -> Element<'_, Message> {
        if let Some(session) = &self.area_session {
            return self.area_selector_view(session);
        }
        if let Some(simulator) = &self.simulator {
            return self.simulator_view(simulator);
        }

        let flow = self.flow();
        let flow_ids = self
            .document
            .project
            .flows
            .iter()
            .map(|f| f.id.clone())
            .collect::<Vec<_>>();

        let file_controls = column![
            text("Project").size(20),
            text_input("path", &self.file_path).on_input(Message::FilePathChanged),
            row![
                button("Load").on_press(Message::LoadFile),
                button("Save").on_press(Message::SaveFile)
            ]
            .spacing(8),
            button("New project").on_press(Message::NewDocument)
        ]
        .spacing(8);

        let flow_picker = column![
            row![
                text("Flow:"),
                pick_list(flow_ids, Some(flow.id.clone()), Message::SelectFlow)
            ]
            .spacing(8),
            row![
                button("New flow").on_press(Message::AddFlow),
                button("Delete flow").on_press(Message::Editor(EditorEvent::RequestDelete))
            ]
            .spacing(8),
        ]
        .spacing(8);

        let left_panel = scrollable(
            column![file_controls, flow_picker, self.screens_panel()].spacing(16),
        )
        .width(Length::Fixed(260.0));

        let workspace: Element<Message> = match self.editor.view() {
            ViewMode::Canvas => Canvas::new(GraphView {
                flow,
                screens: &self.document.project.screens,
                editor: &self.editor,
            })
            .width(Length::FillPortion(3))
            .height(Length::Fill)
            .into(),
            ViewMode::Tree => scrollable(self.tree_view())
                .width(Length::FillPortion(3))
                .height(Length::Fill)
                .into(),
        };

        let right_panel = scrollable(self.inspector_view()).width(Length::Fixed(340.0));

        let toolbar = row![
            button("Canvas view").on_press(Message::SetViewMode(ViewMode::Canvas)),
            button("Tree view").on_press(Message::SetViewMode(ViewMode::Tree)),
            button("Preview flow").on_press(Message::OpenSimulator),
        ]
        .spacing(8);

        let content = row![left_panel, workspace, right_panel].spacing(8);

        container(column![toolbar, content, text(&self.status)].spacing(8))
            .padding(8)
            .into()
    }
}

impl FlowStudio {
    fn flow(&self) -> &ScreenFlow {
        &self.document.project.flows[self.selected_flow]
    }

    fn load_file(&mut self) {
        match fs::read_to_string(&self.file_path) {
            Ok(content) => match ProjectDocument::from_yaml_str(&content) {
                Ok(doc) => {
                    self.document = ensure_one_flow(doc);
                    self.selected_flow = 0;
                    self.editor = FlowEditorState::new();
                    self.status = "Loaded project".to_string();
                }
                Err(err) => self.status = format!("Parse error: {err}"),
            },
            Err(err) => self.status = format!("Read error: {err}"),
        }
    }

    fn save_file(&mut self) {
        match self.document.to_yaml_string() {
            Ok(yaml) => match fs::write(&self.file_path, yaml) {
                Ok(_) => self.status = "Saved project".to_string(),
                Err(err) => self.status = format!("Write error: {err}"),
            },
            Err(err) => self.status = format!("Serialize error: {err}"),
        }
    }

    fn add_flow(&mut self) {
        let n = self.document.project.flows.len();
        let flow = ScreenFlow::new(format!("flow_{n}"), "New Flow");
        self.document.project.flows.push(flow);
        self.selected_flow = self.document.project.flows.len() - 1;
        self.editor = FlowEditorState::new();
    }

    // The studio plays the wizard's role: it owns the flow list and folds
    // each reported update back into it.
    fn apply_editor(&mut self, event: EditorEvent) {
        let flow = self.document.project.flows[self.selected_flow].clone();
        match self.editor.apply(&flow, event) {
            Some(EditorOutcome::Updated(updated)) => {
                self.document.project.flows[self.selected_flow] = updated;
            }
            Some(EditorOutcome::DeleteRequested) => {
                self.document.project.flows.remove(self.selected_flow);
                if self.document.project.flows.is_empty() {
                    self.document
                        .project
                        .flows
                        .push(ScreenFlow::new("main", "Main Flow"));
                }
                self.selected_flow = 0;
                self.editor = FlowEditorState::new();
                self.status = "Flow deleted".to_string();
            }
            None => {}
        }
    }

    fn canvas_pressed(&mut self, position: Point) {
        let flow = self.flow();
        if let Some((node_id, hit)) = hit_test_nodes(flow, &self.editor, position) {
            match hit {
                NodeHit::Delete => self.apply_editor(EditorEvent::RemoveNode(node_id)),
                NodeHit::SetStart => self.apply_editor(EditorEvent::SetStartScreen(node_id)),
                NodeHit::QuickAdd => {
                    if self.editor.quick_add_enabled() {
                        self.apply_editor(EditorEvent::QuickAdd { from: node_id });
                    } else {
                        self.status =
                            "Pick a screen in the panel to quick-add it here".to_string();
                    }
                }
                NodeHit::OutputAnchor => {
                    self.apply_editor(EditorEvent::BeginConnection(node_id))
                }
                NodeHit::Body(offset) => {
                    self.drag_offset = Some(offset);
                    self.apply_editor(EditorEvent::SelectNode(Some(node_id.clone())));
                    self.apply_editor(EditorEvent::BeginNodeDrag(node_id));
                }
            }
        } else if let Some(connection_id) = hit_test_edges(flow, &self.editor, position) {
            self.apply_editor(EditorEvent::ToggleConnectionSelected(connection_id));
        } else {
            self.apply_editor(EditorEvent::ClearConnectionSelection);
            self.apply_editor(EditorEvent::SelectNode(None));
        }
    }

    fn canvas_released(&mut self, position: Point) {
        if self.editor.pending_connection().is_some() {
            let target = hit_test_nodes(self.flow(), &self.editor, position)
                .filter(|(_, hit)| matches!(hit, NodeHit::Body(_) | NodeHit::OutputAnchor))
                .map(|(node_id, _)| node_id);
            let completed = target.is_some();
            self.apply_editor(EditorEvent::CompleteConnection(target));
            if completed {
                self.status = "Connection added".to_string();
            }
        }
        self.drag_offset = None;
        self.apply_editor(EditorEvent::EndNodeDrag);
    }

    fn screens_panel(&self) -> Element<'_, Message> {
        let flow = self.flow();
        let available = available_screens(flow, &self.document.project.screens);

        let mut panel = column![text("Available screens").size(20)].spacing(6);
        if available.is_empty() {
            panel = panel.push(text("All screens are placed in this flow").size(14));
        }
        for screen in available {
            let selected = self.editor.selected_screen() == Some(screen.id.as_str());
            let label = if selected {
                format!("> {}", screen.name)
            } else {
                screen.name.clone()
            };
            panel = panel.push(
                button(text(label).size(14))
                    .width(Length::Fill)
                    .on_press(Message::SelectScreen(screen.id.clone())),
            );
        }
        let mut add = button("Add to flow");
        if self.editor.selected_screen().is_some() {
            add = add.on_press(Message::AddSelectedScreen);
        }
        panel.push(add).into()
    }

    fn tree_view(&self) -> Element<'_, Message> {
        let flow = self.flow();
        let screens = &self.document.project.screens;
        let mut tree = Column::new().spacing(8);

        if flow.screens.is_empty() {
            tree = tree.push(text("No screens in this flow"));
        }
        for node in &flow.screens {
            let chrome = node_chrome(flow, screens, node);
            let title = if chrome.is_start {
                format!("[start] {}", chrome.title)
            } else {
                chrome.title.clone()
            };
            let mut header = Row::new().spacing(8).push(text(title).size(16));
            if !chrome.is_start {
                header = header.push(
                    button(text("set start").size(12))
                        .on_press(Message::Editor(EditorEvent::SetStartScreen(node.id.clone()))),
                );
            }
            header = header.push(
                button(text("delete").size(12))
                    .on_press(Message::Editor(EditorEvent::RemoveNode(node.id.clone()))),
            );
            tree = tree.push(header);

            for connection in flow.outgoing(&node.id) {
                let target_title = flow
                    .node(&connection.to)
                    .map(|target| node_chrome(flow, screens, target).title)
                    .unwrap_or_else(|| "Untitled Screen".to_string());
                let label = connection.label.as_deref().unwrap_or("Navigate");
                tree = tree.push(
                    row![text(format!("    {label} -> {target_title}")).size(14)].spacing(8),
                );
            }
        }
        tree.into()
    }

    fn inspector_view(&self) -> Element<'_, Message> {
        let flow = self.flow();
        let screens = &self.document.project.screens;

        let mut view = column![
            text("Flow").size(20),
            text_input("name", &flow.name)
                .on_input(|name| Message::Editor(EditorEvent::RenameFlow(name))),
            text_input("description", flow.description.as_deref().unwrap_or(""))
                .on_input(|desc| Message::Editor(EditorEvent::SetDescription(desc))),
        ]
        .spacing(8);

        let node_ids = flow
            .screens
            .iter()
            .map(|n| n.id.clone())
            .collect::<Vec<_>>();
        if !node_ids.is_empty() {
            view = view.push(
                row![
                    text("Start:"),
                    pick_list(node_ids, flow.start_screen_id.clone(), |node_id| {
                        Message::Editor(EditorEvent::SetStartScreen(node_id))
                    })
                ]
                .spacing(8),
            );
        }

        view = view.push(text("Connections").size(16));
        if flow.connections.is_empty() {
            view = view.push(text("No connections yet").size(14));
        }
        for connection in &flow.connections {
            let from_title = flow
                .node(&connection.from)
                .map(|n| node_chrome(flow, screens, n).title)
                .unwrap_or_default();
            let to_title = flow
                .node(&connection.to)
                .map(|n| node_chrome(flow, screens, n).title)
                .unwrap_or_default();
            let connection_id = connection.id.clone();
            let annotated = if connection.interaction_area.is_some() {
                "Area ✓"
            } else {
                "Area"
            };
            view = view.push(
                column![
                    text(format!("{from_title} -> {to_title}")).size(14),
                    row![
                        text_input("label", connection.label.as_deref().unwrap_or(""))
                            .on_input(move |label| Message::EdgeLabelChanged(
                                connection_id.clone(),
                                label
                            )),
                        button(text(annotated).size(12))
                            .on_press(Message::OpenAreaSelector(connection.id.clone())),
                        button(text("x").size(12)).on_press(Message::Editor(
                            EditorEvent::ToggleConnectionSelected(connection.id.clone())
                        )),
                    ]
                    .spacing(4)
                ]
                .spacing(4),
            );
        }
        if !self.editor.selected_connections().is_empty() {
            view = view.push(
                button("Delete selected connections").on_press(Message::DeleteSelectedEdges),
            );
        }

        view.into()
    }

    fn area_selector_view(&self, session: &AreaSession) -> Element<'_, Message> {
        let flow = self.flow();
        let source = flow
            .connection(&session.connection_id)
            .and_then(|c| flow.node(&c.from))
            .map(|n| node_chrome(flow, &self.document.project.screens, n).title)
            .unwrap_or_else(|| "Untitled Screen".to_string());

        let overlay: Element<Message> = Canvas::new(AreaView {
            selector: &session.selector,
        })
        .width(Length::Fill)
        .height(Length::Fill)
        .into();

        container(
            column![
                row![
                    text(format!("Click and drag to mark the hotspot on {source}")).size(16),
                    button("Cancel").on_press(Message::AreaCancel),
                ]
                .spacing(12),
                overlay
            ]
            .spacing(8),
        )
        .padding(8)
        .into()
    }

    fn simulator_view(&self, simulator: &FlowSimulator) -> Element<'_, Message> {
        let flow = self.flow();
        let screens = &self.document.project.screens;
        let header = row![
            text(format!("Preview: {}", flow.name)).size(20),
            button("Restart").on_press(Message::SimRestart),
            button("Close").on_press(Message::CloseSimulator),
        ]
        .spacing(12);

        let body: Element<Message> = match simulator.state() {
            SimulatorState::Empty => text("No screens available in this flow.").size(16).into(),
            SimulatorState::AtScreen { .. } | SimulatorState::EndOfFlow { .. } => {
                let current = simulator
                    .current_screen(screens)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| "Untitled Screen".to_string());
                let mut body = column![text(format!("Current screen: {current}")).size(16)]
                    .spacing(8);

                let options = simulator.options();
                if options.is_empty() {
                    body = body.push(
                        text("This is the end of the flow. No further navigation options available.")
                            .size(14),
                    );
                } else {
                    body = body.push(text("Navigation options:").size(14));
                    for option in options {
                        let target = screens
                            .iter()
                            .find(|s| s.id == option.screen_id)
                            .map(|s| s.name.clone())
                            .unwrap_or_else(|| "Untitled Screen".to_string());
                        let label = option.label.clone().unwrap_or_else(|| "Navigate to".into());
                        body = body.push(
                            button(text(format!("{label} {target}")).size(14))
                                .on_press(Message::SimNavigate(option.connection_id.clone())),
                        );
                    }
                }
                body.into()
            }
        };

        container(column![header, body].spacing(16))
            .padding(16)
            .width(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .into()
    }
}

/// First canvas slot not already covered by a node, walking a coarse grid.
fn free_position(flow: &ScreenFlow) -> NodePosition {
    let mut x = 40.0;
    let mut y = 60.0;
    loop {
        let taken = flow.screens.iter().any(|n| {
            (n.position.x - x).abs() < NODE_WIDTH && (n.position.y - y).abs() < NODE_HEIGHT
        });
        if !taken {
            return NodePosition::new(x, y);
        }
        x += NODE_WIDTH + GRID;
        if x > 900.0 {
            x = 40.0;
            y += NODE_HEIGHT + GRID;
        }
    }
}

fn ensure_one_flow(mut document: ProjectDocument) -> ProjectDocument {
    if document.project.flows.is_empty() {
        document
            .project
            .flows
            .push(ScreenFlow::new("main", "Main Flow"));
    }
    document
}

fn default_document() -> ProjectDocument {
    ProjectDocument {
        version: "0.1".to_string(),
        project: Project {
            name: "Untitled project".to_string(),
            description: None,
            template: None,
            screens: vec![
                sample_screen("screen_0", "Login"),
                sample_screen("screen_1", "Home"),
                sample_screen("screen_2", "Settings"),
                sample_screen("screen_3", "Profile"),
            ],
            flows: vec![ScreenFlow {
                description: Some("Primary user journey".to_string()),
                ..ScreenFlow::new("main", "Main Flow")
            }],
        },
    }
}

fn sample_screen(id: &str, name: &str) -> Screen {
    Screen {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("/uploads/{id}.png"),
    }
}

enum NodeHit {
    Body(Vector),
    OutputAnchor,
    Delete,
    SetStart,
    QuickAdd,
}

fn node_rect(editor: &FlowEditorState, node_id: &str, position: NodePosition) -> Rectangle {
    let live = editor.dragged_position(node_id).unwrap_or(position);
    Rectangle {
        x: live.x,
        y: live.y,
        width: NODE_WIDTH,
        height: NODE_HEIGHT,
    }
}

fn output_anchor(rect: &Rectangle) -> Point {
    Point::new(rect.x + rect.width, rect.y + rect.height / 2.0)
}

fn input_anchor(rect: &Rectangle) -> Point {
    Point::new(rect.x, rect.y + rect.height / 2.0)
}

fn hit_test_nodes(
    flow: &ScreenFlow,
    editor: &FlowEditorState,
    position: Point,
) -> Option<(String, NodeHit)> {
    for node in flow.screens.iter().rev() {
        let rect = node_rect(editor, &node.id, node.position);
        if distance(position, output_anchor(&rect)) <= ANCHOR_RADIUS + 3.0 {
            return Some((node.id.clone(), NodeHit::OutputAnchor));
        }
        if !rect.contains(position) {
            continue;
        }
        // Corner affordances: set-start top-left, delete top-right,
        // quick-add bottom-right.
        let local = Point::new(position.x - rect.x, position.y - rect.y);
        if local.y <= 22.0 && local.x >= rect.width - 22.0 {
            return Some((node.id.clone(), NodeHit::Delete));
        }
        if local.y <= 22.0 && local.x <= 22.0 {
            return Some((node.id.clone(), NodeHit::SetStart));
        }
        if local.y >= rect.height - 22.0 && local.x >= rect.width - 22.0 {
            return Some((node.id.clone(), NodeHit::QuickAdd));
        }
        let offset = Vector::new(local.x, local.y);
        return Some((node.id.clone(), NodeHit::Body(offset)));
    }
    None
}

fn hit_test_edges(
    flow: &ScreenFlow,
    editor: &FlowEditorState,
    position: Point,
) -> Option<String> {
    for connection in &flow.connections {
        let (Some(from), Some(to)) = (flow.node(&connection.from), flow.node(&connection.to))
        else {
            continue;
        };
        let from_rect = node_rect(editor, &from.id, from.position);
        let to_rect = node_rect(editor, &to.id, to.position);
        let a = output_anchor(&from_rect);
        let b = input_anchor(&to_rect);
        if segment_distance(position, a, b) <= EDGE_HIT_DISTANCE {
            return Some(connection.id.clone());
        }
    }
    None
}

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let ab = Vector::new(b.x - a.x, b.y - a.y);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + ab.x * t, a.y + ab.y * t))
}

struct GraphView<'a> {
    flow: &'a ScreenFlow,
    screens: &'a [Screen],
    editor: &'a FlowEditorState,
}

impl<'a> canvas::Program<Message> for GraphView<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        draw_grid(&mut frame, bounds);

        for connection in &self.flow.connections {
            let (Some(from), Some(to)) = (
                self.flow.node(&connection.from),
                self.flow.node(&connection.to),
            ) else {
                continue;
            };
            let from_rect = node_rect(self.editor, &from.id, from.position);
            let to_rect = node_rect(self.editor, &to.id, to.position);
            let a = output_anchor(&from_rect);
            let b = input_anchor(&to_rect);
            let selected = self.editor.is_connection_selected(&connection.id);
            let color = if selected {
                Color::from_rgb(0.95, 0.55, 0.25)
            } else {
                Color::from_rgb(0.85, 0.85, 0.9)
            };
            let width = if selected { 3.0 } else { 2.0 };
            stroke_line(&mut frame, a, b, color, width);
            draw_arrowhead(&mut frame, a, b, color);
            if let Some(label) = &connection.label {
                frame.fill_text(canvas::Text {
                    content: label.clone(),
                    position: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0 - 10.0),
                    color,
                    size: iced::Pixels(13.0),
                    ..Default::default()
                });
            }
        }

        // Live drag-to-connect line follows the cursor.
        if let (Some(from_id), Some(cursor_pos)) =
            (self.editor.pending_connection(), cursor.position_in(bounds))
        {
            if let Some(from) = self.flow.node(from_id) {
                let rect = node_rect(self.editor, &from.id, from.position);
                stroke_line(
                    &mut frame,
                    output_anchor(&rect),
                    cursor_pos,
                    Color::from_rgb(0.4, 0.7, 1.0),
                    2.0,
                );
            }
        }

        for node in &self.flow.screens {
            let chrome = node_chrome(self.flow, self.screens, node);
            let rect = node_rect(self.editor, &node.id, node.position);
            let selected = self.editor.selected_node() == Some(node.id.as_str());

            let fill = if selected {
                Color::from_rgb(0.18, 0.35, 0.62)
            } else {
                Color::from_rgb(0.23, 0.23, 0.26)
            };
            frame.fill_rectangle(rect.position(), rect.size(), fill);
            frame.stroke(
                &canvas::Path::rectangle(rect.position(), rect.size()),
                canvas::Stroke {
                    width: 2.0,
                    style: canvas::Style::Solid(Color::WHITE),
                    ..Default::default()
                },
            );

            // Thumbnail placeholder band under the header row.
            frame.fill_rectangle(
                Point::new(rect.x + 8.0, rect.y + 30.0),
                iced::Size::new(rect.width - 16.0, rect.height - 60.0),
                Color::from_rgb(0.35, 0.35, 0.4),
            );

            let title = if chrome.is_start {
                format!("⚑ {}", chrome.title)
            } else {
                chrome.title.clone()
            };
            frame.fill_text(canvas::Text {
                content: title,
                position: Point::new(rect.x + 26.0, rect.y + 8.0),
                color: Color::WHITE,
                size: iced::Pixels(15.0),
                ..Default::default()
            });

            // Corner affordances mirror the hit zones.
            frame.fill_text(canvas::Text {
                content: "x".to_string(),
                position: Point::new(rect.x + rect.width - 16.0, rect.y + 4.0),
                color: Color::from_rgb(1.0, 0.5, 0.5),
                size: iced::Pixels(15.0),
                ..Default::default()
            });
            if !chrome.is_start {
                frame.fill_text(canvas::Text {
                    content: "⚑".to_string(),
                    position: Point::new(rect.x + 6.0, rect.y + 4.0),
                    color: Color::from_rgba(1.0, 1.0, 1.0, 0.6),
                    size: iced::Pixels(14.0),
                    ..Default::default()
                });
            }
            let quick_add_color = if self.editor.quick_add_enabled() {
                Color::from_rgb(0.5, 1.0, 0.5)
            } else {
                Color::from_rgba(1.0, 1.0, 1.0, 0.25)
            };
            frame.fill_text(canvas::Text {
                content: "+".to_string(),
                position: Point::new(rect.x + rect.width - 16.0, rect.y + rect.height - 22.0),
                color: quick_add_color,
                size: iced::Pixels(17.0),
                ..Default::default()
            });

            // Connection anchors: input left, output right.
            frame.fill(
                &canvas::Path::circle(input_anchor(&rect), ANCHOR_RADIUS - 2.0),
                Color::from_rgb(0.4, 0.7, 1.0),
            );
            frame.fill(
                &canvas::Path::circle(output_anchor(&rect), ANCHOR_RADIUS - 2.0),
                Color::from_rgb(0.4, 0.7, 1.0),
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (iced::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    return (
                        iced::event::Status::Captured,
                        Some(Message::CanvasPressed(position)),
                    );
                }
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    return (
                        iced::event::Status::Captured,
                        Some(Message::CanvasReleased(position)),
                    );
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let Some(position) = cursor.position_in(bounds) {
                    return (
                        iced::event::Status::Captured,
                        Some(Message::CanvasMoved(position)),
                    );
                }
            }
            _ => {}
        }
        (iced::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if let Some(position) = cursor.position_in(bounds) {
            if let Some((_, hit)) = hit_test_nodes(self.flow, self.editor, position) {
                return match hit {
                    NodeHit::Body(_) => mouse::Interaction::Grab,
                    NodeHit::OutputAnchor => mouse::Interaction::Crosshair,
                    _ => mouse::Interaction::Pointer,
                };
            }
        }
        mouse::Interaction::default()
    }
}

fn draw_grid(frame: &mut canvas::Frame, bounds: Rectangle) {
    let grid_color = Color::from_rgba(0.6, 0.6, 0.6, 0.2);
    let mut y = 0.0;
    while y < bounds.height {
        stroke_line(
            frame,
            Point::new(0.0, y),
            Point::new(bounds.width, y),
            grid_color,
            1.0,
        );
        y += GRID;
    }
    let mut x = 0.0;
    while x < bounds.width {
        stroke_line(
            frame,
            Point::new(x, 0.0),
            Point::new(x, bounds.height),
            grid_color,
            1.0,
        );
        x += GRID;
    }
}

fn stroke_line(frame: &mut canvas::Frame, a: Point, b: Point, color: Color, width: f32) {
    frame.stroke(
        &canvas::Path::line(a, b),
        canvas::Stroke {
            style: canvas::Style::Solid(color),
            width,
            ..Default::default()
        },
    );
}

fn draw_arrowhead(frame: &mut canvas::Frame, a: Point, b: Point, color: Color) {
    let dir = Vector::new(b.x - a.x, b.y - a.y);
    let len = (dir.x * dir.x + dir.y * dir.y).sqrt();
    if len < 1.0 {
        return;
    }
    let unit = Vector::new(dir.x / len, dir.y / len);
    let normal = Vector::new(-unit.y, unit.x);
    let size = 9.0;
    let tip = b;
    let left = Point::new(
        tip.x - unit.x * size + normal.x * size * 0.5,
        tip.y - unit.y * size + normal.y * size * 0.5,
    );
    let right = Point::new(
        tip.x - unit.x * size - normal.x * size * 0.5,
        tip.y - unit.y * size - normal.y * size * 0.5,
    );
    stroke_line(frame, tip, left, color, 2.0);
    stroke_line(frame, tip, right, color, 2.0);
}

struct AreaView<'a> {
    selector: &'a AreaSelector,
}

impl<'a> canvas::Program<Message> for AreaView<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Screenshot stand-in; the hosted product renders the image here.
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.16, 0.16, 0.18),
        );

        if let Some(area) = self.selector.live_area() {
            // Selector coordinates are percent-of-image.
            let origin = Point::new(
                area.x / 100.0 * bounds.width,
                area.y / 100.0 * bounds.height,
            );
            let size = iced::Size::new(
                area.width / 100.0 * bounds.width,
                area.height / 100.0 * bounds.height,
            );
            frame.fill_rectangle(origin, size, Color::from_rgba(0.3, 0.5, 1.0, 0.25));
            frame.stroke(
                &canvas::Path::rectangle(origin, size),
                canvas::Stroke {
                    width: 2.0,
                    style: canvas::Style::Solid(Color::from_rgb(0.3, 0.5, 1.0)),
                    ..Default::default()
                },
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (iced::event::Status, Option<Message>) {
        let percent = |position: Point| {
            (
                (position.x / bounds.width * 100.0).clamp(0.0, 100.0),
                (position.y / bounds.height * 100.0).clamp(0.0, 100.0),
            )
        };
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    let (x, y) = percent(position);
                    return (
                        iced::event::Status::Captured,
                        Some(Message::AreaPointerDown(x, y)),
                    );
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let Some(position) = cursor.position_in(bounds) {
                    let (x, y) = percent(position);
                    return (
                        iced::event::Status::Captured,
                        Some(Message::AreaPointerMoved(x, y)),
                    );
                }
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                return (
                    iced::event::Status::Captured,
                    Some(Message::AreaPointerReleased),
                );
            }
            _ => {}
        }
        (iced::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        _bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        mouse::Interaction::Crosshair
    }
}
