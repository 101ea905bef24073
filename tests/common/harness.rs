//! Session controller wired to headless windows, in-memory buffers and a
//! scripted process spawner

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use termtoggle::app::{OpenOutcome, OpenRequest, SessionController, SessionError};
use termtoggle::config::Config;
use termtoggle::host::{ProcessSpawner, SpawnError, SpawnRequest, WindowStyle, WindowSystem};
use termtoggle::model::{CommandLine, Layout, SessionKey, SplitDirection};
use termtoggle::services::async_bridge::{AsyncBridge, AsyncMessage};
use termtoggle::services::headless::HeadlessWindows;
use termtoggle::services::output::{MemoryBuffers, OutputSink};
use termtoggle::types::{BufferId, Geometry, ProcessId, Viewport, WindowId};

/// Exit code the fake reports for terminated processes (SIGTERM)
pub const TERMINATED_CODE: i32 = 143;

#[derive(Default)]
struct FakeState {
    next_id: u64,
    alive: HashSet<ProcessId>,
    spawned: Vec<(ProcessId, SpawnRequest)>,
    terminated: Vec<ProcessId>,
    resized: Vec<(ProcessId, u16, u16)>,
    forgotten: Vec<ProcessId>,
    sinks: HashMap<ProcessId, OutputSink>,
    fail_next: Option<SpawnError>,
}

/// Spawner whose processes live until the test says they exit
#[derive(Clone)]
pub struct FakeProcesses {
    state: Arc<Mutex<FakeState>>,
    tx: Sender<AsyncMessage>,
}

impl FakeProcesses {
    pub fn new(bridge: &AsyncBridge) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            tx: bridge.sender(),
        }
    }

    /// End a process with `code`, posting the exit like a PTY waiter would
    pub fn exit(&self, process: ProcessId, code: i32) {
        self.state.lock().unwrap().alive.remove(&process);
        self.tx
            .send(AsyncMessage::ProcessExited { process, code })
            .unwrap();
    }

    /// Mark a process dead now but post its exit only after `delay`
    pub fn exit_later(&self, process: ProcessId, code: i32, delay: std::time::Duration) {
        self.state.lock().unwrap().alive.remove(&process);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let _ = tx.send(AsyncMessage::ProcessExited { process, code });
        });
    }

    /// Make the next spawn fail
    pub fn fail_next_spawn(&self, error: SpawnError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Write to the process's output buffer
    pub fn output(&self, process: ProcessId, data: &str) {
        let state = self.state.lock().unwrap();
        state.sinks[&process].write(data.as_bytes());
    }

    pub fn spawn_count(&self) -> usize {
        self.state.lock().unwrap().spawned.len()
    }

    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.state
            .lock()
            .unwrap()
            .spawned
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn terminated(&self) -> Vec<ProcessId> {
        self.state.lock().unwrap().terminated.clone()
    }

    /// Processes whose delivered exit the supervisor acknowledged
    pub fn forgotten(&self) -> Vec<ProcessId> {
        self.state.lock().unwrap().forgotten.clone()
    }

    pub fn alive(&self, process: ProcessId) -> bool {
        self.state.lock().unwrap().alive.contains(&process)
    }

    pub fn last_resize(&self, process: ProcessId) -> Option<(u16, u16)> {
        self.state
            .lock()
            .unwrap()
            .resized
            .iter()
            .rev()
            .find(|(p, _, _)| *p == process)
            .map(|(_, cols, rows)| (*cols, *rows))
    }
}

impl ProcessSpawner for FakeProcesses {
    fn spawn(&mut self, request: &SpawnRequest, sink: OutputSink) -> Result<ProcessId, SpawnError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        state.next_id += 1;
        let process = ProcessId(state.next_id);
        state.alive.insert(process);
        state.spawned.push((process, request.clone()));
        state.sinks.insert(process, sink);
        Ok(process)
    }

    fn is_alive(&self, process: ProcessId) -> bool {
        self.alive(process)
    }

    fn terminate(&mut self, process: ProcessId) {
        let was_alive = {
            let mut state = self.state.lock().unwrap();
            state.terminated.push(process);
            state.alive.contains(&process)
        };
        if was_alive {
            self.exit(process, TERMINATED_CODE);
        }
    }

    fn resize(&mut self, process: ProcessId, cols: u16, rows: u16) {
        self.state.lock().unwrap().resized.push((process, cols, rows));
    }

    fn forget(&mut self, process: ProcessId) {
        let mut state = self.state.lock().unwrap();
        state.sinks.remove(&process);
        state.forgotten.push(process);
    }
}

/// Headless windows shared between the controller and the test
#[derive(Clone)]
pub struct SharedWindows(pub Rc<RefCell<HeadlessWindows>>);

impl WindowSystem for SharedWindows {
    fn viewport(&self) -> Viewport {
        self.0.borrow().viewport()
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.0.borrow_mut().set_viewport(viewport)
    }

    fn create_floating_window(
        &mut self,
        buffer: BufferId,
        geometry: Geometry,
        style: &WindowStyle,
    ) -> WindowId {
        self.0.borrow_mut().create_floating_window(buffer, geometry, style)
    }

    fn create_split_window(
        &mut self,
        buffer: BufferId,
        direction: SplitDirection,
        size: Option<u16>,
    ) -> WindowId {
        self.0.borrow_mut().create_split_window(buffer, direction, size)
    }

    fn hide_window(&mut self, window: WindowId) {
        self.0.borrow_mut().hide_window(window)
    }

    fn close_window(&mut self, window: WindowId) {
        self.0.borrow_mut().close_window(window)
    }

    fn is_window_valid(&self, window: WindowId) -> bool {
        self.0.borrow().is_window_valid(window)
    }

    fn window_geometry(&self, window: WindowId) -> Option<Geometry> {
        self.0.borrow().window_geometry(window)
    }

    fn set_window_geometry(&mut self, window: WindowId, geometry: Geometry) -> bool {
        self.0.borrow_mut().set_window_geometry(window, geometry)
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.0.borrow().focused_window()
    }

    fn focus_window(&mut self, window: WindowId) {
        self.0.borrow_mut().focus_window(window)
    }
}

pub struct SessionHarness {
    pub controller: SessionController,
    pub processes: FakeProcesses,
    pub windows: SharedWindows,
}

impl SessionHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// 100x42 screen; chrome rows come from `config`
    pub fn with_config(config: Config) -> Self {
        let viewport = Viewport::new(100, 42).with_chrome(config.chrome.top, config.chrome.bottom);
        let bridge = AsyncBridge::new();
        let processes = FakeProcesses::new(&bridge);
        let windows = SharedWindows(Rc::new(RefCell::new(HeadlessWindows::new(viewport))));
        let buffers = MemoryBuffers::new(config.scrollback_lines);
        let controller = SessionController::new(
            config,
            Box::new(windows.clone()),
            Box::new(buffers),
            Box::new(processes.clone()),
            bridge,
        );
        Self {
            controller,
            processes,
            windows,
        }
    }

    /// Open `command` floating under `key`
    pub fn open(&mut self, key: &str, command: &str) -> Result<OpenOutcome, SessionError> {
        self.open_with(key, command, Layout::Floating, OpenRequest::default())
    }

    pub fn open_with(
        &mut self,
        key: &str,
        command: &str,
        layout: Layout,
        request: OpenRequest,
    ) -> Result<OpenOutcome, SessionError> {
        self.controller.open(
            SessionKey::new(key),
            OpenRequest {
                command: Some(CommandLine::Shell(command.to_string())),
                layout: Some(layout),
                ..request
            },
        )
    }

    /// Windows on screen showing `key`'s buffer
    pub fn window_count_for(&self, key: &str) -> usize {
        let Some(buffer) = self
            .controller
            .session(&SessionKey::new(key))
            .and_then(|s| s.buffer)
        else {
            return 0;
        };
        self.windows.0.borrow().windows_for_buffer(buffer).len()
    }

    pub fn window_count(&self) -> usize {
        self.windows.0.borrow().window_count()
    }

    pub fn buffer_count(&self) -> usize {
        self.controller.buffers().buffer_count()
    }

    pub fn buffer_of(&self, key: &str) -> Option<BufferId> {
        self.controller.session(&SessionKey::new(key))?.buffer
    }

    pub fn window_of(&self, key: &str) -> Option<WindowId> {
        self.controller.session(&SessionKey::new(key))?.window
    }

    pub fn process_of(&self, key: &str) -> Option<ProcessId> {
        self.controller
            .session(&SessionKey::new(key))?
            .running_process()
    }

    pub fn geometry_of(&self, key: &str) -> Option<Geometry> {
        let window = self.window_of(key)?;
        self.windows.0.borrow().window_geometry(window)
    }

    /// Close a window behind the controller's back, like a user `:q` would
    pub fn close_window_externally(&mut self, key: &str) {
        if let Some(window) = self.window_of(key) {
            self.windows.0.borrow_mut().close_window(window);
        }
    }
}
