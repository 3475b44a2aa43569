//! Host runtime: terminal setup and the main loop.
//!
//! [`Application`] owns a [`ViewTree`] and a crossterm-backed ratatui
//! terminal. Each cycle it lays out (only when needed), draws (only when
//! something changed) and feeds input events to the router. Other tasks
//! talk to it through a cloneable [`AppHandle`].

use std::cell::Cell;
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, EventStream};
use crossterm::{
    cursor, execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};
use tracing_subscriber::EnvFilter;

use crate::binding::KeyChord;
use crate::command::{Command, Outcome};
use crate::event::TerminalEvent;
use crate::geometry::Size;
use crate::tree::ViewTree;

/// Output target for the terminal UI.
///
/// By default the UI renders to **stdout**. When stdout is piped, switch to
/// [`Stderr`](OutputTarget::Stderr) so the UI still reaches the terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout (default).
    #[default]
    Stdout,
    /// Write to stderr.
    Stderr,
}

enum Output {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

impl Output {
    fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

/// Errors from setting up or running an [`Application`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// Terminal setup, rendering, input or teardown failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A layout pass or tree operation failed.
    #[error("layout error: {0}")]
    Layout(#[from] crate::error::Error),
    /// The log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Configuration for an [`Application`].
///
/// Override only what you need with struct update syntax:
///
/// ```rust,ignore
/// use trellis_core::runtime::{AppOptions, OutputTarget};
///
/// let opts = AppOptions {
///     fps: 30,
///     mouse_capture: true,
///     title: Some("Demo".into()),
///     output: OutputTarget::Stderr,
///     ..AppOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Frame ticks per second (default 60, clamped to 1..=120).
    pub fps: u32,
    /// Use the alternate screen (default true).
    pub alt_screen: bool,
    /// Enable mouse reporting (default false).
    pub mouse_capture: bool,
    /// Terminal title.
    pub title: Option<String>,
    /// Restore the terminal from a panic hook (default true).
    pub catch_panics: bool,
    /// Quit on Ctrl+C delivered as a signal (default true).
    pub handle_signals: bool,
    /// Install a file logger at this path on startup.
    pub log_file: Option<std::path::PathBuf>,
    /// Where the UI is written.
    pub output: OutputTarget,
    /// Application-scope chord bound to [`Command::Quit`] (default Ctrl+Q).
    pub quit_key: Option<KeyChord>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            mouse_capture: false,
            title: None,
            catch_panics: true,
            handle_signals: true,
            log_file: None,
            output: OutputTarget::default(),
            quit_key: Some(KeyChord::ctrl(crossterm::event::KeyCode::Char('q'))),
        }
    }
}

/// A request sent to a running [`Application`] from outside the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRequest {
    /// Repaint on the next frame.
    Redraw,
    /// Run a layout pass on the next frame.
    Relayout,
    /// Leave the main loop.
    Quit,
}

/// A cloneable, `Send` handle to a running [`Application`].
///
/// Timers and background tasks use it to ask for redraws; the UI itself is
/// only ever touched from the loop.
#[derive(Debug, Clone)]
pub struct AppHandle {
    tx: mpsc::UnboundedSender<AppRequest>,
    killed: Arc<AtomicBool>,
}

impl AppHandle {
    /// Enqueue a request. Silently dropped if the application has exited.
    pub fn send(&self, request: AppRequest) {
        let _ = self.tx.send(request);
    }

    /// Shorthand for `send(AppRequest::Redraw)`.
    pub fn request_redraw(&self) {
        self.send(AppRequest::Redraw);
    }

    /// Shorthand for `send(AppRequest::Quit)`.
    pub fn quit(&self) {
        self.send(AppRequest::Quit);
    }

    /// Stop the loop at the next iteration without draining requests.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }
}

fn channel() -> (AppHandle, mpsc::UnboundedReceiver<AppRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = AppHandle {
        tx,
        killed: Arc::new(AtomicBool::new(false)),
    };
    (handle, rx)
}

/// Bind `chord` to [`Command::Quit`] at application scope with a handler that
/// raises `flag`.
fn install_quit(
    tree: &mut ViewTree,
    chord: Option<KeyChord>,
    flag: &Rc<Cell<bool>>,
) -> crate::error::Result<()> {
    if let Some(chord) = chord {
        tree.bind_app(chord, [Command::Quit])?;
    }
    let flag = flag.clone();
    tree.on_app_command(Command::Quit, move |_| {
        flag.set(true);
        Outcome::Handled
    });
    Ok(())
}

/// The application runtime.
///
/// ```rust,ignore
/// use trellis_core::{Application, ProgramError, ViewTree};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), ProgramError> {
///     let tree = build_ui()?;
///     let tree = Application::new(tree)?.run().await?;
///     Ok(())
/// }
/// ```
pub struct Application {
    tree: ViewTree,
    terminal: Terminal<CrosstermBackend<Output>>,
    handle: AppHandle,
    requests: mpsc::UnboundedReceiver<AppRequest>,
    options: AppOptions,
    quit: Rc<Cell<bool>>,
}

impl Application {
    /// Create an application with default options.
    pub fn new(tree: ViewTree) -> Result<Self, ProgramError> {
        Self::with_options(tree, AppOptions::default())
    }

    /// Create an application with custom options.
    pub fn with_options(mut tree: ViewTree, options: AppOptions) -> Result<Self, ProgramError> {
        if let Some(ref path) = options.log_file {
            log_to_file(path)?;
        }
        let quit = Rc::new(Cell::new(false));
        install_quit(&mut tree, options.quit_key, &quit)?;
        let (handle, requests) = channel();
        let terminal = init_terminal(&options)?;
        info!(fps = options.fps, "application initialized");
        Ok(Self {
            tree,
            terminal,
            handle,
            requests,
            options,
            quit,
        })
    }

    /// A handle for other tasks.
    pub fn handle(&self) -> AppHandle {
        self.handle.clone()
    }

    /// The view tree.
    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    /// Mutable access to the view tree before the loop starts.
    pub fn tree_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    /// Run until quit. Returns the tree in its final state.
    pub async fn run(mut self) -> Result<ViewTree, ProgramError> {
        let result = self.event_loop().await;
        debug!("shutting down");
        restore_terminal(&self.options)?;
        result?;
        Ok(self.tree)
    }

    fn should_stop(&self) -> bool {
        self.quit.get() || self.handle.killed.load(Ordering::SeqCst)
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        self.render()?;

        let fps = self.options.fps.clamp(1, 120);
        let mut frame_interval =
            tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let handle_signals = self.options.handle_signals;
        let mut events = EventStream::new();

        loop {
            if self.should_stop() {
                return Ok(());
            }

            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    info!("received ctrl+c signal");
                    return Ok(());
                }

                Some(request) = self.requests.recv() => {
                    self.handle_request(request);
                    while let Ok(request) = self.requests.try_recv() {
                        self.handle_request(request);
                    }
                }

                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(TerminalEvent::from(event)),
                    Some(Err(err)) => return Err(err.into()),
                    None => return Ok(()),
                },

                _ = frame_interval.tick() => {
                    if self.tree.needs_redraw() || self.tree.layout_pending {
                        self.render()?;
                    }
                }
            }
        }
    }

    fn handle_request(&mut self, request: AppRequest) {
        trace!(?request, "request received");
        match request {
            AppRequest::Redraw => self.tree.request_redraw(),
            AppRequest::Relayout => {
                let root = self.tree.root();
                self.tree.request_layout(root);
            }
            AppRequest::Quit => self.quit.set(true),
        }
    }

    fn handle_event(&mut self, event: TerminalEvent) {
        match event {
            TerminalEvent::Key(key) => {
                self.tree.route_key(key);
                self.tree.request_redraw();
            }
            TerminalEvent::Mouse(mouse) => {
                self.tree.route_mouse(mouse);
                self.tree.request_redraw();
            }
            TerminalEvent::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                let root = self.tree.root();
                self.tree.request_layout(root);
                self.tree.request_redraw();
            }
            other => trace!(event = ?other, "event ignored"),
        }
    }

    fn render(&mut self) -> Result<(), ProgramError> {
        let tree = &mut self.tree;
        let mut outcome = Ok(());
        self.terminal.draw(|frame| {
            let area = frame.area();
            let screen = Size::new(i32::from(area.width), i32::from(area.height));
            outcome = tree
                .layout_if_needed(screen)
                .and_then(|_| tree.draw(frame.buffer_mut()));
        })?;
        outcome?;
        Ok(())
    }
}

fn init_terminal(options: &AppOptions) -> Result<Terminal<CrosstermBackend<Output>>, ProgramError> {
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        let output_target = options.output;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal_minimal(alt_screen, output_target);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = Output::new(options.output);
    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    if options.mouse_capture {
        execute!(writer, EnableMouseCapture)?;
    }
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    let terminal = Terminal::new(CrosstermBackend::new(writer))?;
    Ok(terminal)
}

fn restore_terminal(options: &AppOptions) -> Result<(), ProgramError> {
    restore_terminal_minimal(options.alt_screen, options.output)?;
    Ok(())
}

fn restore_terminal_minimal(alt_screen: bool, output_target: OutputTarget) -> io::Result<()> {
    // Best effort: keep restoring even if a step fails.
    let raw = disable_raw_mode();
    let mut writer = Output::new(output_target);
    execute!(writer, DisableMouseCapture).ok();
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    raw
}

/// Send `tracing` output to a file.
///
/// A TUI cannot log to the terminal it draws on, so this installs a global
/// fmt subscriber appending plain (non-ANSI) lines to `path`. The level
/// comes from `RUST_LOG`, defaulting to `debug`.
///
/// ```no_run
/// trellis_core::runtime::log_to_file("trellis.log").unwrap();
/// tracing::info!("written to trellis.log");
/// ```
pub fn log_to_file(path: impl AsRef<std::path::Path>) -> Result<(), ProgramError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| ProgramError::Logging(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn default_options() {
        let opts = AppOptions::default();
        assert_eq!(opts.fps, 60);
        assert!(opts.alt_screen);
        assert!(!opts.mouse_capture);
        assert!(opts.catch_panics);
        assert!(opts.handle_signals);
        assert_eq!(opts.output, OutputTarget::Stdout);
        assert_eq!(opts.quit_key, Some(KeyChord::ctrl(KeyCode::Char('q'))));
    }

    #[test]
    fn struct_update_overrides_single_field() {
        let opts = AppOptions {
            fps: 30,
            quit_key: None,
            ..AppOptions::default()
        };
        assert_eq!(opts.fps, 30);
        assert!(opts.alt_screen);
        assert_eq!(opts.quit_key, None);
    }

    #[test]
    fn handle_delivers_requests_in_order() {
        let (handle, mut rx) = channel();
        let other = handle.clone();
        handle.request_redraw();
        other.send(AppRequest::Relayout);
        other.quit();
        assert_eq!(rx.try_recv(), Ok(AppRequest::Redraw));
        assert_eq!(rx.try_recv(), Ok(AppRequest::Relayout));
        assert_eq!(rx.try_recv(), Ok(AppRequest::Quit));
    }

    #[test]
    fn handle_is_send() {
        fn assert_send<T: Send + Sync>() {}
        assert_send::<AppHandle>();
    }

    #[test]
    fn kill_sets_shared_flag() {
        let (handle, _rx) = channel();
        handle.clone().kill();
        assert!(handle.killed.load(Ordering::SeqCst));
    }

    #[test]
    fn send_after_receiver_dropped_is_silent() {
        let (handle, rx) = channel();
        drop(rx);
        handle.request_redraw();
    }

    #[test]
    fn quit_key_raises_flag() {
        let mut tree = ViewTree::new();
        let flag = Rc::new(Cell::new(false));
        install_quit(&mut tree, Some(KeyChord::ctrl(KeyCode::Char('q'))), &flag).unwrap();
        assert!(!tree.route_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(!flag.get());
        assert!(tree.route_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(flag.get());
    }

    #[test]
    fn quit_command_works_without_key() {
        let mut tree = ViewTree::new();
        let flag = Rc::new(Cell::new(false));
        install_quit(&mut tree, None, &flag).unwrap();
        assert_eq!(tree.invoke_app_command(Command::Quit), Outcome::Handled);
        assert!(flag.get());
    }

    #[test]
    fn errors_display() {
        let err = ProgramError::from(crate::error::Error::InvalidHierarchy("x"));
        assert_eq!(err.to_string(), "layout error: invalid hierarchy: x");
        let err = ProgramError::Logging("already set".into());
        assert!(err.to_string().contains("already set"));
    }
}
