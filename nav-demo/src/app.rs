//! Event loop: keys become route requests, toolkit changes become redraws.

use crate::view;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nav_nexus::{
    AuthenticationState, MemoryToolkit, RouteRequest, RouteSegment, RouteTree, RouterHandle,
    RoutingState, Screen,
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

const OAUTH_URL: &str = "https://github.com/login/oauth/authorize?client_id=nav-demo&scope=repo";

/// What the demo shows besides the window itself.
pub struct Status {
    /// The tree most recently requested, i.e. what the app's store believes.
    pub requested: RouteTree,
    pub log: Vec<String>,
}

impl Status {
    fn push(&mut self, line: String) {
        self.log.push(line);
        if self.log.len() > 8 {
            self.log.remove(0);
        }
    }
}

pub struct App {
    toolkit: Arc<MemoryToolkit>,
    handle: RouterHandle,
    status: Status,
    results_tx: mpsc::UnboundedSender<String>,
    results_rx: mpsc::UnboundedReceiver<String>,
}

impl App {
    pub fn new(toolkit: Arc<MemoryToolkit>, handle: RouterHandle, initial: RouteTree) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            toolkit,
            handle,
            status: Status {
                requested: RouteTree::new(),
                log: Vec::new(),
            },
            results_tx,
            results_rx,
        };
        app.request(initial);
        app
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        self.handle.shutdown();

        result
    }

    async fn run_app_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let mut changes = self.toolkit.subscribe();
        self.draw(terminal)?;

        loop {
            tokio::select! {
                _ = changes.changed() => {
                    self.draw(terminal)?;
                }
                Some(line) = self.results_rx.recv() => {
                    self.status.push(line);
                    self.draw(terminal)?;
                }
                event_ready = async { event::poll(Duration::from_millis(100)) } => {
                    if let Ok(true) = event_ready {
                        if let CrosstermEvent::Key(key) = event::read()? {
                            if key.kind == KeyEventKind::Press && !self.handle_key(key.code)? {
                                return Ok(());
                            }
                            self.draw(terminal)?;
                        }
                    }
                }
            }
        }
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let snapshot = self.toolkit.snapshot()?;
        terminal.draw(|frame| view::render(frame, &snapshot, &self.status))?;
        Ok(())
    }

    /// Returns `false` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> anyhow::Result<bool> {
        let main = || RouteTree::from([RouteSegment::MAIN]);
        match code {
            KeyCode::Char('q') => return Ok(false),
            KeyCode::Char('l') => self.request(RouteTree::from([RouteSegment::LOGIN])),
            KeyCode::Char('o') => self.request(RouteTree::from([RouteSegment::LOGIN, RouteSegment::OAUTH])),
            KeyCode::Char('m') => {
                // Main never pops programmatically; clear its stack like a
                // long-press on the back button would.
                self.native_back(usize::MAX)?;
                self.request(main());
            }
            KeyCode::Char('b') => self.request(main().child(RouteSegment::BOOKMARK)),
            KeyCode::Char('d') => self.request(main().child(RouteSegment::REPOSITORY_DETAIL)),
            KeyCode::Char('s') => self.request(RouteTree::from([RouteSegment::new("Signup")])),
            KeyCode::Esc | KeyCode::Backspace => self.back()?,
            _ => {}
        }
        Ok(true)
    }

    /// Go back one level. Inside the main stack this behaves like the
    /// toolkit's own back gesture: the screen disappears first and the route
    /// catches up afterwards.
    fn back(&mut self) -> anyhow::Result<()> {
        if self.status.requested.len() < 2 {
            return Ok(());
        }
        self.native_back(1)?;
        let parent = self.status.requested.parent();
        self.request(parent);
        Ok(())
    }

    /// Remove up to `levels` screens from the main stack without the router.
    fn native_back(&self, levels: usize) -> anyhow::Result<()> {
        let snapshot = self.toolkit.snapshot()?;
        if snapshot.root != Some(Screen::Main) {
            return Ok(());
        }
        let Some(container) = self.toolkit.window_root()? else {
            return Ok(());
        };
        for _ in 0..levels.min(snapshot.stack.len()) {
            if self.toolkit.native_back(container)?.is_none() {
                break;
            }
        }
        Ok(())
    }

    fn request(&mut self, tree: RouteTree) {
        let state = self.routing_state(&tree);
        self.status.requested = tree.clone();

        match self.handle.navigate(RouteRequest::new(tree.clone()).with_state(state)) {
            Ok(pending) => {
                let tx = self.results_tx.clone();
                tokio::spawn(async move {
                    let line = match pending.wait().await {
                        Ok(report) if report.actions.is_empty() => format!("{tree}: nothing to do"),
                        Ok(report) => {
                            let steps: Vec<String> = report.actions.iter().map(ToString::to_string).collect();
                            format!("{tree}: {}", steps.join(", "))
                        }
                        Err(err) => format!("{tree}: {err}"),
                    };
                    let _ = tx.send(line);
                });
            }
            Err(err) => self.status.push(format!("{tree}: {err}")),
        }
    }

    fn routing_state(&self, tree: &RouteTree) -> RoutingState {
        if tree.leaf() == Some(&RouteSegment::OAUTH) {
            if let Ok(url) = Url::parse(OAUTH_URL) {
                return RoutingState::with_authentication(AuthenticationState::pending(url));
            }
        }
        RoutingState::default()
    }
}
