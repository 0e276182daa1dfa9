use std::io::{self, BufRead};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use studymind_client::{ClientHandle, ClientSettings};
use studymind_core::{update, AppState, AppViewModel, Msg};
use studymind_logging::{sm_info, sm_warn};

use crate::effects::EffectRunner;
use crate::persistence;
use crate::ui::commands::{parse_command, Command};
use crate::ui::{render, tutorial};

/// How long the shell waits for input before checking for client events.
const INPUT_POLL: Duration = Duration::from_millis(50);

pub fn run(settings: ClientSettings, data_dir: PathBuf) -> anyhow::Result<()> {
    let client = ClientHandle::new(settings).context("failed to start the backend client")?;
    let mut shell = Shell::new(EffectRunner::new(client, data_dir.clone()));

    println!("{}", tutorial::WELCOME);
    match persistence::load_settings(&data_dir) {
        Ok(Some(settings)) => shell.dispatch(Msg::RestoreSettings(settings)),
        Ok(None) => {}
        Err(err) => sm_warn!("Ignoring saved study settings: {}", err),
    }

    shell.run(spawn_stdin_reader());
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (line_tx, line_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    line_rx
}

struct Shell {
    state: AppState,
    shown: AppViewModel,
    runner: EffectRunner,
}

impl Shell {
    fn new(runner: EffectRunner) -> Self {
        let state = AppState::new();
        let shown = state.view();
        Self {
            state,
            shown,
            runner,
        }
    }

    fn run(&mut self, lines: mpsc::Receiver<String>) {
        loop {
            for msg in self.runner.drain_events() {
                self.dispatch(msg);
            }
            match lines.recv_timeout(INPUT_POLL) {
                Ok(line) => {
                    if self.handle_line(&line).is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        sm_info!("Shell closed");
        self.runner.shutdown();
    }

    fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        match parse_command(line) {
            Command::Dispatch(msg) => self.dispatch(msg),
            Command::Files => print_lines(render::file_table(&self.shown)),
            Command::History => print_lines(render::transcript(&self.shown)),
            Command::Help => println!("{}", tutorial::HELP),
            Command::Tutorial => println!("{}", tutorial::TUTORIAL),
            Command::Quit => return ControlFlow::Break(()),
            Command::Empty => {}
            Command::Invalid(hint) => println!("{hint}"),
        }
        ControlFlow::Continue(())
    }

    fn dispatch(&mut self, msg: Msg) {
        let mut baseline = self.shown.clone();
        render::forget_banners(&msg, &mut baseline);

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);

        if state.consume_dirty() {
            let view = state.view();
            print_lines(render::render(&baseline, &view));
            self.shown = view;
        }
        self.state = state;
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
