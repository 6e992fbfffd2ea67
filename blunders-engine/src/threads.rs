//! Single auxiliary I/O thread plus a mutex-guarded command queue.
//!
//! The search runs on the main thread; one auxiliary thread reads lines
//! from standard input and appends them to a shared FIFO, signaling a
//! condition variable. The main thread never blocks on search - it drains
//! whatever is queued between iterative-deepening iterations and at the
//! search's own batch boundary.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// Queue state shared between the input thread and the main thread: the
/// FIFO of lines plus whether the input side has closed (stdin hit EOF).
struct State {
    lines: VecDeque<String>,
    closed: bool,
}

/// Shared FIFO of raw input lines, guarded by a mutex and signaled by a
/// condition variable whenever the input thread appends a line or closes.
#[derive(Clone)]
pub struct CommandQueue {
    inner: Arc<(Mutex<State>, Condvar)>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(State {
                    lines: VecDeque::new(),
                    closed: false,
                }),
                Condvar::new(),
            )),
        }
    }

    fn push(&self, line: String) {
        let (lock, condvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        state.lines.push_back(line);
        condvar.notify_one();
    }

    /// Marks the queue closed: standard input has hit EOF and no further
    /// lines will ever arrive. Wakes anyone blocked in `wait_and_drain` so
    /// they can observe the closure instead of waiting forever.
    fn close(&self) {
        let (lock, condvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        state.closed = true;
        condvar.notify_one();
    }

    /// Non-blocking: returns every line queued so far, oldest first,
    /// leaving the queue empty. The manager calls this both between
    /// iterative-deepening iterations and inside `proceed_with_batch`.
    pub fn drain(&self) -> Vec<String> {
        let (lock, _condvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        state.lines.drain(..).collect()
    }

    /// Blocks until at least one line is queued or the input side has
    /// closed, then drains whatever lines are present. An empty result
    /// means the queue was closed with nothing left to process - the
    /// manager's top-level loop treats that as its cue to exit. Used when
    /// there is nothing to think about and no reason to busy-poll.
    pub fn wait_and_drain(&self) -> Vec<String> {
        let (lock, condvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        while state.lines.is_empty() && !state.closed {
            state = condvar.wait(state).unwrap();
        }
        state.lines.drain(..).collect()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the single auxiliary input thread: reads standard input
/// line-by-line and appends each line to `queue`. Exits silently once
/// standard input is closed (EOF), which the manager's main loop treats
/// the same as an explicit `quit`.
pub fn spawn_input_thread(queue: CommandQueue) -> JoinHandle<()> {
    thread::Builder::new()
        .name("blunders-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => queue.push(line),
                    Err(_) => break,
                }
            }
            queue.close();
        })
        .expect("failed to spawn input thread")
}
